//! Display payloads handed to the transport layer

use crate::resolver::{Operation, ValueChoice, ValueLists};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One numbered line of a list display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub position: usize,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "display", rename_all = "snake_case")]
pub enum Display {
    List {
        title: String,
        items: Vec<DisplayItem>,
    },
    TwoList {
        title: String,
        left: Vec<DisplayItem>,
        right: Vec<DisplayItem>,
    },
    Message {
        text: String,
    },
    Error {
        message: String,
    },
}

fn numbered(values: &[ValueChoice]) -> Vec<DisplayItem> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| DisplayItem {
            position: i + 1,
            label: v.label.clone(),
            uri: Some(v.uri.clone()),
        })
        .collect()
}

impl Display {
    pub fn message(text: impl Into<String>) -> Self {
        Display::Message { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Display::Error {
            message: message.into(),
        }
    }

    pub fn operations(title: impl Into<String>, operations: &[Operation]) -> Self {
        Display::List {
            title: title.into(),
            items: operations
                .iter()
                .map(|op| DisplayItem {
                    position: op.position,
                    label: op.display_name.clone(),
                    uri: None,
                })
                .collect(),
        }
    }

    pub fn values(title: impl Into<String>, lists: &ValueLists) -> Self {
        match lists {
            ValueLists::Single { values } => Display::List {
                title: title.into(),
                items: numbered(values),
            },
            ValueLists::Two { left, right } => Display::TwoList {
                title: title.into(),
                left: numbered(left),
                right: numbered(right),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Display::Error { .. })
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Display::List { title, items } => {
                writeln!(f, "{title}")?;
                for item in items {
                    writeln!(f, "  {}. {}", item.position, item.label)?;
                }
                Ok(())
            }
            Display::TwoList { title, left, right } => {
                writeln!(f, "{title}")?;
                let rows = left.len().max(right.len());
                for i in 0..rows {
                    let cell = |items: &[DisplayItem]| {
                        items
                            .get(i)
                            .map(|item| format!("{}. {}", item.position, item.label))
                            .unwrap_or_default()
                    };
                    writeln!(f, "  {:<36}{}", cell(left), cell(right))?;
                }
                Ok(())
            }
            Display::Message { text } => writeln!(f, "{text}"),
            Display::Error { message } => writeln!(f, "! {message}"),
        }
    }
}
