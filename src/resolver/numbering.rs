//! Numbered labels and selection syntax
//!
//! Users may pick list entries by number ("2", "1,3") or by spoken position
//! ("option two", "second option", "second", "option 2"; "left option one"
//! in two-list displays).

use regex::Regex;
use std::sync::LazyLock;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());

static TWO_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[,;]\s*(\d+)\s*$").unwrap());

const CARDINALS: [&str; 20] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen",
    "twenty",
];

const ORDINALS: [&str; 20] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
    "eleventh", "twelfth", "thirteenth", "fourteenth", "fifteenth", "sixteenth", "seventeenth",
    "eighteenth", "nineteenth", "twentieth",
];

const OPTION: &str = "option";

/// Side of a two-list display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListSide {
    Left,
    Right,
}

impl ListSide {
    fn keyword(&self) -> &'static str {
        match self {
            ListSide::Left => "left",
            ListSide::Right => "right",
        }
    }
}

/// Parse a single number selection
pub fn parse_number(input: &str) -> Option<usize> {
    NUMBER_RE
        .captures(input)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse an `a,b` selection (left index, right index)
pub fn parse_two_numbers(input: &str) -> Option<(usize, usize)> {
    let caps = TWO_NUMBER_RE.captures(input)?;
    let left = caps.get(1)?.as_str().parse().ok()?;
    let right = caps.get(2)?.as_str().parse().ok()?;
    Some((left, right))
}

pub fn is_selection(input: &str) -> bool {
    parse_number(input).is_some() || parse_two_numbers(input).is_some()
}

pub fn cardinal(n: usize) -> Option<&'static str> {
    n.checked_sub(1).and_then(|i| CARDINALS.get(i)).copied()
}

pub fn ordinal(n: usize) -> Option<&'static str> {
    n.checked_sub(1).and_then(|i| ORDINALS.get(i)).copied()
}

/// Spoken labels for the entry at 1-based position `n`
pub fn numbered_labels(n: usize, side: Option<ListSide>) -> Vec<String> {
    let option = match side {
        Some(side) => format!("{} {OPTION}", side.keyword()),
        None => OPTION.to_string(),
    };

    let mut labels = Vec::with_capacity(4);
    if let Some(word) = cardinal(n) {
        labels.push(format!("{option} {word}"));
    }
    if let Some(word) = ordinal(n) {
        labels.push(format!("{word} {option}"));
        match side {
            Some(side) => labels.push(format!("{word} {}", side.keyword())),
            None => labels.push(word.to_string()),
        }
    }
    labels.push(format!("{option} {n}"));
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selections() {
        assert_eq!(parse_number(" 3 "), Some(3));
        assert_eq!(parse_number("3a"), None);
        assert_eq!(parse_two_numbers("1, 2"), Some((1, 2)));
        assert_eq!(parse_two_numbers("1"), None);
        assert!(is_selection("0"));
        assert!(!is_selection("add measure"));
    }

    #[test]
    fn test_numbered_labels() {
        assert_eq!(
            numbered_labels(1, None),
            vec!["option one", "first option", "first", "option 1"]
        );
        assert_eq!(
            numbered_labels(2, Some(ListSide::Right)),
            vec!["right option two", "second right option", "second right", "right option 2"]
        );
        assert_eq!(numbered_labels(25, None), vec!["option 25"]);
    }

    #[test]
    fn test_spellout_bounds() {
        assert_eq!(cardinal(0), None);
        assert_eq!(cardinal(20), Some("twenty"));
        assert_eq!(ordinal(21), None);
    }
}
