//! Argument extraction from free text.

use std::sync::LazyLock;

use regex::Regex;
use toolchat_core::tools::{CalculatorArgs, Operation, TextOperation};

use crate::rules::TEXT_TRANSFORM_KEYWORDS;

static CALCULATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*([+\-*/xX×÷])\s*(-?\d+(?:\.\d+)?)").unwrap()
});

static WEATHER_CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bweather\b(?:\s+like)?(?:\s+(?:in|for|at))?\s+(\p{L}[\p{L}\s.'-]*)").unwrap()
});

/// Words that end a city name ("weather in Oslo today"). The prepositions
/// cover a bare "weather in", where the regex backtracks onto them.
const CITY_STOPWORDS: &[&str] = &[
    "today", "tomorrow", "now", "please", "right", "this", "like", "in", "for", "at",
];

/// First `<number> <operator> <number>` in `text`.
pub fn calculation(text: &str) -> Option<CalculatorArgs> {
    let caps = CALCULATION.captures(text)?;
    let a: f64 = caps.get(1)?.as_str().parse().ok()?;
    let operation = Operation::from_symbol(caps.get(2)?.as_str().chars().next()?)?;
    let b: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(CalculatorArgs { operation, a, b })
}

/// City named after "weather (like)? (in|for|at)?", if any.
pub fn city(text: &str) -> Option<String> {
    let raw = WEATHER_CITY.captures(text)?.get(1)?.as_str();

    let words: Vec<&str> = raw
        .split_whitespace()
        .take_while(|w| !CITY_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    let city = words.join(" ");
    let city = city.trim_end_matches(['.', '\'', '-']).trim();

    (!city.is_empty()).then(|| city.to_string())
}

/// Operation keyword and the operand left after stripping it.
///
/// The operand may be empty; callers decide how to prompt for input.
pub fn text_transform(text: &str) -> Option<(TextOperation, String)> {
    let lowered = text.to_lowercase();
    let (keyword, start) = TEXT_TRANSFORM_KEYWORDS
        .iter()
        .find_map(|kw| lowered.find(kw).map(|idx| (*kw, idx)))?;

    let operation = match keyword {
        "uppercase" => TextOperation::Uppercase,
        "lowercase" => TextOperation::Lowercase,
        "reverse" => TextOperation::Reverse,
        "capitalize" => TextOperation::Capitalize,
        _ => TextOperation::WordCount,
    };

    // Lowercasing can change byte lengths outside ASCII; fall back to the
    // lowered text when the offsets don't line up with the original.
    let end = start + keyword.len();
    let aligned =
        lowered.len() == text.len() && text.is_char_boundary(start) && text.is_char_boundary(end);
    let source = if aligned { text } else { lowered.as_str() };
    let before = &source[..start];
    let after = source[end..].trim_start().trim_start_matches([':', ',']);

    let operand = before
        .split_whitespace()
        .chain(after.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    Some((operation, operand))
}
