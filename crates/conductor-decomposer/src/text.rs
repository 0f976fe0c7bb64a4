//! Word-level text helpers shared by routing, inference and brief matching.

use std::collections::HashSet;

/// Lowercase alphanumeric words of `text`, in order.
pub(crate) fn words(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(str::to_lowercase)
    .collect()
}

/// Distinct words longer than `min_exclusive` characters.
pub(crate) fn significant_words(text: &str, min_exclusive: usize) -> HashSet<String> {
  words(text)
    .into_iter()
    .filter(|w| w.chars().count() > min_exclusive)
    .collect()
}

/// Whole-word, case-insensitive phrase match.
pub(crate) fn contains_phrase(text: &str, phrase: &str) -> bool {
  let phrase = words(phrase);
  if phrase.is_empty() {
    return false;
  }
  let text = words(text);
  text.windows(phrase.len()).any(|window| window == phrase.as_slice())
}
