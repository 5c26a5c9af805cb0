//! Buffer word completion for the content assist action.

use core_actions::{ContentAssistProvider, Proposal};
use core_text::Buffer;
use std::collections::BTreeSet;

/// Proposes the distinct words of the buffer that extend the typed prefix,
/// in lexical order.
#[derive(Debug, Default)]
pub struct BufferWords;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl ContentAssistProvider for BufferWords {
    fn proposals(&mut self, buffer: &Buffer, _offset: usize, prefix: &str) -> Vec<Proposal> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let text = buffer.text();
        let words: BTreeSet<&str> = text
            .split(|c: char| !is_word_char(c))
            .filter(|w| w.len() > prefix.len() && w.starts_with(prefix))
            .collect();
        words.into_iter().map(Proposal::plain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn proposes_longer_words_sharing_the_prefix() {
        let buffer = Buffer::from_str("t", "counter count_all co\ncounter");
        let got: Vec<String> = BufferWords
            .proposals(&buffer, 20, "co")
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert_eq!(got, vec!["count_all", "counter"]);
    }

    #[test]
    fn empty_prefix_proposes_nothing() {
        let buffer = Buffer::from_str("t", "alpha");
        assert!(BufferWords.proposals(&buffer, 0, "").is_empty());
    }
}
