// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence-aware text chunking.
//!
//! Documents split on sentence boundaries (`.?!` followed by whitespace),
//! then sentences accumulate into chunks of roughly the target word count.
//! A chunk is never empty; a single sentence longer than the target
//! becomes its own oversized chunk.

/// Split text into sentences. Terminal punctuation stays attached.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '?' | '!') {
            // Only a boundary when followed by whitespace; "3.14" stays whole.
            if chars.peek().is_some_and(|next| next.is_whitespace()) {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }

    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    sentences
}

/// Accumulate sentences into chunks of roughly `target_words` words.
///
/// When adding the next sentence would exceed the target and the current
/// chunk is non-empty, the chunk is emitted and a new one starts.
pub fn chunk_text(text: &str, target_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for sentence in split_sentences(text) {
        let words = sentence.split_whitespace().count();
        if current_words + words > target_words && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_words = 0;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
        current_words += words;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("One. Two? Three! Four");
        assert_eq!(sentences, vec!["One.", "Two?", "Three!", "Four"]);
    }

    #[test]
    fn decimal_points_are_not_boundaries() {
        let sentences = split_sentences("Pi is 3.14159 exactly. Indeed.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "Pi is 3.14159 exactly.");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
        assert!(chunk_text("", 300).is_empty());
    }

    #[test]
    fn one_word_target_isolates_sentences() {
        let chunks = chunk_text("A. B. C.", 1);
        assert_eq!(chunks, vec!["A.", "B.", "C."]);
    }

    #[test]
    fn sentences_accumulate_up_to_target() {
        // Each sentence has 3 words; two fit in a 6-word chunk.
        let chunks = chunk_text("one two three. four five six. seven eight nine.", 6);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "one two three. four five six.");
        assert_eq!(chunks[1], "seven eight nine.");
    }

    #[test]
    fn oversized_sentence_becomes_own_chunk() {
        let long = "word ".repeat(50).trim_end().to_string() + ".";
        let text = format!("Short one. {long} Tail.");
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[1].split_whitespace().count() > 10);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn no_words_are_lost() {
        let text = "The quick brown fox jumps. Over the lazy dog! \
                    Pack my box with five dozen jugs? Final fragment";
        for target in [1, 3, 5, 100] {
            let chunks = chunk_text(text, target);
            let rejoined = chunks.join(" ");
            let original: Vec<&str> = text.split_whitespace().collect();
            let recovered: Vec<&str> = rejoined.split_whitespace().collect();
            assert_eq!(original, recovered, "target={target}");
        }
    }
}
