//! Sentence-aware text splitting
//!
//! Splits document text into overlapping chunks sized in approximate tokens
//! (whitespace-delimited words). Splitting is done by `text-splitter`, which
//! breaks on Unicode sentence boundaries first and falls back to words for
//! sentences longer than a chunk.

use text_splitter::{ChunkConfig, ChunkSizer, TextSplitter};
use tracing::{debug, warn};

/// Options for splitting text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Maximum tokens per chunk
    pub chunk_size: usize,
    /// Tokens repeated between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Approximate token count of a piece of text
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sizes chunks by whitespace-delimited word count
#[derive(Debug, Clone, Copy)]
struct WordCount;

impl ChunkSizer for WordCount {
    fn size(&self, chunk: &str) -> usize {
        count_tokens(chunk)
    }
}

/// Split text into overlapping chunks
pub fn split_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    debug!(text_len = text.len(), ?options, "split_text: called");
    let chunk_size = options.chunk_size.max(1);
    // Overlap must stay below the chunk size or the splitter makes no progress
    let overlap = options.chunk_overlap.min(chunk_size - 1);

    let config = match ChunkConfig::new(chunk_size)
        .with_sizer(WordCount)
        .with_trim(true)
        .with_overlap(overlap)
    {
        Ok(config) => config,
        Err(e) => {
            warn!(chunk_size, overlap, error = %e, "split_text: overlap rejected, splitting without it");
            ChunkConfig::new(chunk_size).with_sizer(WordCount).with_trim(true)
        }
    };

    let chunks: Vec<String> = TextSplitter::new(config)
        .chunks(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect();

    debug!(chunk_count = chunks.len(), "split_text: done");
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn opts(chunk_size: usize, chunk_overlap: usize) -> ChunkOptions {
        ChunkOptions {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn test_split_small_text_single_chunk() {
        let chunks = split_text("Hello world. Goodbye world.", &ChunkOptions::default());
        assert_eq!(chunks, vec!["Hello world. Goodbye world."]);
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_text("", &ChunkOptions::default()).is_empty());
        assert!(split_text("  \n\n  ", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn test_split_keeps_abbreviation_inside_sentence() {
        let text = "Its mayor, e.g. the official head, lives there. Lagos is in Nigeria.";
        let chunks = split_text(text, &opts(8, 0));
        assert_eq!(
            chunks,
            vec!["Its mayor, e.g. the official head, lives there.", "Lagos is in Nigeria."]
        );
    }

    #[test]
    fn test_split_respects_budget_and_overlaps() {
        // 10 sentences of 4 tokens each
        let text = (0..10).map(|i| format!("Sentence number {} here.", i)).collect::<Vec<_>>().join(" ");
        let with_overlap = split_text(&text, &opts(12, 4));
        let without_overlap = split_text(&text, &opts(12, 0));

        assert!(with_overlap.len() > 1);
        for chunk in &with_overlap {
            assert!(count_tokens(chunk) <= 12, "chunk too large: {}", chunk);
        }
        for i in 0..10 {
            let sentence = format!("Sentence number {} here.", i);
            assert!(with_overlap.iter().any(|c| c.contains(&sentence)), "missing: {}", sentence);
        }
        assert!(with_overlap.len() >= without_overlap.len());
    }

    #[test]
    fn test_split_long_sentence_on_words() {
        let text = vec!["word"; 25].join(" ");
        let chunks = split_text(&text, &opts(10, 0));
        assert_eq!(chunks.len(), 3);
        assert_eq!(count_tokens(&chunks[0]), 10);
        assert_eq!(count_tokens(&chunks[2]), 5);
    }

    #[test]
    fn test_overlap_clamped_below_chunk_size() {
        let text = "One two. Three four. Five six. Seven eight.";
        let chunks = split_text(text, &opts(4, 10));
        assert!(!chunks.is_empty());
        assert!(chunks.last().unwrap().contains("eight"));
    }

    proptest! {
        #[test]
        fn prop_chunks_within_budget(words in proptest::collection::vec("[a-z]{1,8}[.]?", 0..200), size in 5usize..60, overlap in 0usize..20) {
            let text = words.join(" ");
            let chunks = split_text(&text, &opts(size, overlap));
            for chunk in &chunks {
                prop_assert!(count_tokens(chunk) <= size);
                prop_assert!(!chunk.trim().is_empty());
            }
            if count_tokens(&text) > 0 {
                prop_assert!(!chunks.is_empty());
            }
        }
    }
}
