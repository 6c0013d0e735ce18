// file: src/repository/chunker.rs
// description: recursive character text splitter producing overlapping chunks
// reference: separator hierarchy paragraph > line > word > character

use crate::error::{IndexError, Result};
use tracing::warn;

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into chunks of at most `chunk_size` characters, trying coarse
/// separators first and falling back to finer ones for oversized pieces.
/// Consecutive chunks share up to `chunk_overlap` characters.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IndexError::Validation(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IndexError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Greedily pack pieces into windows of at most `chunk_size`, keeping a
    /// tail of at most `chunk_overlap` characters as the start of the next window.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }

                push_joined(&mut chunks, &window);

                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    let (_, first_len) = window.remove(0);
                    total -= first_len;
                }
            }

            window.push((piece.as_str(), len));
            total += len;
        }

        push_joined(&mut chunks, &window);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &[(&str, usize)]) {
    let joined: String = window.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. An empty separator splits into characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut parts = text.split(separator);

    if let Some(first) = parts.next()
        && !first.is_empty()
    {
        pieces.push(first.to_string());
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }

    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::new(1000, 200).unwrap();
        assert_eq!(splitter.split_text("  hello world \n"), vec!["hello world"]);
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        let splitter = TextSplitter::new(10, 0).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_word_split_without_overlap() {
        let splitter = TextSplitter::new(9, 0).unwrap();
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc"),
            vec!["aaaa bbbb", "cccc"]
        );
    }

    #[test]
    fn test_overlap_carries_trailing_words() {
        let splitter = TextSplitter::new(10, 5).unwrap();
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc"),
            vec!["aaaa bbbb", "bbbb cccc"]
        );
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 0).unwrap();
        assert_eq!(
            splitter.split_text("abcdefghij"),
            vec!["abcd", "efgh", "ij"]
        );
    }

    #[test]
    fn test_paragraphs_preferred_over_lines() {
        let splitter = TextSplitter::new(12, 0).unwrap();
        let chunks = splitter.split_text("first para\n\nsecond one");
        assert_eq!(chunks, vec!["first para", "second one"]);
    }

    #[test]
    fn test_chunks_respect_size_in_characters() {
        let splitter = TextSplitter::new(5, 1).unwrap();
        for chunk in splitter.split_text("héllo wörld ünïcode tèxt") {
            assert!(chunk.chars().count() <= 5, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(10, 10).is_err());
    }
}
