use std::collections::VecDeque;

use crate::error::Error;

/// Separators tried in order: paragraphs, lines, words, characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping chunks of bounded length.
///
/// Lengths are counted in characters. The splitter prefers to cut at the
/// coarsest separator that keeps pieces under `chunk_size`, then packs
/// pieces back together, carrying up to `chunk_overlap` characters of the
/// previous chunk into the next one. Chunk order follows the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter. `chunk_overlap` must be smaller than
    /// `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, Error> {
        if chunk_size == 0 {
            return Err(Error::InvalidSplitter(
                "chunk size must be positive".to_owned(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidSplitter(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Returns the maximum chunk length.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the maximum overlap between consecutive chunks.
    #[inline]
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into chunks, dropping chunks that are only
    /// whitespace.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let idx = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(idx).copied().unwrap_or_default();
        let finer = separators.get(idx + 1..).unwrap_or_default();

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut small = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small, separator));
                small.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_owned());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            let joint = if current.is_empty() { 0 } else { sep_len };
            if total + len + joint > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);
                // Drop pieces from the front until what is left fits the
                // overlap and leaves room for the next piece.
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + joint_len(&current, sep_len)
                            > self.chunk_size)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    let joint = if current.is_empty() { 0 } else { sep_len };
                    total -= char_len(front) + joint;
                }
            }
            current.push_back(piece);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }
        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[inline]
fn joint_len(current: &VecDeque<&str>, sep_len: usize) -> usize {
    if current.is_empty() { 0 } else { sep_len }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_owned());
    }
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_rejects_bad_settings() {
        assert!(matches!(
            TextSplitter::new(100, 100),
            Err(Error::InvalidSplitter(_))
        ));
        assert!(matches!(
            TextSplitter::new(0, 0),
            Err(Error::InvalidSplitter(_))
        ));
        assert!(TextSplitter::new(1000, 200).is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(1000, 200).unwrap();
        assert_eq!(splitter.split("  short text \n"), vec!["short text"]);
        assert!(splitter.split("   ").is_empty());
    }

    #[test]
    fn test_word_overlap() {
        let splitter = TextSplitter::new(10, 4).unwrap();
        assert_eq!(
            splitter.split("aa bb cc dd ee ff"),
            vec!["aa bb cc", "cc dd ee", "ee ff"]
        );
    }

    #[test]
    fn test_prefers_paragraphs() {
        let splitter = TextSplitter::new(20, 5).unwrap();
        let chunks = splitter.split("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let splitter = TextSplitter::new(4, 1).unwrap();
        let chunks = splitter.split("abcdefghij");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(chunks.first().map(String::as_str), Some("abcd"));
        assert_eq!(chunks.concat().chars().filter(|c| *c == 'a').count(), 1);
    }

    #[test]
    fn test_multibyte_text() {
        let splitter = TextSplitter::new(3, 1).unwrap();
        let chunks = splitter.split("äöüßé");
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
        assert!(chunks.first().unwrap().starts_with('ä'));
        assert!(chunks.last().unwrap().ends_with('é'));
    }

    proptest! {
        #[test]
        fn prop_chunks_are_bounded(
            text in "[a-z \n]{0,400}",
            chunk_size in 2usize..60,
        ) {
            let splitter = TextSplitter::new(chunk_size, chunk_size / 3).unwrap();
            for chunk in splitter.split(&text) {
                prop_assert!(chunk.chars().count() <= chunk_size);
                prop_assert!(!chunk.trim().is_empty());
            }
        }

        #[test]
        fn prop_words_keep_their_order(words in prop::collection::vec("[a-z]{1,5}", 1..40)) {
            let text = words.join(" ");
            let splitter = TextSplitter::new(12, 0).unwrap();
            let rejoined = splitter.split(&text).join(" ");
            prop_assert_eq!(rejoined, text);
        }
    }
}
