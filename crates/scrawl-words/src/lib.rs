//! Word pool for Scrawl.
//!
//! The room engine treats the pool as an external collaborator: it only
//! ever reads, through the [`WordPool`] trait, and picks one word at
//! random when a drawer starts a round. Managing the pool's contents
//! (seeding, adding, removing) is the embedding application's business;
//! [`WordList`] is the bundled in-memory implementation.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// A candidate secret word. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word {
    pub text: String,
}

impl Word {
    /// Number of characters a guesser will see as blanks.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Errors from word pool management operations.
#[derive(Debug, thiserror::Error)]
pub enum WordError {
    /// The exact text is already in the pool.
    #[error("word already exists: {0}")]
    Duplicate(String),

    /// The text was empty after trimming.
    #[error("word must not be empty")]
    Empty,

    /// The word is not in the pool.
    #[error("no such word: {0}")]
    NotFound(String),
}

/// Read-only view of the pool as the room engine sees it.
pub trait WordPool: Send + Sync + 'static {
    /// Returns every word currently in the pool.
    fn all_words(&self) -> Vec<Word>;
}

/// An in-memory word pool with insert-time uniqueness.
///
/// Interior `RwLock` so one `Arc<WordList>` can serve concurrent room
/// actors (readers) and an occasional management call (writer).
#[derive(Debug, Default)]
pub struct WordList {
    words: RwLock<Vec<Word>>,
}

impl WordList {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool seeded from an iterator; duplicates and empty
    /// entries are skipped with a log line.
    pub fn seeded<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = Self::new();
        for entry in entries {
            if let Err(e) = list.add(entry.into()) {
                tracing::debug!(error = %e, "skipping seed word");
            }
        }
        list
    }

    /// Adds a word to the pool.
    ///
    /// # Errors
    /// [`WordError::Empty`] if the text trims to nothing,
    /// [`WordError::Duplicate`] if the exact text is already stored.
    pub fn add(&self, text: impl Into<String>) -> Result<(), WordError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(WordError::Empty);
        }

        let mut words = self.words.write().expect("word pool lock poisoned");
        if words.iter().any(|w| w.text == text) {
            return Err(WordError::Duplicate(text));
        }
        words.push(Word { text });
        Ok(())
    }

    /// Removes a word from the pool.
    ///
    /// # Errors
    /// [`WordError::NotFound`] if the exact text is not stored.
    pub fn remove(&self, text: &str) -> Result<(), WordError> {
        let mut words = self.words.write().expect("word pool lock poisoned");
        let before = words.len();
        words.retain(|w| w.text != text);
        if words.len() == before {
            return Err(WordError::NotFound(text.to_string()));
        }
        Ok(())
    }

    /// Returns the number of words in the pool.
    pub fn len(&self) -> usize {
        self.words.read().expect("word pool lock poisoned").len()
    }

    /// Returns `true` if the pool holds no words.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WordPool for WordList {
    fn all_words(&self) -> Vec<Word> {
        self.words
            .read()
            .expect("word pool lock poisoned")
            .clone()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_stores_word() {
        let pool = WordList::new();
        pool.add("apple").unwrap();

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.all_words(), vec![Word { text: "apple".into() }]);
    }

    #[test]
    fn test_add_duplicate_returns_error() {
        let pool = WordList::new();
        pool.add("apple").unwrap();

        let result = pool.add("apple");

        assert!(matches!(result, Err(WordError::Duplicate(w)) if w == "apple"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_add_trims_whitespace_before_uniqueness_check() {
        let pool = WordList::new();
        pool.add("apple").unwrap();

        assert!(pool.add("  apple  ").is_err());
    }

    #[test]
    fn test_add_empty_returns_error() {
        let pool = WordList::new();
        assert!(matches!(pool.add("   "), Err(WordError::Empty)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_deletes_word() {
        let pool = WordList::seeded(["apple", "banana"]);

        pool.remove("apple").unwrap();

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.all_words()[0].text, "banana");
    }

    #[test]
    fn test_remove_unknown_returns_not_found() {
        let pool = WordList::new();
        assert!(matches!(
            pool.remove("ghost"),
            Err(WordError::NotFound(_))
        ));
    }

    #[test]
    fn test_seeded_skips_duplicates() {
        let pool = WordList::seeded(["apple", "apple", "banana", " "]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_char_len_counts_characters_not_bytes() {
        // "żółw" is 4 characters but 7 UTF-8 bytes — guessers must see
        // 4 blanks.
        let word = Word { text: "żółw".into() };
        assert_eq!(word.char_len(), 4);
        assert!(word.text.len() > 4);
    }
}
