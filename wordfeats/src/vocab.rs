use std::io::BufRead;

use hashbrown::HashMap;

use crate::errors::{Result, WordFeatsError};
use crate::utils;

const SOURCE: &str = "vocab";

/// Vocabulary mapping words to dense ids `0..N`.
///
/// Id 0 is reserved for the padding (epsilon) symbol.
#[derive(Debug, Default)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    /// Loads a vocabulary from lines of `<word> <id>`.
    ///
    /// # Errors
    ///
    /// [`WordFeatsError::DuplicateWord`] is returned when a word appears twice,
    /// [`WordFeatsError::NonContiguousId`] when the ids are not exactly `0..N`, and
    /// [`WordFeatsError::MalformedRecord`] when a line is not a word followed by an id.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut entries = vec![];
        let mut ids = HashMap::new();
        utils::for_each_record(rdr, |line, fields| {
            utils::expect_n_fields(SOURCE, line, fields, 2)?;
            let word = fields[0];
            let id: usize = utils::parse_field(SOURCE, line, "word id", fields[1])?;
            if ids.insert(word.to_string(), id).is_some() {
                return Err(WordFeatsError::duplicate_word(word));
            }
            entries.push((id, word.to_string()));
            Ok(())
        })?;

        entries.sort_unstable_by_key(|&(id, _)| id);
        for (expected, &(id, ref word)) in entries.iter().enumerate() {
            if id != expected {
                return Err(WordFeatsError::non_contiguous_id(format!(
                    "word {} has id {}, but id {} is expected",
                    word, id, expected
                )));
            }
        }
        let words = entries.into_iter().map(|(_, word)| word).collect();

        Ok(Self { words, ids })
    }

    /// Returns the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the vocabulary has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the id of `word`.
    pub fn get_id(&self, word: &str) -> Option<usize> {
        self.ids.get(word).copied()
    }

    /// Returns the word with `id`.
    pub fn get_word(&self, id: usize) -> Option<&str> {
        self.words.get(id).map(String::as_str)
    }

    /// Iterates `(id, word)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.words.iter().map(String::as_str).enumerate()
    }
}
