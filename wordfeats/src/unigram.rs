use std::io::BufRead;

use crate::errors::{Result, WordFeatsError};
use crate::utils;

const SOURCE: &str = "unigram_probs";

/// Unigram probabilities indexed by word id.
#[derive(Debug, Default)]
pub struct UnigramProbs {
    probs: Vec<Option<f64>>,
}

impl UnigramProbs {
    /// Loads probabilities from lines of `<id> <probability>`.
    ///
    /// Every id in `1..=max_id` must be present. Id 0 is the padding symbol and may be
    /// omitted, since features are never computed for it.
    ///
    /// # Errors
    ///
    /// [`WordFeatsError::MissingProbability`] is returned when an id is absent, and
    /// [`WordFeatsError::MalformedRecord`] when a line is not an id followed by a
    /// probability in `(0, 1]`.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut records = vec![];
        utils::for_each_record(rdr, |line, fields| {
            utils::expect_n_fields(SOURCE, line, fields, 2)?;
            let id: usize = utils::parse_field(SOURCE, line, "word id", fields[0])?;
            let prob: f64 = utils::parse_field(SOURCE, line, "probability", fields[1])?;
            if !(prob > 0.0 && prob <= 1.0) {
                return Err(WordFeatsError::malformed_record(
                    SOURCE,
                    line,
                    format!("probability must be in (0, 1], but got {}", fields[1]),
                ));
            }
            records.push((id, prob));
            Ok(())
        })?;

        // Finds a gap before allocating, so a huge id cannot size the table.
        let mut ids: Vec<usize> = records
            .iter()
            .map(|&(id, _)| id)
            .filter(|&id| id != 0)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        for (expected, &id) in (1..).zip(&ids) {
            if id != expected {
                return Err(WordFeatsError::missing_probability(expected));
            }
        }

        let mut probs = if records.is_empty() {
            vec![]
        } else {
            vec![None; ids.len() + 1]
        };
        for (id, prob) in records {
            probs[id] = Some(prob);
        }
        Ok(Self { probs })
    }

    /// Returns the number of slots, i.e., the maximum id plus one.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Returns `true` if no probability is loaded.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Returns the probability of the word with `id`.
    pub fn get(&self, id: usize) -> Option<f64> {
        self.probs.get(id).copied().flatten()
    }

    /// Checks that every id in `1..n_words` has a probability.
    pub fn check_covers(&self, n_words: usize) -> Result<()> {
        match (1..n_words).find(|&id| self.get(id).is_none()) {
            Some(id) => Err(WordFeatsError::missing_probability(id)),
            None => Ok(()),
        }
    }
}
