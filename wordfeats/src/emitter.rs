use std::io::Write;

use crate::errors::Result;
use crate::feature::FeatureVector;

/// Writer of feature vectors, one line per word.
///
/// Each line is `<id>\t<feat-id> <value> <feat-id> <value> ...` with the pairs sorted by
/// feature id.
pub struct FeatureWriter<W>
where
    W: Write,
{
    wtr: W,
    n_words: usize,
}

impl<W> FeatureWriter<W>
where
    W: Write,
{
    /// Creates a new writer.
    pub fn new(wtr: W) -> Self {
        Self { wtr, n_words: 0 }
    }

    /// Writes the features of the word with `id`.
    pub fn write_entry(&mut self, id: usize, features: &FeatureVector) -> Result<()> {
        write!(self.wtr, "{}\t", id)?;
        for (i, (feat_id, value)) in features.to_sorted_vec().into_iter().enumerate() {
            if i != 0 {
                self.wtr.write_all(b" ")?;
            }
            write!(self.wtr, "{} {}", feat_id, value)?;
        }
        self.wtr.write_all(b"\n")?;
        self.n_words += 1;
        Ok(())
    }

    /// Returns the number of written words.
    pub fn n_words(&self) -> usize {
        self.n_words
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.wtr.flush()?;
        Ok(self.wtr)
    }
}
