use std::io::BufRead;

use hashbrown::HashMap;

use crate::errors::{Result, WordFeatsError};
use crate::utils;

const SOURCE: &str = "features";

/// Identifier of a feature in the output vectors.
pub type FeatureId = u32;

/// Kind and payload of one feature dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    /// Bias applied to every non-padding word.
    Constant(f64),

    /// One-hot marker of a special word such as `</s>` or `<unk>`.
    Special(String),

    /// Entropy-centered log-probability of the word.
    Unigram {
        /// Entropy of the unigram distribution.
        entropy: f64,
        /// Scale of the feature value.
        scale: f64,
    },

    /// Number of characters in the word.
    Length,

    /// Whole-word identity.
    Word(String),

    /// Character n-gram touching neither word boundary.
    Match(String),

    /// Character n-gram anchored at the beginning of the word.
    Initial(String),

    /// Character n-gram anchored at the end of the word.
    Final(String),
}

/// One line of the feature dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Feature id.
    pub id: FeatureId,

    /// Feature kind.
    pub kind: FeatureKind,
}

impl FeatureRecord {
    /// Creates a new record.
    pub fn new(id: FeatureId, kind: FeatureKind) -> Self {
        Self { id, kind }
    }

    /// Parses a line of `<feature-id> <type> [<payload>...]`.
    ///
    /// # Errors
    ///
    /// [`WordFeatsError::UnrecognizedFeatureType`] is returned for an unknown type, and
    /// [`WordFeatsError::MalformedRecord`] when the id or the payload does not fit the type.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        Self::parse_fields(0, &fields)
    }

    fn parse_fields(line: usize, fields: &[&str]) -> Result<Self> {
        if fields.len() < 2 {
            return Err(WordFeatsError::malformed_record(
                SOURCE,
                line,
                format!("expected 2 fields at least, but got {}", fields.len()),
            ));
        }
        let id = utils::parse_field(SOURCE, line, "feature id", fields[0])?;
        let payload = &fields[2..];
        let kind = match fields[1] {
            "constant" => {
                Self::check_arity(line, "constant", payload, 1)?;
                FeatureKind::Constant(Self::parse_real(line, "value", payload[0])?)
            }
            "special" => {
                Self::check_arity(line, "special", payload, 1)?;
                FeatureKind::Special(payload[0].to_string())
            }
            "unigram" => {
                Self::check_arity(line, "unigram", payload, 2)?;
                let entropy = Self::parse_real(line, "entropy", payload[0])?;
                let scale = Self::parse_real(line, "scale", payload[1])?;
                // The feature value is divided by the entropy.
                if entropy == 0.0 {
                    return Err(WordFeatsError::malformed_record(
                        SOURCE,
                        line,
                        "entropy of unigram feature must not be zero",
                    ));
                }
                FeatureKind::Unigram { entropy, scale }
            }
            "length" => {
                Self::check_arity(line, "length", payload, 0)?;
                FeatureKind::Length
            }
            "word" => {
                Self::check_arity(line, "word", payload, 1)?;
                FeatureKind::Word(payload[0].to_string())
            }
            "match" => {
                Self::check_arity(line, "match", payload, 1)?;
                FeatureKind::Match(payload[0].to_string())
            }
            "initial" => {
                Self::check_arity(line, "initial", payload, 1)?;
                FeatureKind::Initial(payload[0].to_string())
            }
            "final" => {
                Self::check_arity(line, "final", payload, 1)?;
                FeatureKind::Final(payload[0].to_string())
            }
            feature_type => return Err(WordFeatsError::unrecognized_feature_type(feature_type)),
        };
        Ok(Self { id, kind })
    }

    fn parse_real(line: usize, name: &str, field: &str) -> Result<f64> {
        let value: f64 = utils::parse_field(SOURCE, line, name, field)?;
        if !value.is_finite() {
            return Err(WordFeatsError::malformed_record(
                SOURCE,
                line,
                format!("{} must be finite, but got {}", name, field),
            ));
        }
        Ok(value)
    }

    fn check_arity(line: usize, feature_type: &str, payload: &[&str], n: usize) -> Result<()> {
        if payload.len() != n {
            return Err(WordFeatsError::malformed_record(
                SOURCE,
                line,
                format!(
                    "{} feature takes {} payload fields, but got {}",
                    feature_type,
                    n,
                    payload.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Parameters of the unigram feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnigramFeature {
    /// Feature id.
    pub id: FeatureId,

    /// Entropy of the unigram distribution.
    pub entropy: f64,

    /// Scale of the feature value.
    pub scale: f64,
}

/// Feature dictionary assigning ids to feature instances.
///
/// The range of n-gram orders is derived from the `match`, `initial`, and `final` entries. The
/// order of an `initial` or `final` n-gram counts the virtual word boundary as one character.
#[derive(Debug, Default)]
pub struct FeatureDictionary {
    constant: Option<(FeatureId, f64)>,
    special: HashMap<String, FeatureId>,
    unigram: Option<UnigramFeature>,
    length: Option<FeatureId>,
    word: HashMap<String, FeatureId>,
    match_: HashMap<String, FeatureId>,
    initial: HashMap<String, FeatureId>,
    final_: HashMap<String, FeatureId>,
    ngram_orders: Option<(usize, usize)>,
}

impl FeatureDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dictionary from lines of `<feature-id> <type> [<payload>...]`.
    ///
    /// # Errors
    ///
    /// See [`FeatureRecord::parse_line()`].
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut dict = Self::new();
        utils::for_each_record(rdr, |line, fields| {
            let record = FeatureRecord::parse_fields(line, fields)?;
            dict.insert(record);
            Ok(())
        })?;
        Ok(dict)
    }

    /// Builds a dictionary from parsed records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FeatureRecord>,
    {
        let mut dict = Self::new();
        for record in records {
            dict.insert(record);
        }
        dict
    }

    /// Adds a record. An entry with the same key as an existing one replaces it.
    pub fn insert(&mut self, record: FeatureRecord) {
        let FeatureRecord { id, kind } = record;
        let order = match kind {
            FeatureKind::Constant(value) => {
                self.constant.replace((id, value));
                return;
            }
            FeatureKind::Special(word) => {
                self.special.insert(word, id);
                return;
            }
            FeatureKind::Unigram { entropy, scale } => {
                self.unigram.replace(UnigramFeature { id, entropy, scale });
                return;
            }
            FeatureKind::Length => {
                self.length.replace(id);
                return;
            }
            FeatureKind::Word(word) => {
                self.word.insert(word, id);
                return;
            }
            FeatureKind::Match(ngram) => {
                let order = ngram.chars().count();
                self.match_.insert(ngram, id);
                order
            }
            FeatureKind::Initial(ngram) => {
                let order = ngram.chars().count() + 1;
                self.initial.insert(ngram, id);
                order
            }
            FeatureKind::Final(ngram) => {
                let order = ngram.chars().count() + 1;
                self.final_.insert(ngram, id);
                order
            }
        };
        self.ngram_orders = Some(match self.ngram_orders {
            Some((min, max)) => (min.min(order), max.max(order)),
            None => (order, order),
        });
    }

    /// Returns the id and the value of the constant feature.
    pub const fn constant(&self) -> Option<(FeatureId, f64)> {
        self.constant
    }

    /// Returns the special word features.
    pub const fn special(&self) -> &HashMap<String, FeatureId> {
        &self.special
    }

    /// Returns the unigram feature.
    pub const fn unigram(&self) -> Option<UnigramFeature> {
        self.unigram
    }

    /// Returns the id of the length feature.
    pub const fn length(&self) -> Option<FeatureId> {
        self.length
    }

    /// Returns the whole-word features.
    pub const fn word_features(&self) -> &HashMap<String, FeatureId> {
        &self.word
    }

    /// Returns the interior n-gram features.
    pub const fn match_features(&self) -> &HashMap<String, FeatureId> {
        &self.match_
    }

    /// Returns the word-initial n-gram features.
    pub const fn initial_features(&self) -> &HashMap<String, FeatureId> {
        &self.initial
    }

    /// Returns the word-final n-gram features.
    pub const fn final_features(&self) -> &HashMap<String, FeatureId> {
        &self.final_
    }

    /// Returns the minimum n-gram order, or `None` if there is no n-gram feature.
    pub fn min_ngram_order(&self) -> Option<usize> {
        self.ngram_orders.map(|(min, _)| min)
    }

    /// Returns the maximum n-gram order, or `None` if there is no n-gram feature.
    pub fn max_ngram_order(&self) -> Option<usize> {
        self.ngram_orders.map(|(_, max)| max)
    }
}
