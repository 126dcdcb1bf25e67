#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Wordfeats
//!
//! Wordfeats turns the words of a language model vocabulary into sparse feature vectors
//! consisting of a constant bias, special word markers, a unigram feature, a length feature,
//! whole-word features, and counts of character n-grams at interior, word-initial, and
//! word-final positions.
//!
//! ## Examples
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{stdout, BufReader};
//!
//! use wordfeats::{FeatureDictionary, FeatureExtractor, FeatureWriter, UnigramProbs, Vocabulary};
//!
//! let vocab = Vocabulary::from_reader(BufReader::new(File::open("words.txt").unwrap())).unwrap();
//! let probs =
//!     UnigramProbs::from_reader(BufReader::new(File::open("unigram_probs.txt").unwrap())).unwrap();
//! let dict =
//!     FeatureDictionary::from_reader(BufReader::new(File::open("features.txt").unwrap())).unwrap();
//!
//! let extractor = FeatureExtractor::new(dict, probs, &vocab).unwrap();
//!
//! let mut wtr = FeatureWriter::new(stdout().lock());
//! for (id, word) in vocab.iter() {
//!     wtr.write_entry(id, &extractor.extract(word, id)).unwrap();
//! }
//! eprintln!("made features for {} words.", wtr.n_words());
//! ```
//!
//! Parallel extraction requires **crate feature** `multithreading` (enabled by default). For
//! more details, see [`FeatureExtractor::extract_all_parallel()`].

mod utils;

mod emitter;
pub mod errors;
mod feature;
mod feature_dict;
mod unigram;
mod vocab;

pub use emitter::FeatureWriter;
pub use errors::{Result, WordFeatsError};
pub use feature::{FeatureExtractor, FeatureValue, FeatureVector};
pub use feature_dict::{FeatureDictionary, FeatureId, FeatureKind, FeatureRecord, UnigramFeature};
pub use unigram::UnigramProbs;
pub use vocab::Vocabulary;
