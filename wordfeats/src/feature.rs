use core::fmt;
use core::ops::AddAssign;

use hashbrown::HashMap;

#[cfg(feature = "multithreading")]
use rayon::prelude::*;

use crate::errors::Result;
use crate::feature_dict::{FeatureDictionary, FeatureId};
use crate::unigram::UnigramProbs;
use crate::vocab::Vocabulary;

/// Value of a feature.
///
/// Counts and one-hot markers are integers. The constant and unigram features are reals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    /// Exact integer value.
    Integer(i64),

    /// Real value.
    Real(f64),
}

impl Default for FeatureValue {
    fn default() -> Self {
        Self::Integer(0)
    }
}

impl AddAssign<i64> for FeatureValue {
    fn add_assign(&mut self, rhs: i64) {
        match self {
            Self::Integer(v) => *v += rhs,
            Self::Real(v) => *v += rhs as f64,
        }
    }
}

impl fmt::Display for FeatureValue {
    /// Reals always carry a decimal point or an exponent so that they can be told apart from
    /// integers, e.g., `1.0` and `1e-7`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{:?}", v),
        }
    }
}

/// Sparse feature vector of a word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    values: HashMap<FeatureId, FeatureValue>,
}

impl FeatureVector {
    /// Creates an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of feature `id`, overwriting the previous one.
    pub fn set(&mut self, id: FeatureId, value: FeatureValue) {
        self.values.insert(id, value);
    }

    /// Adds `value` to feature `id`. Absent features start from zero.
    pub fn add(&mut self, id: FeatureId, value: i64) {
        *self.values.entry(id).or_default() += value;
    }

    /// Returns the value of feature `id`.
    pub fn get(&self, id: FeatureId) -> Option<FeatureValue> {
        self.values.get(&id).copied()
    }

    /// Returns the number of non-empty features.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no feature is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the features sorted by id.
    pub fn to_sorted_vec(&self) -> Vec<(FeatureId, FeatureValue)> {
        let mut result: Vec<_> = self.values.iter().map(|(&id, &v)| (id, v)).collect();
        result.sort_unstable_by_key(|&(id, _)| id);
        result
    }
}

/// Position class of a character n-gram in a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NgramClass {
    Match,
    Initial,
    Final,
}

/// Extractor of word features.
pub struct FeatureExtractor {
    dict: FeatureDictionary,
    unigram_probs: UnigramProbs,
}

impl FeatureExtractor {
    /// Creates a new extractor for the words of `vocab`.
    ///
    /// # Arguments
    ///
    /// * `dict` - A feature dictionary.
    /// * `unigram_probs` - Unigram probabilities of the vocabulary.
    /// * `vocab` - The vocabulary to be featurized.
    ///
    /// # Returns
    ///
    /// A new extractor.
    ///
    /// # Errors
    ///
    /// [`WordFeatsError::MissingProbability`](crate::WordFeatsError::MissingProbability) is
    /// returned when the unigram feature is used and a word other than the padding symbol
    /// has no probability.
    pub fn new(
        dict: FeatureDictionary,
        unigram_probs: UnigramProbs,
        vocab: &Vocabulary,
    ) -> Result<Self> {
        if dict.unigram().is_some() {
            unigram_probs.check_covers(vocab.len())?;
        }
        Ok(Self {
            dict,
            unigram_probs,
        })
    }

    /// Returns the feature dictionary.
    pub const fn dictionary(&self) -> &FeatureDictionary {
        &self.dict
    }

    /// Extracts features of a word.
    ///
    /// # Arguments
    ///
    /// * `word` - A word.
    /// * `id` - The id of the word. Id 0 is the padding symbol and always gets no feature.
    ///
    /// # Returns
    ///
    /// The feature vector.
    pub fn extract(&self, word: &str, id: usize) -> FeatureVector {
        let mut features = FeatureVector::new();
        if id == 0 {
            return features;
        }

        if let Some((feat_id, value)) = self.dict.constant() {
            features.set(feat_id, FeatureValue::Real(value));
        }

        // Special words get no other feature.
        if let Some(&feat_id) = self.dict.special().get(word) {
            features.set(feat_id, FeatureValue::Integer(1));
            return features;
        }

        if let Some(unigram) = self.dict.unigram() {
            if let Some(prob) = self.unigram_probs.get(id) {
                let logp = prob.ln();
                let value = (logp + unigram.entropy) * unigram.scale / unigram.entropy;
                features.set(unigram.id, FeatureValue::Real(value));
            }
        }

        // Byte offsets of the character boundaries.
        let mut offsets: Vec<usize> = word.char_indices().map(|(i, _)| i).collect();
        offsets.push(word.len());
        let len = offsets.len() - 1;

        if let Some(feat_id) = self.dict.length() {
            features.set(feat_id, FeatureValue::Integer(len as i64));
        }

        if let Some(&feat_id) = self.dict.word_features().get(word) {
            features.set(feat_id, FeatureValue::Integer(1));
        }

        if let (Some(min_order), Some(max_order)) =
            (self.dict.min_ngram_order(), self.dict.max_ngram_order())
        {
            self.extract_ngrams(word, &offsets, min_order, max_order, &mut features);
        }

        features
    }

    /// Counts n-grams in `word`, where `pos == len` stands for the end-of-word boundary.
    fn extract_ngrams(
        &self,
        word: &str,
        offsets: &[usize],
        min_order: usize,
        max_order: usize,
        features: &mut FeatureVector,
    ) {
        let len = offsets.len() as isize - 1;
        for pos in 0..=len {
            for order in min_order as isize..=max_order as isize {
                let mut start = pos - order + 1;
                let mut end = pos + 1;
                if start < -1 {
                    continue;
                }
                let class = if start < 0 && end > len {
                    // the whole word is covered by the word feature
                    continue;
                } else if start < 0 {
                    start = 0;
                    NgramClass::Initial
                } else if end > len {
                    end = len;
                    NgramClass::Final
                } else {
                    NgramClass::Match
                };
                if start >= end {
                    continue;
                }
                let ngram = &word[offsets[start as usize]..offsets[end as usize]];
                let table = match class {
                    NgramClass::Match => self.dict.match_features(),
                    NgramClass::Initial => self.dict.initial_features(),
                    NgramClass::Final => self.dict.final_features(),
                };
                if let Some(&feat_id) = table.get(ngram) {
                    features.add(feat_id, 1);
                }
            }
        }
    }

    /// Extracts features of all words in ascending id order.
    pub fn extract_all(&self, vocab: &Vocabulary) -> Vec<FeatureVector> {
        vocab
            .iter()
            .map(|(id, word)| self.extract(word, id))
            .collect()
    }

    /// Extracts features of all words in ascending id order using multiple threads.
    ///
    /// # Arguments
    ///
    /// * `vocab` - A vocabulary.
    /// * `n_threads` - The number of threads. 0 uses the default number of the thread pool.
    ///
    /// # Returns
    ///
    /// The feature vectors, indexed by word id.
    ///
    /// # Errors
    ///
    /// [`WordFeatsError::ThreadPool`](crate::WordFeatsError::ThreadPool) is returned when the
    /// thread pool cannot be built.
    #[cfg(feature = "multithreading")]
    #[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
    pub fn extract_all_parallel(
        &self,
        vocab: &Vocabulary,
        n_threads: usize,
    ) -> Result<Vec<FeatureVector>> {
        let words: Vec<&str> = vocab.iter().map(|(_, word)| word).collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()?;
        Ok(pool.install(|| {
            words
                .par_iter()
                .enumerate()
                .map(|(id, word)| self.extract(word, id))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::feature_dict::{FeatureKind, FeatureRecord};

    fn extractor(records: Vec<FeatureRecord>, probs: &str) -> FeatureExtractor {
        let dict = FeatureDictionary::from_records(records);
        let probs = UnigramProbs::from_reader(probs.as_bytes()).unwrap();
        FeatureExtractor::new(dict, probs, &Vocabulary::default()).unwrap()
    }

    fn ngram_extractor() -> FeatureExtractor {
        extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Constant(1.0)),
                FeatureRecord::new(1, FeatureKind::Special("</s>".into())),
                FeatureRecord::new(2, FeatureKind::Unigram {
                    entropy: 2.0,
                    scale: 0.5,
                }),
                FeatureRecord::new(3, FeatureKind::Length),
                FeatureRecord::new(4, FeatureKind::Word("cat".into())),
                FeatureRecord::new(5, FeatureKind::Match("a".into())),
                FeatureRecord::new(6, FeatureKind::Match("at".into())),
                FeatureRecord::new(7, FeatureKind::Initial("c".into())),
                FeatureRecord::new(8, FeatureKind::Final("t".into())),
                FeatureRecord::new(9, FeatureKind::Match("cat".into())),
                FeatureRecord::new(10, FeatureKind::Initial("cat".into())),
            ],
            "0 0.5\n1 0.25\n2 0.25\n",
        )
    }

    fn sorted(features: &FeatureVector) -> Vec<(FeatureId, FeatureValue)> {
        features.to_sorted_vec()
    }

    #[test]
    fn test_feature_value_add() {
        let mut v = FeatureValue::default();
        v += 1;
        v += 1;
        assert_eq!(FeatureValue::Integer(2), v);

        let mut v = FeatureValue::Real(0.5);
        v += 1;
        assert_eq!(FeatureValue::Real(1.5), v);
    }

    #[test]
    fn test_feature_value_display() {
        assert_eq!("3", FeatureValue::Integer(3).to_string());
        assert_eq!("-2", FeatureValue::Integer(-2).to_string());
        assert_eq!("1.0", FeatureValue::Real(1.0).to_string());
        assert_eq!("-0.25", FeatureValue::Real(-0.25).to_string());
        assert_eq!("1e-7", FeatureValue::Real(1e-7).to_string());
        let x = 0.1 + 0.2;
        assert_eq!(x, FeatureValue::Real(x).to_string().parse::<f64>().unwrap());
    }

    #[test]
    fn test_feature_vector_accumulate() {
        let mut features = FeatureVector::new();
        features.add(3, 1);
        features.add(1, 1);
        features.add(3, 1);
        features.set(2, FeatureValue::Real(0.5));

        assert_eq!(3, features.len());
        assert_eq!(Some(FeatureValue::Integer(2)), features.get(3));
        assert_eq!(None, features.get(0));
        assert_eq!(
            vec![
                (1, FeatureValue::Integer(1)),
                (2, FeatureValue::Real(0.5)),
                (3, FeatureValue::Integer(2)),
            ],
            sorted(&features)
        );
    }

    #[test]
    fn test_extract_padding() {
        let fe = ngram_extractor();

        assert!(fe.extract("cat", 0).is_empty());
        assert!(fe.extract("</s>", 0).is_empty());
    }

    #[test]
    fn test_extract_special() {
        let fe = ngram_extractor();

        assert_eq!(
            vec![(0, FeatureValue::Real(1.0)), (1, FeatureValue::Integer(1))],
            sorted(&fe.extract("</s>", 1))
        );
    }

    #[test]
    fn test_extract_special_without_constant() {
        let fe = extractor(
            vec![
                FeatureRecord::new(1, FeatureKind::Special("<unk>".into())),
                FeatureRecord::new(3, FeatureKind::Length),
                FeatureRecord::new(5, FeatureKind::Match("un".into())),
            ],
            "",
        );

        assert_eq!(
            vec![(1, FeatureValue::Integer(1))],
            sorted(&fe.extract("<unk>", 4))
        );
    }

    #[test]
    fn test_extract() {
        let fe = ngram_extractor();
        let features = fe.extract("cat", 2);

        let unigram = (0.25f64.ln() + 2.0) * 0.5 / 2.0;
        assert_eq!(
            vec![
                (0, FeatureValue::Real(1.0)),
                (2, FeatureValue::Real(unigram)),
                (3, FeatureValue::Integer(3)),
                (4, FeatureValue::Integer(1)),
                (5, FeatureValue::Integer(1)),
                (6, FeatureValue::Integer(1)),
                (7, FeatureValue::Integer(1)),
                (8, FeatureValue::Integer(1)),
                (9, FeatureValue::Integer(1)),
                (10, FeatureValue::Integer(1)),
            ],
            sorted(&features)
        );
    }

    #[test]
    fn test_extract_idempotent() {
        let fe = ngram_extractor();

        assert_eq!(fe.extract("catcat", 2), fe.extract("catcat", 2));
    }

    #[test]
    fn test_extract_repeated_ngram() {
        let fe = extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Match("an".into())),
                FeatureRecord::new(1, FeatureKind::Match("a".into())),
            ],
            "",
        );

        assert_eq!(
            vec![(0, FeatureValue::Integer(2)), (1, FeatureValue::Integer(3))],
            sorted(&fe.extract("banana", 1))
        );
    }

    #[test]
    fn test_extract_whole_word_is_not_an_ngram() {
        let fe = extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Word("at".into())),
                FeatureRecord::new(1, FeatureKind::Initial("at".into())),
                FeatureRecord::new(2, FeatureKind::Final("at".into())),
                FeatureRecord::new(3, FeatureKind::Match("wxyz".into())),
            ],
            "",
        );

        // The order-4 span of "at" covers both boundaries and is left to the word feature.
        assert_eq!(
            vec![
                (0, FeatureValue::Integer(1)),
                (1, FeatureValue::Integer(1)),
                (2, FeatureValue::Integer(1)),
            ],
            sorted(&fe.extract("at", 1))
        );
    }

    #[test]
    fn test_extract_initial_and_final() {
        let fe = extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Initial("ca".into())),
                FeatureRecord::new(1, FeatureKind::Final("ts".into())),
                FeatureRecord::new(2, FeatureKind::Match("ca".into())),
                FeatureRecord::new(3, FeatureKind::Match("ts".into())),
            ],
            "",
        );

        assert_eq!(
            vec![
                (0, FeatureValue::Integer(1)),
                (1, FeatureValue::Integer(1)),
                (2, FeatureValue::Integer(1)),
                (3, FeatureValue::Integer(1)),
            ],
            sorted(&fe.extract("cats", 1))
        );
        assert_eq!(
            vec![(2, FeatureValue::Integer(1)), (3, FeatureValue::Integer(1))],
            sorted(&fe.extract("scatsy", 1))
        );
    }

    #[test]
    fn test_extract_short_words() {
        let fe = extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Match("a".into())),
                FeatureRecord::new(1, FeatureKind::Initial("a".into())),
                FeatureRecord::new(2, FeatureKind::Final("a".into())),
                FeatureRecord::new(3, FeatureKind::Length),
            ],
            "",
        );

        assert_eq!(
            vec![(3, FeatureValue::Integer(0))],
            sorted(&fe.extract("", 1))
        );
        // A single character is both the initial and the final n-gram of order 2. As an
        // order-1 span it lies strictly inside the boundaries.
        assert_eq!(
            vec![
                (0, FeatureValue::Integer(1)),
                (1, FeatureValue::Integer(1)),
                (2, FeatureValue::Integer(1)),
                (3, FeatureValue::Integer(1)),
            ],
            sorted(&fe.extract("a", 1))
        );
        assert_eq!(
            vec![
                (0, FeatureValue::Integer(2)),
                (1, FeatureValue::Integer(1)),
                (2, FeatureValue::Integer(1)),
                (3, FeatureValue::Integer(2)),
            ],
            sorted(&fe.extract("aa", 1))
        );
    }

    #[test]
    fn test_extract_multibyte() {
        let fe = extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Length),
                FeatureRecord::new(1, FeatureKind::Initial("火".into())),
                FeatureRecord::new(2, FeatureKind::Match("星猫".into())),
                FeatureRecord::new(3, FeatureKind::Final("猫".into())),
            ],
            "",
        );

        assert_eq!(
            vec![
                (0, FeatureValue::Integer(3)),
                (1, FeatureValue::Integer(1)),
                (2, FeatureValue::Integer(1)),
                (3, FeatureValue::Integer(1)),
            ],
            sorted(&fe.extract("火星猫", 1))
        );
    }

    #[test]
    fn test_extract_without_ngrams() {
        let fe = extractor(
            vec![
                FeatureRecord::new(0, FeatureKind::Length),
                FeatureRecord::new(1, FeatureKind::Word("cat".into())),
            ],
            "",
        );

        assert_eq!(
            vec![(0, FeatureValue::Integer(3)), (1, FeatureValue::Integer(1))],
            sorted(&fe.extract("cat", 1))
        );
    }

    #[test]
    fn test_new_checks_vocabulary() {
        let vocab = Vocabulary::from_reader("<eps> 0\na 1\nb 2\n".as_bytes()).unwrap();
        let unigram = || {
            FeatureDictionary::from_records(vec![FeatureRecord::new(0, FeatureKind::Unigram {
                entropy: 1.0,
                scale: 1.0,
            })])
        };
        let probs = |data: &str| UnigramProbs::from_reader(data.as_bytes()).unwrap();

        assert!(FeatureExtractor::new(unigram(), probs("1 0.5\n2 0.5\n"), &vocab).is_ok());

        let r = FeatureExtractor::new(unigram(), probs("1 0.5\n"), &vocab);
        assert_eq!(
            "MissingProbabilityError: no unigram probability for word id 2",
            &r.err().unwrap().to_string()
        );

        // Probabilities are not needed without the unigram feature.
        let dict = FeatureDictionary::from_records(vec![FeatureRecord::new(0, FeatureKind::Length)]);
        assert!(FeatureExtractor::new(dict, probs("1 0.5\n"), &vocab).is_ok());
    }

    #[test]
    fn test_extract_all() {
        let fe = ngram_extractor();
        let vocab = Vocabulary::from_reader("cat 2\n<eps> 0\n</s> 1\n".as_bytes()).unwrap();
        let all = fe.extract_all(&vocab);

        assert_eq!(3, all.len());
        assert!(all[0].is_empty());
        assert_eq!(fe.extract("</s>", 1), all[1]);
        assert_eq!(fe.extract("cat", 2), all[2]);
    }

    #[cfg(feature = "multithreading")]
    #[test]
    fn test_extract_all_parallel() {
        let fe = ngram_extractor();
        let mut data = String::new();
        for i in 0..200 {
            data.push_str(&format!("w{}cat{} {}\n", i, i % 7, i));
        }
        let vocab = Vocabulary::from_reader(data.as_bytes()).unwrap();

        assert_eq!(fe.extract_all(&vocab), fe.extract_all_parallel(&vocab, 4).unwrap());
        assert_eq!(fe.extract_all(&vocab), fe.extract_all_parallel(&vocab, 0).unwrap());
    }

    #[cfg(feature = "multithreading")]
    #[test]
    fn test_thread_pool_error() {
        // The global pool can be initialized only once, so the second call fails.
        let _ = rayon::ThreadPoolBuilder::new().build_global();
        let e = rayon::ThreadPoolBuilder::new().build_global().unwrap_err();

        let e = crate::WordFeatsError::from(e);
        assert!(matches!(e, crate::WordFeatsError::ThreadPool(_)));
        assert!(e.to_string().starts_with("ThreadPoolError: "));
    }
}
