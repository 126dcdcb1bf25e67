//! Definition of errors.

use std::error::Error;
use std::fmt;

/// A specialized Result type for Wordfeats.
pub type Result<T, E = WordFeatsError> = std::result::Result<T, E>;

/// The error type for Wordfeats.
///
/// Every variant except [`WordFeatsError::ThreadPool`] is raised while loading inputs.
/// Extraction of a single word never fails.
#[derive(Debug)]
pub enum WordFeatsError {
    /// The error variant for [`DuplicateWordError`].
    DuplicateWord(DuplicateWordError),

    /// The error variant for [`NonContiguousIdError`].
    NonContiguousId(NonContiguousIdError),

    /// The error variant for [`MissingProbabilityError`].
    MissingProbability(MissingProbabilityError),

    /// The error variant for [`UnrecognizedFeatureTypeError`].
    UnrecognizedFeatureType(UnrecognizedFeatureTypeError),

    /// The error variant for [`MalformedRecordError`].
    MalformedRecord(MalformedRecordError),

    /// The error variant for [`std::io::Error`].
    IOError(std::io::Error),

    /// The error variant for [`rayon::ThreadPoolBuildError`].
    #[cfg(feature = "multithreading")]
    #[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl WordFeatsError {
    pub(crate) fn duplicate_word<S>(word: S) -> Self
    where
        S: Into<String>,
    {
        Self::DuplicateWord(DuplicateWordError { word: word.into() })
    }

    pub(crate) fn non_contiguous_id<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::NonContiguousId(NonContiguousIdError { msg: msg.into() })
    }

    pub(crate) const fn missing_probability(id: usize) -> Self {
        Self::MissingProbability(MissingProbabilityError { id })
    }

    pub(crate) fn unrecognized_feature_type<S>(feature_type: S) -> Self
    where
        S: Into<String>,
    {
        Self::UnrecognizedFeatureType(UnrecognizedFeatureTypeError {
            feature_type: feature_type.into(),
        })
    }

    pub(crate) fn malformed_record<S>(source: &'static str, line: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::MalformedRecord(MalformedRecordError {
            source,
            line,
            msg: msg.into(),
        })
    }
}

impl fmt::Display for WordFeatsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DuplicateWord(e) => e.fmt(f),
            Self::NonContiguousId(e) => e.fmt(f),
            Self::MissingProbability(e) => e.fmt(f),
            Self::UnrecognizedFeatureType(e) => e.fmt(f),
            Self::MalformedRecord(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
            #[cfg(feature = "multithreading")]
            Self::ThreadPool(e) => write!(f, "ThreadPoolError: {}", e),
        }
    }
}

impl Error for WordFeatsError {}

/// Error used when a word appears twice in the vocabulary.
#[derive(Debug)]
pub struct DuplicateWordError {
    /// The repeated word.
    pub(crate) word: String,
}

impl fmt::Display for DuplicateWordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DuplicateWordError: duplicated word in vocab: {}", self.word)
    }
}

impl Error for DuplicateWordError {}

/// Error used when the vocabulary ids are not exactly `0..N`.
#[derive(Debug)]
pub struct NonContiguousIdError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for NonContiguousIdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NonContiguousIdError: {}", self.msg)
    }
}

impl Error for NonContiguousIdError {}

/// Error used when a word id has no unigram probability.
#[derive(Debug)]
pub struct MissingProbabilityError {
    /// The word id without a probability.
    pub(crate) id: usize,
}

impl fmt::Display for MissingProbabilityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MissingProbabilityError: no unigram probability for word id {}",
            self.id
        )
    }
}

impl Error for MissingProbabilityError {}

/// Error used when the feature dictionary contains an unknown feature type.
#[derive(Debug)]
pub struct UnrecognizedFeatureTypeError {
    /// The unknown type token.
    pub(crate) feature_type: String,
}

impl fmt::Display for UnrecognizedFeatureTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "UnrecognizedFeatureTypeError: error feature type: {}",
            self.feature_type
        )
    }
}

impl Error for UnrecognizedFeatureTypeError {}

/// Error used when an input line has the wrong shape.
#[derive(Debug)]
pub struct MalformedRecordError {
    /// Name of the input.
    pub(crate) source: &'static str,

    /// 1-based line number, or 0 if unknown.
    pub(crate) line: usize,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for MalformedRecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            write!(f, "MalformedRecordError: {}: {}", self.source, self.msg)
        } else {
            write!(
                f,
                "MalformedRecordError: {}:{}: {}",
                self.source, self.line, self.msg
            )
        }
    }
}

impl Error for MalformedRecordError {}

impl From<std::io::Error> for WordFeatsError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}

#[cfg(feature = "multithreading")]
impl From<rayon::ThreadPoolBuildError> for WordFeatsError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(error)
    }
}
