//! Hidden Markov Model part-of-speech tagging.
//!
//! The crate trains add-k smoothed initial, transition and emission tables
//! from a corpus of `token/tag` sentences and decodes new sentences with exact
//! Viterbi search in the log domain. A most-frequent-tag baseline shares the
//! same [`Tagger`] capability so both can be evaluated side by side.
//!
//! ```
//! use hmmtag::{Dataset, HmmConfig, HmmTagger, Tagger};
//!
//! let ds: Dataset = "the/AT dog/NN runs/VB\nthe/AT cat/NN sleeps/VB".parse().unwrap();
//! let mut tagger = HmmTagger::new(HmmConfig::default());
//! tagger.train(&ds);
//! assert_eq!(tagger.tag(&["the", "cat", "runs"]).unwrap(), ["AT", "NN", "VB"]);
//! ```

pub mod baseline;
pub mod dataset;
pub mod evaluation;
pub mod hmm;
pub mod quark;
pub mod tagger;

pub use baseline::BaselineTagger;
pub use dataset::{Dataset, Sentence};
pub use evaluation::{Evaluation, Mismatch};
pub use hmm::{
    context::{Path, Trellis},
    model::HmmModel,
    table::{ProbabilityTable, TableBuilder},
    tagger::HmmTagger,
    trainer::{HmmConfig, ShapeTags},
    unknown::{UnknownPolicy, WordShape},
};
pub use tagger::Tagger;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tagger was asked to decode before training or parameter injection.
    #[error("must train before predicting")]
    NotTrained,
    #[error("cannot tag an empty sequence")]
    EmptySequence,
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid argument `{name}`: {msg}")]
    InvalidArgument { name: String, msg: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_argument<S: Into<String>>(name: &str, msg: S) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            msg: msg.into(),
        }
    }
}
