use super::{
    context::{Path, Trellis},
    model::HmmModel,
    table::ProbabilityTable,
    trainer::{self, HmmConfig},
    unknown::UnknownPolicy,
};
use crate::{Dataset, Error, Result, Tagger};

#[derive(Debug)]
enum State {
    Untrained,
    Trained { model: HmmModel, policy: UnknownPolicy },
}

/// Part-of-speech tagger backed by a first-order HMM.
///
/// Starts untrained; [`Tagger::train`] or one of the injecting constructors
/// makes it ready to decode.
#[derive(Debug)]
pub struct HmmTagger {
    config: HmmConfig,
    state: State,
}

impl HmmTagger {
    pub fn new(config: HmmConfig) -> Self {
        Self {
            config,
            state: State::Untrained,
        }
    }

    /// A tagger using injected parameters instead of training.
    pub fn with_model(config: HmmConfig, model: HmmModel) -> Self {
        let mut this = Self::new(config);
        this.set_model(model);
        this
    }

    /// A tagger decoding with a hand-built table and default settings.
    pub fn from_table(table: ProbabilityTable) -> Self {
        Self::with_model(HmmConfig::default(), HmmModel::from_table(table))
    }

    fn set_model(&mut self, model: HmmModel) {
        let policy = if self.config.extension {
            UnknownPolicy::morphology(model.table(), &self.config.shape_tags, model.fallback_id())
        } else {
            UnknownPolicy::Reserved
        };
        self.state = State::Trained { model, policy };
    }

    pub fn config(&self) -> &HmmConfig {
        &self.config
    }

    pub fn model(&self) -> Result<&HmmModel> {
        match &self.state {
            State::Trained { model, .. } => Ok(model),
            State::Untrained => Err(Error::NotTrained),
        }
    }

    pub fn policy(&self) -> Result<&UnknownPolicy> {
        match &self.state {
            State::Trained { policy, .. } => Ok(policy),
            State::Untrained => Err(Error::NotTrained),
        }
    }

    /// Finds the most likely tag sequence for `tokens`.
    pub fn decode(&self, tokens: &[&str]) -> Result<Path> {
        let (model, policy) = match &self.state {
            State::Trained { model, policy } => (model, policy),
            State::Untrained => return Err(Error::NotTrained),
        };
        if tokens.is_empty() {
            return Err(Error::EmptySequence);
        }
        let table = model.table();
        if table.num_tags() == 0 {
            return Err(Error::InvalidModel("no tags".into()));
        }

        let mut trellis = Trellis::new(table.num_tags(), tokens.len());
        trellis.set_tokens(table, policy, tokens);
        let mut labels = vec![0; tokens.len()];
        let score = trellis.viterbi(table, &mut labels)?;
        log::debug!(
            "decoded {} tokens ({} unknown), score: {score}, updates: {}",
            tokens.len(),
            tokens.iter().filter(|t| !table.is_known(t)).count(),
            trellis.updates()
        );

        let tags = labels
            .iter()
            .map(|&i| table.tag_str(i).map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidModel("tag id out of range".into()))?;
        Ok(Path {
            tags,
            score,
            updates: trellis.updates(),
        })
    }
}

impl Tagger for HmmTagger {
    fn train(&mut self, ds: &Dataset) {
        let model = trainer::train(ds, &self.config);
        if model.num_tags() == 0 {
            log::warn!("no tagged tokens in the training corpus, tagger left untrained");
            self.state = State::Untrained;
            return;
        }
        self.set_model(model);
    }

    fn is_trained(&self) -> bool {
        matches!(self.state, State::Trained { .. })
    }

    fn tag(&self, tokens: &[&str]) -> Result<Vec<String>> {
        self.decode(tokens).map(|path| path.tags)
    }
}
