use crate::{Dataset, Error, Evaluation, Result};

/// Shared capability of the tagger variants.
pub trait Tagger {
    /// Learns parameters from a tagged corpus, replacing any previous ones.
    fn train(&mut self, ds: &Dataset);

    fn is_trained(&self) -> bool;

    /// Predicts one tag per token.
    fn tag(&self, tokens: &[&str]) -> Result<Vec<String>>;

    /// Tags every sentence of a held-out corpus and compares against its gold
    /// tags.
    fn evaluate(&self, ds: &Dataset) -> Result<Evaluation> {
        if !self.is_trained() {
            return Err(Error::NotTrained);
        }
        let mut evaluation = Evaluation::default();
        for seq in ds {
            let prediction = self.tag(&seq.token_refs())?;
            evaluation.accumulate(&seq.tokens, &seq.tags, &prediction);
        }
        log::info!(
            "evaluated {} sentences: accuracy {:.4}, {} with mismatches",
            evaluation.num_sentences(),
            evaluation.accuracy(),
            evaluation.mismatches().len()
        );
        Ok(evaluation)
    }
}
