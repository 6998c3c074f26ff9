//! Emission scores for tokens outside a tag's training vocabulary.

use super::{table::ProbabilityTable, trainer::ShapeTags};

/// Coarse shape class of a token, used to guess the tag of unseen words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordShape {
    /// Ends in "ly".
    Adverb,
    /// Ends in "ing" or "ed".
    Verb,
    /// Starts with an uppercase letter.
    Noun,
    /// Entirely uppercase.
    ProperNoun,
    Other,
}

impl WordShape {
    /// Classifies `token` by its suffix and case.
    ///
    /// Suffixes are matched case-insensitively and win over case. An
    /// all-uppercase token is checked before a capitalised one, since every
    /// all-uppercase token is also capitalised.
    pub fn classify(token: &str) -> Self {
        let lower = token.to_lowercase();
        if lower.ends_with("ly") {
            Self::Adverb
        } else if lower.ends_with("ing") || lower.ends_with("ed") {
            Self::Verb
        } else if is_all_uppercase(token) {
            Self::ProperNoun
        } else if token.chars().next().map_or(false, char::is_uppercase) {
            Self::Noun
        } else {
            Self::Other
        }
    }
}

/// At least one cased character and no lowercase ones.
fn is_all_uppercase(token: &str) -> bool {
    token.chars().any(char::is_uppercase) && !token.chars().any(char::is_lowercase)
}

/// How a tag scores a token it never emitted in training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Use the scored tag's own unknown-token entry.
    Reserved,
    /// Use the unknown-token entry of a pseudo-tag picked by [`WordShape`].
    ///
    /// The pseudo-tag only supplies the score; the tag being scored is not
    /// replaced by it. Tag ids that are `None` were not in the trained
    /// alphabet.
    Morphology {
        adverb: Option<usize>,
        verb: Option<usize>,
        noun: Option<usize>,
        proper_noun: Option<usize>,
        fallback: Option<usize>,
    },
}

impl UnknownPolicy {
    /// Resolves pseudo-tag names against the tags of `table`.
    pub fn morphology(
        table: &ProbabilityTable,
        shapes: &ShapeTags,
        fallback: Option<usize>,
    ) -> Self {
        Self::Morphology {
            adverb: table.tag_id(&shapes.adverb),
            verb: table.tag_id(&shapes.verb),
            noun: table.tag_id(&shapes.noun),
            proper_noun: table.tag_id(&shapes.proper_noun),
            fallback,
        }
    }

    /// The tag whose unknown-token entry scores `token`, or `None` when each
    /// scored tag should use its own.
    ///
    /// A shape whose pseudo-tag is missing from the alphabet uses the
    /// fallback tag instead.
    pub fn pseudo_tag(&self, token: &str) -> Option<usize> {
        match self {
            Self::Reserved => None,
            Self::Morphology {
                adverb,
                verb,
                noun,
                proper_noun,
                fallback,
            } => {
                let shaped = match WordShape::classify(token) {
                    WordShape::Adverb => *adverb,
                    WordShape::Verb => *verb,
                    WordShape::Noun => *noun,
                    WordShape::ProperNoun => *proper_noun,
                    WordShape::Other => None,
                };
                shaped.or(*fallback)
            }
        }
    }

    /// Emission log probability of `token` under tag #tag.
    pub fn resolve_emission(&self, table: &ProbabilityTable, tag: usize, token: &str) -> f64 {
        self.resolve_with(table, tag, token, self.pseudo_tag(token))
    }

    /// Fills `out[j]` with the emission score of `token` under every tag #j.
    pub fn emission_scores(&self, table: &ProbabilityTable, token: &str, out: &mut [f64]) {
        let pseudo = self.pseudo_tag(token);
        for (j, score) in out.iter_mut().enumerate() {
            *score = self.resolve_with(table, j, token, pseudo);
        }
    }

    fn resolve_with(
        &self,
        table: &ProbabilityTable,
        tag: usize,
        token: &str,
        pseudo: Option<usize>,
    ) -> f64 {
        match table.emission(tag, token) {
            Some(lp) => lp,
            None => table.unknown(pseudo.unwrap_or(tag)),
        }
    }
}
