//! Most-frequent-tag baseline.

use std::collections::HashMap;

use crate::{
    quark::{Quark, StringTable, TextVectorizer},
    Dataset, Error, Result, Tagger,
};

#[derive(Debug)]
struct Lexicon {
    tags: Quark,
    token_to_tag: HashMap<String, usize>,
    /// Most frequent tag overall, for tokens never seen in training.
    default_tag: usize,
}

/// Tags each token with the tag it carried most often in training.
///
/// Ties go to the tag seen first. Unseen tokens get the most frequent tag of
/// the whole corpus.
#[derive(Debug, Default)]
pub struct BaselineTagger {
    lexicon: Option<Lexicon>,
}

impl BaselineTagger {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Id with the highest count, the lowest id winning ties.
fn most_common(counts: &HashMap<usize, usize>) -> Option<usize> {
    counts
        .iter()
        .max_by(|(ia, ca), (ib, cb)| ca.cmp(cb).then(ib.cmp(ia)))
        .map(|(&i, _)| i)
}

impl Tagger for BaselineTagger {
    fn train(&mut self, ds: &Dataset) {
        let mut tags = Quark::default();
        let mut tag_counts: HashMap<usize, usize> = HashMap::new();
        let mut token_tag_counts: HashMap<&str, HashMap<usize, usize>> = HashMap::new();
        for seq in ds {
            for (token, tag) in seq.pairs() {
                let id = tags.find_or_insert(tag);
                *tag_counts.entry(id).or_default() += 1;
                *token_tag_counts.entry(token).or_default().entry(id).or_default() += 1;
            }
        }

        let token_to_tag = token_tag_counts
            .iter()
            .filter_map(|(token, counts)| most_common(counts).map(|id| (token.to_string(), id)))
            .collect();
        self.lexicon = most_common(&tag_counts).map(|default_tag| Lexicon {
            tags,
            token_to_tag,
            default_tag,
        });
        match &self.lexicon {
            Some(lexicon) => log::info!(
                "baseline trained: {} tokens, default tag: {:?}",
                lexicon.token_to_tag.len(),
                lexicon.tags.to_str(lexicon.default_tag)
            ),
            None => log::warn!("baseline trained on an empty corpus"),
        }
    }

    fn is_trained(&self) -> bool {
        self.lexicon.is_some()
    }

    fn tag(&self, tokens: &[&str]) -> Result<Vec<String>> {
        let lexicon = self.lexicon.as_ref().ok_or(Error::NotTrained)?;
        tokens
            .iter()
            .map(|token| {
                let id = lexicon.token_to_tag.get(*token).copied().unwrap_or(lexicon.default_tag);
                lexicon
                    .tags
                    .to_str(id)
                    .map(str::to_string)
                    .ok_or_else(|| Error::InvalidModel(format!("tag id {id} out of range")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_frequent_tag() {
        let ds: Dataset = "the/AT run/NN ./PERIOD
they/PPSS run/VB ./PERIOD
we/PPSS run/VB home/NN"
            .parse()
            .unwrap();
        let mut tagger = BaselineTagger::new();
        assert!(matches!(tagger.tag(&["run"]), Err(Error::NotTrained)));
        tagger.train(&ds);
        assert_eq!(tagger.tag(&["run", "the", "home"]).unwrap(), ["VB", "AT", "NN"]);
        // NN and PPSS, VB and PERIOD all occur twice; NN was seen first
        assert_eq!(tagger.tag(&["xyzzy"]).unwrap(), ["NN"]);
    }

    #[test]
    fn ties_prefer_first_seen() {
        let ds: Dataset = "lead/NN lead/VB".parse().unwrap();
        let mut tagger = BaselineTagger::new();
        tagger.train(&ds);
        assert_eq!(tagger.tag(&["lead"]).unwrap(), ["NN"]);
    }

    #[test]
    fn empty_corpus_stays_untrained() {
        let mut tagger = BaselineTagger::new();
        tagger.train(&Dataset::default());
        assert!(!tagger.is_trained());
        assert!(matches!(tagger.evaluate(&Dataset::default()), Err(Error::NotTrained)));
    }
}
