use std::{collections::HashMap, time::Instant};

use serde::{Deserialize, Serialize};

use super::{
    model::HmmModel,
    table::{smooth_log, EmissionRow, ProbabilityTable},
};
use crate::{
    quark::{Quark, StringTable, TextVectorizer},
    Dataset, Error, Result,
};

/// Pseudo-tags the unknown-token heuristic routes each word shape to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeTags {
    pub adverb: String,
    pub verb: String,
    pub noun: String,
    pub proper_noun: String,
}

impl Default for ShapeTags {
    fn default() -> Self {
        Self {
            adverb: "ADV".into(),
            verb: "VERB".into(),
            noun: "NOUN".into(),
            proper_noun: "PROPN".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmmConfig {
    /// Add-k constant for initial and transition rows.
    pub k_transition: f64,
    /// Add-k constant for emission rows.
    pub k_emission: f64,
    /// Score unseen tokens through the word-shape heuristic.
    pub extension: bool,
    pub shape_tags: ShapeTags,
}

impl Default for HmmConfig {
    fn default() -> Self {
        Self {
            k_transition: 0.01,
            k_emission: 0.01,
            extension: false,
            shape_tags: ShapeTags::default(),
        }
    }
}

impl HmmConfig {
    /// Sets a parameter from its textual `name` and `value`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "k_transition" => self.k_transition = parse_k(name, value)?,
            "k_emission" => self.k_emission = parse_k(name, value)?,
            "extension" => {
                self.extension = value.parse().map_err(|_| {
                    Error::invalid_argument(name, format!("expected true or false, got {value:?}"))
                })?
            }
            "adverb" => self.shape_tags.adverb = value.to_string(),
            "verb" => self.shape_tags.verb = value.to_string(),
            "noun" => self.shape_tags.noun = value.to_string(),
            "proper_noun" => self.shape_tags.proper_noun = value.to_string(),
            _ => return Err(Error::invalid_argument(name, "unknown parameter")),
        }
        Ok(())
    }

    /// Applies a `name=value` parameter string.
    pub fn set_pair(&mut self, s: &str) -> Result<()> {
        match s.split_once('=') {
            Some((name, value)) => self.set(name.trim(), value.trim()),
            None => Err(Error::invalid_argument(s, "expected name=value")),
        }
    }
}

fn parse_k(name: &str, value: &str) -> Result<f64> {
    let k: f64 = value
        .parse()
        .map_err(|_| Error::invalid_argument(name, format!("not a number: {value:?}")))?;
    if !k.is_finite() || k < 0.0 {
        return Err(Error::invalid_argument(
            name,
            format!("must be a non-negative number, got {k}"),
        ));
    }
    Ok(k)
}

/// Raw frequencies gathered in one pass over the corpus.
#[derive(Debug, Default)]
struct Counts {
    tags: Quark,
    init: HashMap<usize, usize>,
    trans: HashMap<(usize, usize), usize>,
    emission: Vec<HashMap<String, usize>>,
}

impl Counts {
    fn collect(ds: &Dataset) -> Self {
        let mut counts = Counts::default();
        for seq in ds {
            let mut prev = None;
            for (token, tag) in seq.pairs() {
                let curr = counts.tags.find_or_insert(tag);
                if counts.emission.len() <= curr {
                    counts.emission.push(HashMap::new());
                }
                match prev {
                    None => *counts.init.entry(curr).or_default() += 1,
                    Some(p) => *counts.trans.entry((p, curr)).or_default() += 1,
                }
                *counts.emission[curr].entry(token.to_string()).or_default() += 1;
                prev = Some(curr);
            }
        }
        counts
    }

    fn num_tags(&self) -> usize {
        self.tags.len()
    }

    /// The tag with the most tokens seen exactly once, the earliest tag
    /// winning ties. `None` if no token occurs only once.
    fn fallback(&self) -> Option<usize> {
        let mut best = None;
        let mut best_count = 0;
        for (i, row) in self.emission.iter().enumerate() {
            let singletons = row.values().filter(|&&c| c == 1).count();
            if singletons > best_count {
                best = Some(i);
                best_count = singletons;
            }
        }
        best
    }

    fn smooth(&self, k_transition: f64, k_emission: f64) -> ProbabilityTable {
        let n = self.num_tags();

        let init_counts: Vec<usize> = (0..n)
            .map(|i| self.init.get(&i).copied().unwrap_or(0))
            .collect();
        let init = smooth_log(&init_counts, k_transition);

        let mut trans = Vec::with_capacity(n * n);
        for i in 0..n {
            let row: Vec<usize> = (0..n)
                .map(|j| self.trans.get(&(i, j)).copied().unwrap_or(0))
                .collect();
            trans.extend(smooth_log(&row, k_transition));
        }

        let emission = self
            .emission
            .iter()
            .map(|row| {
                let tokens: Vec<&String> = row.keys().collect();
                // the unknown-token entry is the last, never observed, column
                let mut freqs: Vec<usize> = tokens.iter().map(|t| row[*t]).collect();
                freqs.push(0);
                let mut lp = smooth_log(&freqs, k_emission);
                let unknown = lp.pop().unwrap_or(f64::NEG_INFINITY);
                EmissionRow::new(tokens.into_iter().cloned().zip(lp).collect(), unknown)
            })
            .collect();

        ProbabilityTable::from_parts(self.tags.clone(), init, trans, emission)
    }
}

/// Estimates HMM parameters from a tagged corpus.
pub fn train(ds: &Dataset, config: &HmmConfig) -> HmmModel {
    let begin = Instant::now();
    let counts = Counts::collect(ds);
    let table = counts.smooth(config.k_transition, config.k_emission);
    let fallback = counts.fallback();
    log::info!(
        "trained on {} sentences ({} tokens): {} tags, k: {}/{}, fallback: {:?}, time cost: {:?}",
        ds.len(),
        ds.total_tokens(),
        table.num_tags(),
        config.k_transition,
        config.k_emission,
        fallback.and_then(|i| counts.tags.to_str(i)),
        begin.elapsed()
    );
    HmmModel::new(table, fallback)
}
