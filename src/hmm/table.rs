//! Log-domain initial, transition and emission tables.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::quark::{Quark, StringTable, TextVectorizer};

/// Converts raw counts into add-k smoothed log probabilities.
///
/// Every entry becomes `ln((c + k) / (Σc + k·|V|))` where `|V|` is
/// `counts.len()`. Zero probabilities, which can only occur with `k = 0`, are
/// stored as negative infinity. A row without any mass (`Σc + k·|V| = 0`) is
/// negative infinity throughout.
pub fn smooth_log(counts: &[usize], k: f64) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    let denominator = total as f64 + k * counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            if denominator <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let prob = (c as f64 + k) / denominator;
            if prob > 0.0 {
                prob.ln()
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect()
}

/// Emission distribution of one tag.
///
/// Tokens the tag was never seen emitting are absent from `tokens`; their
/// mass lives in `unknown`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRow {
    tokens: HashMap<String, f64>,
    unknown: f64,
}

impl Default for EmissionRow {
    fn default() -> Self {
        Self {
            tokens: HashMap::new(),
            unknown: f64::NEG_INFINITY,
        }
    }
}

impl EmissionRow {
    pub(crate) fn new(tokens: HashMap<String, f64>, unknown: f64) -> Self {
        Self { tokens, unknown }
    }

    /// Log probability of a known token, `None` if the tag never emitted it.
    pub fn get(&self, token: &str) -> Option<f64> {
        self.tokens.get(token).copied()
    }

    /// Log probability of the reserved unknown-token entry.
    pub fn unknown(&self) -> f64 {
        self.unknown
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Immutable HMM parameters.
///
/// Tags are identified by dense ids in a fixed order. Initial and transition
/// scores are dense: an impossible event is stored as negative infinity, never
/// left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableRepr", into = "TableRepr")]
pub struct ProbabilityTable {
    tags: Quark,
    /// [L] vector, `init[i]` is the log probability of starting with #i.
    init: Vec<f64>,
    /// [L][L] matrix, `trans[L * i + j]` is the log probability of #i -> #j.
    trans: Vec<f64>,
    /// [L] emission rows.
    emission: Vec<EmissionRow>,
}

impl ProbabilityTable {
    pub(crate) fn from_parts(
        tags: Quark,
        init: Vec<f64>,
        trans: Vec<f64>,
        emission: Vec<EmissionRow>,
    ) -> Self {
        let n = tags.len();
        debug_assert_eq!(init.len(), n);
        debug_assert_eq!(trans.len(), n * n);
        debug_assert_eq!(emission.len(), n);
        Self {
            tags,
            init,
            trans,
            emission,
        }
    }

    /// Starts a table from hand-supplied log probabilities.
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    pub fn num_tags(&self) -> usize {
        self.tags.len()
    }

    pub fn tags(&self) -> &Quark {
        &self.tags
    }

    pub fn tag_id(&self, tag: &str) -> Option<usize> {
        self.tags.to_id(tag)
    }

    pub fn tag_str(&self, id: usize) -> Option<&str> {
        self.tags.to_str(id)
    }

    /// Initial log probability of tag #i, negative infinity out of range.
    pub fn init(&self, i: usize) -> f64 {
        self.init.get(i).copied().unwrap_or(f64::NEG_INFINITY)
    }

    /// Log probability of #j following #i, negative infinity out of range.
    pub fn transition(&self, i: usize, j: usize) -> f64 {
        let n = self.num_tags();
        if i >= n || j >= n {
            return f64::NEG_INFINITY;
        }
        self.trans[n * i + j]
    }

    pub fn emission_row(&self, i: usize) -> Option<&EmissionRow> {
        self.emission.get(i)
    }

    /// Log probability of tag #i emitting a token it was trained on.
    pub fn emission(&self, i: usize, token: &str) -> Option<f64> {
        self.emission.get(i).and_then(|row| row.get(token))
    }

    /// Unknown-token log probability of tag #i.
    pub fn unknown(&self, i: usize) -> f64 {
        self.emission
            .get(i)
            .map(EmissionRow::unknown)
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Whether any tag has `token` in its emission vocabulary.
    pub fn is_known(&self, token: &str) -> bool {
        self.emission.iter().any(|row| row.tokens.contains_key(token))
    }

    /// Sums of the exponentiated rows: the initial row first, then one
    /// transition row and one emission row (unknown entry included) per tag.
    pub fn row_mass(&self) -> Vec<f64> {
        let n = self.num_tags();
        let mut sums: Vec<f64> = Vec::with_capacity(2 * n + 1);
        sums.push(self.init.iter().map(|x| x.exp()).sum());
        for i in 0..n {
            sums.push(self.trans[n * i..n * (i + 1)].iter().map(|x| x.exp()).sum());
        }
        for row in &self.emission {
            sums.push(row.tokens.values().map(|x| x.exp()).sum::<f64>() + row.unknown.exp());
        }
        sums
    }
}

/// Builds a [`ProbabilityTable`] from explicit log probabilities.
///
/// Tags are numbered in order of first mention. Anything left unset is
/// negative infinity.
#[derive(Debug, Default)]
pub struct TableBuilder {
    tags: Quark,
    init: Vec<(usize, f64)>,
    trans: Vec<(usize, usize, f64)>,
    emission: Vec<(usize, String, f64)>,
    unknown: Vec<(usize, f64)>,
}

impl TableBuilder {
    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.find_or_insert(tag);
        self
    }

    pub fn init(mut self, tag: &str, log_prob: f64) -> Self {
        let i = self.tags.find_or_insert(tag);
        self.init.push((i, log_prob));
        self
    }

    pub fn transition(mut self, prev: &str, tag: &str, log_prob: f64) -> Self {
        let i = self.tags.find_or_insert(prev);
        let j = self.tags.find_or_insert(tag);
        self.trans.push((i, j, log_prob));
        self
    }

    pub fn emission(mut self, tag: &str, token: &str, log_prob: f64) -> Self {
        let i = self.tags.find_or_insert(tag);
        self.emission.push((i, token.to_string(), log_prob));
        self
    }

    pub fn unknown(mut self, tag: &str, log_prob: f64) -> Self {
        let i = self.tags.find_or_insert(tag);
        self.unknown.push((i, log_prob));
        self
    }

    pub fn build(self) -> ProbabilityTable {
        let n = self.tags.len();
        let mut init = vec![f64::NEG_INFINITY; n];
        for (i, lp) in self.init {
            init[i] = lp;
        }
        let mut trans = vec![f64::NEG_INFINITY; n * n];
        for (i, j, lp) in self.trans {
            trans[n * i + j] = lp;
        }
        let mut emission = vec![EmissionRow::default(); n];
        for (i, token, lp) in self.emission {
            emission[i].tokens.insert(token, lp);
        }
        for (i, lp) in self.unknown {
            emission[i].unknown = lp;
        }
        ProbabilityTable::from_parts(self.tags, init, trans, emission)
    }
}

/// JSON form of a table. `null` stands for negative infinity.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableRepr {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    init: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    transition: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    #[serde(default)]
    emission: BTreeMap<String, EmissionRepr>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EmissionRepr {
    #[serde(default)]
    tokens: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    unknown: Option<f64>,
}

fn to_repr(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

fn from_repr(x: Option<f64>) -> f64 {
    x.unwrap_or(f64::NEG_INFINITY)
}

impl From<ProbabilityTable> for TableRepr {
    fn from(value: ProbabilityTable) -> Self {
        let name = |i: usize| value.tags.to_str(i).unwrap_or_default().to_string();
        let n = value.num_tags();
        let mut repr = TableRepr {
            tags: value.tags.iter().map(str::to_string).collect(),
            ..Default::default()
        };
        for i in 0..n {
            repr.init.insert(name(i), to_repr(value.init[i]));
            let row = (0..n).map(|j| (name(j), to_repr(value.trans[n * i + j]))).collect();
            repr.transition.insert(name(i), row);
            let emission = &value.emission[i];
            repr.emission.insert(
                name(i),
                EmissionRepr {
                    tokens: emission.iter().map(|(k, v)| (k.to_string(), to_repr(v))).collect(),
                    unknown: to_repr(emission.unknown),
                },
            );
        }
        repr
    }
}

impl From<TableRepr> for ProbabilityTable {
    fn from(value: TableRepr) -> Self {
        let mut builder = value.tags.iter().fold(TableBuilder::default(), |b, tag| b.tag(tag));
        for tag in value.emission.keys().chain(value.init.keys()).chain(value.transition.keys()) {
            builder = builder.tag(tag);
        }
        for (tag, lp) in value.init {
            builder = builder.init(&tag, from_repr(lp));
        }
        for (prev, row) in value.transition {
            for (tag, lp) in row {
                builder = builder.transition(&prev, &tag, from_repr(lp));
            }
        }
        for (tag, row) in value.emission {
            for (token, lp) in row.tokens {
                builder = builder.emission(&tag, &token, from_repr(lp));
            }
            builder = builder.unknown(&tag, from_repr(row.unknown));
        }
        builder.build()
    }
}
