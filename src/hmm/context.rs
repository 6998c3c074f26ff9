//! Viterbi trellis.

use super::{table::ProbabilityTable, unknown::UnknownPolicy};
use crate::{Error, Result};

/// Best tag sequence found for one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub tags: Vec<String>,
    /// Joint log probability of the tokens and `tags`.
    pub score: f64,
    /// Number of trellis score updates the decode performed.
    pub updates: usize,
}

/// Per-sentence dynamic programming tables.
///
/// A trellis is owned by a single decode; the probability table it reads is
/// shared and never written.
#[derive(Debug, Default)]
pub struct Trellis {
    /// The total number of distinct tags (L).
    num_labels: usize,
    /// The number of items (T) in the sentence.
    num_items: usize,
    /// The number of items the buffers are sized for.
    cap_items: usize,
    /// Emission scores.
    /// This is a [T][L] matrix whose element [t][l] is the log probability
    /// of tag #l emitting the token at #t.
    state: Vec<f64>,
    /// Best path scores.
    /// This is a [T][L] matrix whose element [t][l] is the score of the best
    /// path ending in tag #l at #t.
    score: Vec<f64>,
    /// Backward edges.
    /// This is a [T][L] matrix whose element [t][j] is the tag #i at t-1 on
    /// the best path arriving at (t, j). Row 0 is unused.
    backward_edge: Vec<usize>,
    updates: usize,
}

impl Trellis {
    pub fn new(num_labels: usize, num_items: usize) -> Self {
        let mut this = Self {
            num_labels,
            ..Default::default()
        };
        this.set_num_items(num_items);
        this
    }

    pub fn set_num_items(&mut self, num_items: usize) {
        let size = self.num_labels * num_items;
        self.num_items = num_items;
        if self.cap_items < num_items {
            self.state.resize(size, 0.0);
            self.score.resize(size, 0.0);
            self.backward_edge.resize(size, 0);
            self.cap_items = num_items;
        }
        self.updates = 0;
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Fills the emission scores for `tokens`, resizing to fit them.
    pub fn set_tokens(
        &mut self,
        table: &ProbabilityTable,
        policy: &UnknownPolicy,
        tokens: &[&str],
    ) {
        self.set_num_items(tokens.len());
        let l = self.num_labels;
        for (t, token) in tokens.iter().enumerate() {
            policy.emission_scores(table, token, &mut self.state[l * t..l * (t + 1)]);
        }
    }

    /// Best path score ending in tag #l at #t.
    pub fn score(&self, l: usize, t: usize) -> f64 {
        self.score[self.num_labels * t + l]
    }

    /// Predecessor of tag #l at #t on its best path; `None` at #0.
    pub fn backpointer(&self, l: usize, t: usize) -> Option<usize> {
        if t == 0 {
            None
        } else {
            Some(self.backward_edge[self.num_labels * t + l])
        }
    }

    /// Score updates done by the last [`Trellis::viterbi`] call.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Fills `labels` with the best tag ids and returns the path score.
    ///
    /// Candidates are visited in tag id order and only a strictly better
    /// score replaces the current best, so ties resolve to the lowest id.
    /// `labels` must hold exactly one slot per item.
    pub fn viterbi(&mut self, table: &ProbabilityTable, labels: &mut [usize]) -> Result<f64> {
        let n = self.num_items;
        let l = self.num_labels;
        if n == 0 {
            return Err(Error::EmptySequence);
        }
        if l == 0 {
            return Err(Error::InvalidModel("no tags".into()));
        }
        if labels.len() != n {
            return Err(Error::invalid_argument(
                "labels",
                format!("expected {n} slots, got {}", labels.len()),
            ));
        }
        self.updates = 0;

        /* Compute the scores at (0, *). */
        for j in 0..l {
            self.score[j] = table.init(j) + self.state[j];
            self.updates += 1;
        }

        /* Compute the scores at (t, *). */
        for t in 1..n {
            for j in 0..l {
                let mut max_score = f64::NEG_INFINITY;
                let mut argmax = 0;
                for i in 0..l {
                    /* Transit from (t-1, i) to (t, j). */
                    let score = self.score[l * (t - 1) + i] + table.transition(i, j);
                    self.updates += 1;
                    if score > max_score {
                        max_score = score;
                        argmax = i;
                    }
                }
                self.backward_edge[l * t + j] = argmax;
                self.score[l * t + j] = max_score + self.state[l * t + j];
            }
        }

        /* Find the tag at #T-1 with the maximum score. */
        let mut max_score = f64::NEG_INFINITY;
        labels[n - 1] = 0;
        for i in 0..l {
            let score = self.score[l * (n - 1) + i];
            if score > max_score {
                max_score = score;
                labels[n - 1] = i;
            }
        }

        /* Tag labels by tracing the backward links. */
        for t in (0..n - 1).rev() {
            labels[t] = self.backward_edge[l * (t + 1) + labels[t + 1]];
        }
        Ok(max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ProbabilityTable {
        ProbabilityTable::builder()
            .init("A", -1.0)
            .init("B", -2.0)
            .transition("A", "A", -3.0)
            .transition("A", "B", -0.5)
            .transition("B", "A", -0.5)
            .transition("B", "B", -3.0)
            .emission("A", "x", -1.0)
            .emission("B", "x", -1.0)
            .emission("A", "y", -2.0)
            .emission("B", "y", -1.0)
            .build()
    }

    #[test]
    fn init() {
        let trellis = Trellis::new(9, 12);
        assert_eq!(trellis.num_items(), 12);
        assert_eq!(trellis.cap_items, 12);
        assert_eq!(trellis.state.len(), 9 * 12);
    }

    #[test]
    fn resize_keeps_capacity() {
        let mut trellis = Trellis::new(3, 8);
        trellis.set_num_items(2);
        assert_eq!(trellis.num_items(), 2);
        assert_eq!(trellis.cap_items, 8);
        trellis.set_num_items(10);
        assert_eq!(trellis.score.len(), 30);
    }

    #[test]
    fn alternating_path() {
        let table = table();
        let mut trellis = Trellis::new(table.num_tags(), 0);
        trellis.set_tokens(&table, &UnknownPolicy::Reserved, &["x", "y", "x"]);
        let mut labels = vec![0; 3];
        let score = trellis.viterbi(&table, &mut labels).unwrap();
        // A B A: -1 -1 | -0.5 -1 | -0.5 -1
        assert_eq!(labels, [0, 1, 0]);
        assert!((score + 5.0).abs() < 1e-12);
        assert_eq!(trellis.backpointer(0, 0), None);
        assert_eq!(trellis.backpointer(0, 2), Some(1));
        assert!((trellis.score(1, 1) + 3.5).abs() < 1e-12);
        assert_eq!(trellis.updates(), 2 + 2 * 4);
    }

    #[test]
    fn ties_pick_first_tag() {
        let table = ProbabilityTable::builder()
            .init("P", -1.0)
            .init("Q", -1.0)
            .emission("P", "z", -1.0)
            .emission("Q", "z", -1.0)
            .build();
        let mut trellis = Trellis::new(2, 1);
        trellis.set_tokens(&table, &UnknownPolicy::Reserved, &["z"]);
        let mut labels = vec![9];
        trellis.viterbi(&table, &mut labels).unwrap();
        assert_eq!(labels, [0]);
    }

    #[test]
    fn bad_shapes_are_errors() {
        let table = table();
        let mut trellis = Trellis::new(1, 0);
        trellis.set_tokens(&table, &UnknownPolicy::Reserved, &[]);
        assert!(matches!(trellis.viterbi(&table, &mut []), Err(Error::EmptySequence)));

        let mut trellis = Trellis::new(0, 0);
        trellis.set_tokens(&table, &UnknownPolicy::Reserved, &["x"]);
        assert!(matches!(trellis.viterbi(&table, &mut [0]), Err(Error::InvalidModel(_))));

        let mut trellis = Trellis::new(table.num_tags(), 0);
        trellis.set_tokens(&table, &UnknownPolicy::Reserved, &["x", "y"]);
        let mut labels = vec![0; 3];
        assert!(matches!(
            trellis.viterbi(&table, &mut labels),
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(trellis.updates(), 0);
    }

    #[test]
    fn impossible_everywhere() {
        let table = table();
        let mut trellis = Trellis::new(2, 2);
        trellis.set_tokens(&table, &UnknownPolicy::Reserved, &["w", "w"]);
        let mut labels = vec![7, 7];
        let score = trellis.viterbi(&table, &mut labels).unwrap();
        assert_eq!(score, f64::NEG_INFINITY);
        assert_eq!(labels, [0, 0]);
    }
}
