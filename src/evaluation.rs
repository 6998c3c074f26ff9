use std::{collections::BTreeMap, fmt::Display, iter::zip};

use serde::{Deserialize, Serialize};

/// A sentence whose predicted tags differ from the gold tags somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub tokens: Vec<String>,
    pub gold: Vec<String>,
    pub predicted: Vec<String>,
}

/// Label-wise performance values.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LabelMeasure {
    /// Number of correct predictions.
    pub num_correct: usize,
    /// Number of occurrences of the label in the gold-standard data.
    pub num_observation: usize,
    /// Number of predictions.
    pub num_prediction: usize,
}

impl LabelMeasure {
    pub fn precision(&self) -> f64 {
        ratio(self.num_correct, self.num_prediction)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.num_correct, self.num_observation)
    }

    pub fn fmeasure(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            p * r * 2.0 / (p + r)
        } else {
            0.0
        }
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d > 0 {
        n as f64 / d as f64
    } else {
        0.0
    }
}

/// Macro averages over the labels seen in the gold-standard data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// Accumulated comparison of predicted against gold tags.
#[derive(Debug, Default, Clone)]
pub struct Evaluation {
    tbl: BTreeMap<String, LabelMeasure>,
    /// Number of correctly predicted tokens.
    item_total_correct: usize,
    /// Total number of tokens.
    item_total_num: usize,
    /// Number of sentences predicted without error.
    inst_total_correct: usize,
    /// Total number of sentences.
    inst_total_num: usize,
    mismatches: Vec<Mismatch>,
}

impl Evaluation {
    /// Adds one sentence. Positions are compared pairwise; the gold length is
    /// what counts towards the total.
    pub fn accumulate(&mut self, tokens: &[String], reference: &[String], prediction: &[String]) {
        let mut matched = 0;
        for (r, p) in zip(reference, prediction) {
            self.tbl.entry(r.to_string()).or_default().num_observation += 1;
            self.tbl.entry(p.to_string()).or_default().num_prediction += 1;
            if r == p {
                self.tbl.entry(r.to_string()).or_default().num_correct += 1;
                matched += 1;
            }
        }
        self.item_total_correct += matched;
        self.item_total_num += reference.len();

        if reference == prediction {
            self.inst_total_correct += 1;
        } else {
            self.mismatches.push(Mismatch {
                tokens: tokens.to_vec(),
                gold: reference.to_vec(),
                predicted: prediction.to_vec(),
            });
        }
        self.inst_total_num += 1;
    }

    /// Micro-averaged token accuracy in [0, 1]; 0 when nothing was seen.
    pub fn accuracy(&self) -> f64 {
        ratio(self.item_total_correct, self.item_total_num)
    }

    /// Fraction of sentences tagged without any error.
    pub fn sentence_accuracy(&self) -> f64 {
        ratio(self.inst_total_correct, self.inst_total_num)
    }

    pub fn num_tokens(&self) -> usize {
        self.item_total_num
    }

    pub fn num_sentences(&self) -> usize {
        self.inst_total_num
    }

    pub fn label(&self, label: &str) -> Option<&LabelMeasure> {
        self.tbl.get(label)
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.mismatches
    }

    pub fn evaluate(&self) -> Estimation {
        let observed: Vec<&LabelMeasure> = self
            .tbl
            .values()
            .filter(|lev| lev.num_observation > 0)
            .collect();
        let n = observed.len().max(1) as f64;
        Estimation {
            precision: observed.iter().map(|lev| lev.precision()).sum::<f64>() / n,
            recall: observed.iter().map(|lev| lev.recall()).sum::<f64>() / n,
            fmeasure: observed.iter().map(|lev| lev.fmeasure()).sum::<f64>() / n,
        }
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        for (label, lev) in &self.tbl {
            if lev.num_observation == 0 {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) (******, ******, ******)",
                    label, lev.num_correct, lev.num_prediction, lev.num_observation
                )?;
            } else {
                writeln!(
                    f,
                    "\t{}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.num_correct,
                    lev.num_prediction,
                    lev.num_observation,
                    lev.precision(),
                    lev.recall(),
                    lev.fmeasure()
                )?;
            }
        }
        let est = self.evaluate();
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({:.4}, {:.4}, {:.4})",
            est.precision, est.recall, est.fmeasure
        )?;
        writeln!(
            f,
            "Item accuracy: {}/{} => {:.4}",
            self.item_total_correct,
            self.item_total_num,
            self.accuracy()
        )?;
        write!(
            f,
            "Sentence accuracy: {}/{} => {:.4}",
            self.inst_total_correct,
            self.inst_total_num,
            self.sentence_accuracy()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn perfect() {
        let mut ev = Evaluation::default();
        let gold = strings("AT NN VB");
        ev.accumulate(&strings("the dog runs"), &gold, &gold);
        assert_eq!(ev.accuracy(), 1.0);
        assert_eq!(ev.sentence_accuracy(), 1.0);
        assert!(ev.mismatches().is_empty());
    }

    #[test]
    fn all_wrong() {
        let mut ev = Evaluation::default();
        ev.accumulate(&strings("the dog"), &strings("AT NN"), &strings("NN AT"));
        assert_eq!(ev.accuracy(), 0.0);
        assert_eq!(ev.mismatches().len(), 1);
        assert_eq!(ev.mismatches()[0].predicted, ["NN", "AT"]);
    }

    #[test]
    fn micro_average() {
        let mut ev = Evaluation::default();
        ev.accumulate(&strings("a b c"), &strings("X Y Z"), &strings("X Y Y"));
        ev.accumulate(&strings("d"), &strings("X"), &strings("X"));
        assert_eq!(ev.accuracy(), 0.75);
        assert_eq!(ev.sentence_accuracy(), 0.5);
        assert_eq!(ev.num_tokens(), 4);
        let y = ev.label("Y").unwrap();
        assert_eq!((y.num_correct, y.num_prediction, y.num_observation), (1, 2, 1));
        assert_eq!(y.precision(), 0.5);
        assert_eq!(y.recall(), 1.0);
        let z = ev.label("Z").unwrap();
        assert_eq!(z.fmeasure(), 0.0);
        let est = ev.evaluate();
        assert!((est.recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty() {
        let ev = Evaluation::default();
        assert_eq!(ev.accuracy(), 0.0);
        assert_eq!(ev.evaluate().precision, 0.0);
        assert!(ev.to_string().contains("Item accuracy: 0/0"));
    }

    #[test]
    fn mismatches_serialize() {
        let mut ev = Evaluation::default();
        ev.accumulate(&strings("ski"), &strings("N"), &strings("V"));
        let s = serde_json::to_string(ev.mismatches()).unwrap();
        assert_eq!(s, r#"[{"tokens":["ski"],"gold":["N"],"predicted":["V"]}]"#);
    }
}
