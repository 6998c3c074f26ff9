use std::{
    convert::TryFrom,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

use crate::{Error, Result};

/// Separator between a token and its tag inside one corpus unit.
pub const TAG_SEPARATOR: char = '/';

/// One tagged sentence: tokens and their gold tags, position by position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

impl Sentence {
    pub fn push(&mut self, token: &str, tag: &str) {
        self.tokens.push(token.to_string());
        self.tags.push(tag.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.tags.clear();
    }

    /// (token, tag) pairs in sentence order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens
            .iter()
            .zip(&self.tags)
            .map(|(token, tag)| (token.as_str(), tag.as_str()))
    }

    pub fn token_refs(&self) -> Vec<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }

    /// Parses one corpus line of whitespace separated `token/tag` units.
    ///
    /// Units are split on the last separator so tokens may contain `/`
    /// themselves. Units without a separator, or with an empty side, are
    /// skipped with a warning.
    pub fn parse_line(line: &str) -> Self {
        let mut seq = Sentence::default();
        for unit in line.split_whitespace() {
            match unit.rsplit_once(TAG_SEPARATOR) {
                Some((token, tag)) if !token.is_empty() && !tag.is_empty() => seq.push(token, tag),
                _ => log::warn!("invalid unit: {unit}"),
            }
        }
        seq
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Sentence {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut seq = Sentence::default();
        for (token, tag) in iter {
            seq.push(token, tag);
        }
        seq
    }
}

/// An ordered collection of tagged sentences.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    pub seqs: Vec<Sentence>,
}

impl Dataset {
    /// Reads one sentence per line. Blank lines are ignored.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut ds = Dataset::default();
        for line in reader.lines() {
            ds.push_line(&line?);
        }
        Ok(ds)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let ds = Self::try_from(f)?;
        log::info!(
            "read {} sentences ({} tokens) from {}",
            ds.len(),
            ds.total_tokens(),
            path.as_ref().display()
        );
        Ok(ds)
    }

    fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let seq = Sentence::parse_line(line);
        if seq.is_empty() {
            log::warn!("invalid line: {line}");
        } else {
            self.seqs.push(seq);
        }
    }

    pub fn push(&mut self, seq: Sentence) {
        if !seq.is_empty() {
            self.seqs.push(seq);
        }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sentence> {
        self.seqs.iter()
    }

    pub fn max_length(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn total_tokens(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).sum()
    }
}

impl TryFrom<File> for Dataset {
    type Error = Error;

    fn try_from(value: File) -> Result<Self> {
        Self::read(BufReader::new(value))
    }
}

impl<'a> From<std::str::Lines<'a>> for Dataset {
    fn from(value: std::str::Lines<'a>) -> Self {
        let mut ds = Dataset::default();
        for line in value {
            ds.push_line(line);
        }
        ds
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::from(s.lines()))
    }
}

impl FromIterator<Sentence> for Dataset {
    fn from_iter<I: IntoIterator<Item = Sentence>>(iter: I) -> Self {
        let mut ds = Dataset::default();
        for seq in iter {
            ds.push(seq);
        }
        ds
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.seqs.iter()
    }
}
