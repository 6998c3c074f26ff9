use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::table::ProbabilityTable;
use crate::{Error, Result};

/// Trained HMM parameters: the probability table and the fallback tag for
/// unclassifiable unknown tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmModel {
    table: ProbabilityTable,
    #[serde(default)]
    fallback: Option<String>,
}

impl HmmModel {
    pub(crate) fn new(table: ProbabilityTable, fallback: Option<usize>) -> Self {
        let fallback = fallback.and_then(|i| table.tag_str(i)).map(str::to_string);
        Self { table, fallback }
    }

    /// Wraps injected parameters. No fallback tag is known for them.
    pub fn from_table(table: ProbabilityTable) -> Self {
        Self { table, fallback: None }
    }

    pub fn with_fallback(mut self, tag: &str) -> Result<Self> {
        if self.table.tag_id(tag).is_none() {
            return Err(Error::InvalidModel(format!("fallback tag {tag:?} is not in the tag set")));
        }
        self.fallback = Some(tag.to_string());
        Ok(self)
    }

    pub fn table(&self) -> &ProbabilityTable {
        &self.table
    }

    pub fn num_tags(&self) -> usize {
        self.table.num_tags()
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    pub(crate) fn fallback_id(&self) -> Option<usize> {
        self.fallback.as_deref().and_then(|tag| self.table.tag_id(tag))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let model: Self = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_memory(buffer: &[u8]) -> Result<Self> {
        Self::from_reader(buffer)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model = Self::from_reader(BufReader::new(File::open(path.as_ref())?))?;
        log::info!("loaded model with {} tags from {}", model.num_tags(), path.as_ref().display());
        Ok(model)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        self.to_writer(&mut w)?;
        w.flush()?;
        log::info!("wrote model to {}", path.as_ref().display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.table.num_tags() == 0 {
            return Err(Error::InvalidModel("no tags".into()));
        }
        if let Some(tag) = &self.fallback {
            if self.table.tag_id(tag).is_none() {
                return Err(Error::InvalidModel(format!(
                    "fallback tag {tag:?} is not in the tag set"
                )));
            }
        }
        Ok(())
    }
}
