//! Label interning for GFF writing
//!
//! Each distinct field label is stored once; fields refer to it by index.

use indexmap::IndexSet;

use super::document::Label;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: IndexSet<String>,
}

impl LabelTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label to the table, returning its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidLabel`] if the label does not fit a
    /// 16-byte ASCII record.
    pub fn intern(&mut self, label: &str) -> Result<u32> {
        if let Some(index) = self.labels.get_index_of(label) {
            return Ok(index as u32);
        }
        Label::new(label)?;
        let (index, _) = self.labels.insert_full(label.to_string());
        Ok(index as u32)
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<&str> {
        self.labels.get_index(index as usize).map(String::as_str)
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<u32> {
        self.labels.get_index_of(label).map(|i| i as u32)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label records in index order.
    pub fn into_labels(self) -> Result<Vec<Label>> {
        self.labels.iter().map(|l| Label::new(l)).collect()
    }
}
