//! Model vocabulary handling.

use crate::constants::UTF8_BOM;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Ordered, deduplicated species vocabulary of a model.
///
/// Index `i` names the class at position `i` of the model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Build a label set by sorting and deduplicating a vocabulary.
    ///
    /// Sorting is byte-wise lexicographic, so the same vocabulary always
    /// yields the same sequence.
    pub fn from_vocabulary<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = vocabulary.into_iter().map(Into::into).collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    /// Load the label set from a labels file.
    ///
    /// # File Format
    /// - One label per line, in model class index order
    /// - Leading and trailing whitespace is trimmed
    /// - Blank lines are ignored
    ///
    /// # Errors
    /// - [`Error::LabelsFileNotFound`] if the file does not exist
    /// - [`Error::EmptyLabelSet`] if the file holds no labels
    /// - [`Error::LabelOrderMismatch`] if the file order is not already the
    ///   sorted, deduplicated order; zipping such a file against the model
    ///   output would mislabel every class after the first mismatch
    pub fn load(path: &Path) -> Result<Self> {
        let vocabulary = read_vocabulary(path)?;
        if vocabulary.is_empty() {
            return Err(Error::EmptyLabelSet {
                path: path.to_path_buf(),
            });
        }

        let label_set = Self::from_vocabulary(vocabulary.iter().cloned());
        if let Some((index, (expected, found))) = label_set
            .labels
            .iter()
            .zip(vocabulary.iter())
            .enumerate()
            .find(|(_, (expected, found))| expected != found)
        {
            return Err(Error::LabelOrderMismatch {
                path: path.to_path_buf(),
                index,
                expected: expected.clone(),
                found: found.clone(),
            });
        }

        if label_set.len() != vocabulary.len() {
            // Duplicates only: every prefix matched but the file is longer.
            let index = label_set.len();
            return Err(Error::LabelOrderMismatch {
                path: path.to_path_buf(),
                index,
                expected: "<end of labels>".to_string(),
                found: vocabulary[index].clone(),
            });
        }

        Ok(label_set)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set holds no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in class index order.
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    /// Iterate labels in class index order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.labels.iter()
    }

    /// Whether the set contains `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .is_ok()
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

/// Read raw vocabulary lines from a labels file.
fn read_vocabulary(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::LabelsFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = BufReader::new(file);
    let mut vocabulary = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let text = if index == 0 {
            line.trim_start_matches(UTF8_BOM)
        } else {
            line.as_str()
        };
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            vocabulary.push(trimmed.to_string());
        }
    }

    Ok(vocabulary)
}
