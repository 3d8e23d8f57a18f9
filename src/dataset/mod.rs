//! Item collections handed to the herding selector.
//!
//! A [`Dataset`] is an ordered collection of numeric items, one row of an
//! [`Array2`] per item, with optional attribute names. The selector only
//! ever addresses items by index; kernels read the rows.
//!
//! # Formats
//!
//! Two on-disk layouts are accepted:
//!
//! - JSON, either a bare array of rows (`[[1.0, 2.0], [3.0, 4.0]]`) or an
//!   object with attribute names (`{"attributes": ["x", "y"], "rows": [...]}`)
//! - JSON Lines, one row array per line (files ending in `.jsonl`)
//!
//! Datasets are always written back in the object form.

pub mod synth;

use std::fs;
use std::path::Path;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

pub use synth::BlobGenerator;

/// An ordered collection of numeric items.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// One row per item.
    rows: Array2<f64>,

    /// Optional attribute (column) names.
    attributes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Rows(Vec<Vec<f64>>),
    Named {
        #[serde(default)]
        attributes: Option<Vec<String>>,
        rows: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Serialize)]
struct DatasetFileOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a [String]>,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Wraps an existing matrix, one item per row.
    pub fn new(rows: Array2<f64>) -> Self {
        Self {
            rows,
            attributes: None,
        }
    }

    /// Builds a dataset from row vectors.
    ///
    /// An empty input yields an empty dataset of width zero; rows of
    /// differing lengths are rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DatasetError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(DatasetError::Ragged {
                    row,
                    expected: width,
                    actual: values.len(),
                });
            }
        }

        let n = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let rows = Array2::from_shape_vec((n, width), flat)?;
        Ok(Self::new(rows))
    }

    /// Attaches attribute names; their count must match the row width.
    pub fn with_attributes(mut self, attributes: Vec<String>) -> Result<Self, DatasetError> {
        if !self.is_empty() && attributes.len() != self.width() {
            return Err(DatasetError::AttributeMismatch {
                attributes: attributes.len(),
                width: self.width(),
            });
        }
        self.attributes = Some(attributes);
        Ok(self)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    /// Returns true when the dataset holds no items.
    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    /// Number of values per item.
    pub fn width(&self) -> usize {
        self.rows.ncols()
    }

    /// Attribute names, if any.
    pub fn attributes(&self) -> Option<&[String]> {
        self.attributes.as_deref()
    }

    /// The item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn item(&self, index: usize) -> ArrayView1<'_, f64> {
        self.rows.row(index)
    }

    /// The underlying matrix.
    pub fn rows(&self) -> &Array2<f64> {
        &self.rows
    }

    /// Restricts the dataset to `indices`, keeping their order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            rows: self.rows.select(Axis(0), indices),
            attributes: self.attributes.clone(),
        }
    }

    /// Parses a dataset from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, DatasetError> {
        match serde_json::from_str::<DatasetFile>(text)? {
            DatasetFile::Rows(rows) => Self::from_rows(rows),
            DatasetFile::Named { attributes, rows } => {
                let dataset = Self::from_rows(rows)?;
                match attributes {
                    Some(attributes) => dataset.with_attributes(attributes),
                    None => Ok(dataset),
                }
            }
        }
    }

    /// Parses a dataset from JSON Lines text, one row array per line.
    ///
    /// Blank lines are skipped.
    pub fn from_jsonl_str(text: &str) -> Result<Self, DatasetError> {
        let mut rows = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row: Vec<f64> =
                serde_json::from_str(line).map_err(|e| DatasetError::InvalidLine {
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Loads a dataset from disk, choosing the format from the extension.
    ///
    /// A file without any rows is rejected.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let text = fs::read_to_string(path)?;
        let is_jsonl = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
            .unwrap_or(false);

        let dataset = if is_jsonl {
            Self::from_jsonl_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        if dataset.is_empty() {
            return Err(DatasetError::Empty);
        }

        tracing::debug!(
            path = %path.display(),
            items = dataset.len(),
            width = dataset.width(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Serializes the dataset as pretty JSON in the object form.
    pub fn to_json_string(&self) -> Result<String, DatasetError> {
        let out = DatasetFileOut {
            attributes: self.attributes(),
            rows: self.rows.outer_iter().map(|row| row.to_vec()).collect(),
        };
        Ok(serde_json::to_string_pretty(&out)?)
    }

    /// Writes the dataset to disk as JSON.
    pub fn save(&self, path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_rows() {
        let dataset = Dataset::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .expect("valid rows");
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.width(), 2);
        assert_eq!(dataset.item(1), array![3.0, 4.0].view());
    }

    #[test]
    fn test_from_rows_ragged() {
        let result = Dataset::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(DatasetError::Ragged {
                row: 1,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_from_rows_empty() {
        let dataset = Dataset::from_rows(Vec::new()).expect("empty is allowed");
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_subset_keeps_order() {
        let dataset = Dataset::new(array![[0.0], [1.0], [2.0], [3.0]]);
        let subset = dataset.subset(&[3, 0, 2]);
        assert_eq!(subset.rows(), &array![[3.0], [0.0], [2.0]]);
    }

    #[test]
    fn test_from_json_bare_rows() {
        let dataset = Dataset::from_json_str("[[1, 2], [3, 4.5]]").expect("valid json");
        assert_eq!(dataset.rows(), &array![[1.0, 2.0], [3.0, 4.5]]);
        assert!(dataset.attributes().is_none());
    }

    #[test]
    fn test_from_json_named() {
        let dataset = Dataset::from_json_str(r#"{"attributes": ["x", "y"], "rows": [[1, 2]]}"#)
            .expect("valid json");
        assert_eq!(
            dataset.attributes(),
            Some(&["x".to_string(), "y".to_string()][..])
        );
    }

    #[test]
    fn test_from_json_attribute_mismatch() {
        let result = Dataset::from_json_str(r#"{"attributes": ["x"], "rows": [[1, 2]]}"#);
        assert!(matches!(
            result,
            Err(DatasetError::AttributeMismatch {
                attributes: 1,
                width: 2
            })
        ));
    }

    #[test]
    fn test_from_json_rejects_strings() {
        assert!(Dataset::from_json_str(r#"[["a", "b"]]"#).is_err());
    }

    #[test]
    fn test_from_jsonl() {
        let dataset = Dataset::from_jsonl_str("[1, 2]\n\n[3, 4]\n").expect("valid jsonl");
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_from_jsonl_reports_line() {
        let result = Dataset::from_jsonl_str("[1, 2]\nnot json\n");
        assert!(matches!(
            result,
            Err(DatasetError::InvalidLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("data.json");
        let dataset = Dataset::new(array![[1.0, 2.0], [3.0, 4.0]])
            .with_attributes(vec!["a".to_string(), "b".to_string()])
            .expect("matching attributes");

        dataset.save(&path).expect("save");
        let loaded = Dataset::load(&path).expect("load");
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_load_rejects_empty_files() {
        let dir = tempfile::tempdir().expect("tempdir");

        let json = dir.path().join("empty.json");
        std::fs::write(&json, "[]").expect("write");
        assert!(matches!(Dataset::load(&json), Err(DatasetError::Empty)));

        let jsonl = dir.path().join("blank.jsonl");
        std::fs::write(&jsonl, "\n\n").expect("write");
        assert!(matches!(Dataset::load(&jsonl), Err(DatasetError::Empty)));
    }
}
