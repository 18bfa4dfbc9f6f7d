//! Feature-matrix schemas
//!
//! The reconciler only needs column names and whether each column is
//! declared categorical. [`FeatureSchema`] exposes exactly that, for polars
//! data frames and for explicit type maps.

use crate::error::{Result, ToolboxError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared element type of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Kind implied by a polars dtype: strings and categoricals are labels,
    /// everything else is treated as numeric.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String | DataType::Categorical(..) | DataType::Enum(..) => {
                ColumnKind::Categorical
            }
            _ => ColumnKind::Numeric,
        }
    }
}

/// Ordered, typed column listing of a feature matrix
pub trait FeatureSchema {
    /// Column names in matrix order
    fn column_names(&self) -> Vec<String>;

    /// Declared kind of a column, `None` if the column does not exist
    fn column_kind(&self, name: &str) -> Option<ColumnKind>;

    /// Columns declared categorical, in matrix order
    fn categorical_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| self.column_kind(name) == Some(ColumnKind::Categorical))
            .collect()
    }
}

impl FeatureSchema for DataFrame {
    fn column_names(&self) -> Vec<String> {
        self.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name)
            .ok()
            .map(|col| ColumnKind::from_dtype(col.dtype()))
    }
}

/// Feature schema built from an explicit type map.
///
/// For feature sources that carry no dtype information. Every column must
/// have a declared kind; a missing one is a configuration error raised at
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTypes {
    columns: Vec<(String, ColumnKind)>,
}

impl ColumnTypes {
    /// Build from column names and a name -> kind map
    pub fn new<S: AsRef<str>>(names: &[S], kinds: &HashMap<String, ColumnKind>) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                kinds
                    .get(name)
                    .map(|&kind| (name.to_string(), kind))
                    .ok_or_else(|| {
                        ToolboxError::ConfigError(format!(
                            "no declared type for column '{}'",
                            name
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_pairs(columns)
    }

    /// Build from column names and a caller-supplied categorical predicate
    pub fn with_predicate<S, F>(names: &[S], is_categorical: F) -> Result<Self>
    where
        S: AsRef<str>,
        F: Fn(&str) -> bool,
    {
        Self::from_pairs(names.iter().map(|name| {
            let name = name.as_ref();
            let kind = if is_categorical(name) {
                ColumnKind::Categorical
            } else {
                ColumnKind::Numeric
            };
            (name.to_string(), kind)
        }))
    }

    /// Build from `(name, kind)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnKind)>,
        S: Into<String>,
    {
        let mut columns: Vec<(String, ColumnKind)> = Vec::new();
        for (name, kind) in pairs {
            let name = name.into();
            if columns.iter().any(|(existing, _)| *existing == name) {
                return Err(ToolboxError::ConfigError(format!(
                    "duplicate column '{}'",
                    name
                )));
            }
            columns.push((name, kind));
        }
        Ok(Self { columns })
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate `(name, kind)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.columns.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

impl FeatureSchema for ColumnTypes {
    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, kind)| *kind)
    }
}

impl From<&DataFrame> for ColumnTypes {
    fn from(df: &DataFrame) -> Self {
        Self {
            columns: df
                .get_columns()
                .iter()
                .map(|col| (col.name().to_string(), ColumnKind::from_dtype(col.dtype())))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataframe_schema() {
        let df = df!(
            "age" => &[31.0, 45.0],
            "country" => &["PT", "ES"],
            "children" => &[0i64, 2]
        )
        .unwrap();

        assert_eq!(df.column_names(), vec!["age", "country", "children"]);
        assert_eq!(df.column_kind("age"), Some(ColumnKind::Numeric));
        assert_eq!(df.column_kind("country"), Some(ColumnKind::Categorical));
        assert_eq!(df.column_kind("children"), Some(ColumnKind::Numeric));
        assert_eq!(df.column_kind("missing"), None);
        assert_eq!(df.categorical_columns(), vec!["country"]);
    }

    #[test]
    fn test_categorical_dtype() {
        let segment = Series::new("segment".into(), &["a", "b", "a"])
            .cast(&DataType::Categorical(None, Default::default()))
            .unwrap();
        let df = DataFrame::new(vec![segment.into()]).unwrap();
        assert_eq!(df.column_kind("segment"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn test_column_types_requires_every_kind() {
        let mut kinds = HashMap::new();
        kinds.insert("x".to_string(), ColumnKind::Numeric);

        let err = ColumnTypes::new(&["x", "y"], &kinds).unwrap_err();
        assert!(matches!(err, ToolboxError::ConfigError(_)));

        kinds.insert("y".to_string(), ColumnKind::Categorical);
        let schema = ColumnTypes::new(&["x", "y"], &kinds).unwrap();
        assert_eq!(schema.column_names(), vec!["x", "y"]);
        assert_eq!(schema.categorical_columns(), vec!["y"]);
    }

    #[test]
    fn test_column_types_predicate() {
        let schema = ColumnTypes::with_predicate(&["id_code", "amount"], |name| {
            name.ends_with("_code")
        })
        .unwrap();
        assert_eq!(schema.column_kind("id_code"), Some(ColumnKind::Categorical));
        assert_eq!(schema.column_kind("amount"), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_column_types_rejects_duplicates() {
        let result = ColumnTypes::from_pairs([
            ("a", ColumnKind::Numeric),
            ("a", ColumnKind::Categorical),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_column_types_from_dataframe() {
        let df = df!("region" => &["north"], "amount" => &[1.5]).unwrap();
        let schema = ColumnTypes::from(&df);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column_kind("region"), Some(ColumnKind::Categorical));
    }
}
