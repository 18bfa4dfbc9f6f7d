//! Monoforest inspection
//!
//! A monoforest rewrites a tree ensemble as a sum of polynomial terms, each
//! term a conjunction of binary splits with a value and a weight. The
//! decomposition itself belongs to the boosting library; this module tabulates
//! the terms and their splits.

use super::inspector::{dense, f64_values};
use crate::error::{Result, ToolboxError};
use crate::plot::{describe, Axis, Figure, Panel, PanelKind, PlotSeries, ReferenceLine};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One split of a polynomial term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinarySplit {
    pub feature_idx: usize,
    pub split_type: String,
    pub border: f64,
}

/// One polynomial term of the decomposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynom {
    pub splits: Vec<BinarySplit>,
    /// Term value per model dimension
    pub value: Vec<f64>,
    pub weight: f64,
}

/// Models that can be decomposed into polynomial terms
pub trait MonoForestModel {
    type Error: fmt::Display;

    /// Feature names in training order
    fn feature_names(&self) -> Vec<String>;

    fn to_polynom(&self) -> std::result::Result<Vec<Polynom>, Self::Error>;
}

/// Tabulates the polynomial terms of a model
pub struct MonoForestInspector<M: MonoForestModel> {
    model: M,
    tables: Option<(DataFrame, DataFrame)>,
}

impl<M: MonoForestModel> MonoForestInspector<M> {
    pub fn new(model: M) -> Self {
        Self { model, tables: None }
    }

    /// Decompose the model and build the term and split tables
    pub fn fit(&mut self) -> Result<&mut Self> {
        let polynoms = self.model.to_polynom().map_err(ToolboxError::model)?;
        let features = self.model.feature_names();

        let polynom_df = polynom_frame(&polynoms)?;
        let splits_df = splits_frame(&polynoms, &features)?;
        self.tables = Some((polynom_df, splits_df));
        Ok(self)
    }

    /// `polynom, weight, value, n_splits`: one row per term
    pub fn polynom_df(&self) -> Result<&DataFrame> {
        self.tables
            .as_ref()
            .map(|(polynoms, _)| polynoms)
            .ok_or(ToolboxError::NotFitted)
    }

    /// `polynom, split, feature, split_type, border`: one row per split
    pub fn splits_df(&self) -> Result<&DataFrame> {
        self.tables
            .as_ref()
            .map(|(_, splits)| splits)
            .ok_or(ToolboxError::NotFitted)
    }

    /// Term weights, largest first, with a summary table
    pub fn plot_weight(&self) -> Result<Figure> {
        let weights = dense(f64_values(self.polynom_df()?, "weight")?);
        let table = describe("weight", &weights);

        let mut sorted = weights;
        sorted.sort_by(|a, b| b.total_cmp(a));
        let panel = Panel::new(PanelKind::Line)
            .with_series(PlotSeries::indexed("weight", sorted))
            .with_reference_line(ReferenceLine::zero(Axis::Horizontal))
            .with_table(table);
        Ok(Figure::single("Polynom weights", panel))
    }
}

fn polynom_frame(polynoms: &[Polynom]) -> Result<DataFrame> {
    let index: Vec<u32> = (0..polynoms.len() as u32).collect();
    let weight: Vec<f64> = polynoms.iter().map(|p| p.weight).collect();
    // Only the first model dimension is kept
    let value: Vec<Option<f64>> = polynoms.iter().map(|p| p.value.first().copied()).collect();
    let n_splits: Vec<u32> = polynoms.iter().map(|p| p.splits.len() as u32).collect();

    Ok(DataFrame::new(vec![
        Column::new("polynom".into(), index),
        Column::new("weight".into(), weight),
        Column::new("value".into(), value),
        Column::new("n_splits".into(), n_splits),
    ])?)
}

fn splits_frame(polynoms: &[Polynom], features: &[String]) -> Result<DataFrame> {
    let mut polynom = Vec::new();
    let mut split = Vec::new();
    let mut feature = Vec::new();
    let mut split_type = Vec::new();
    let mut border = Vec::new();

    for (i, term) in polynoms.iter().enumerate() {
        for (j, s) in term.splits.iter().enumerate() {
            let name = features.get(s.feature_idx).cloned().ok_or_else(|| {
                ToolboxError::FeatureNotFound(format!("feature index {}", s.feature_idx))
            })?;
            polynom.push(i as u32);
            split.push(j as u32);
            feature.push(name);
            split_type.push(s.split_type.clone());
            border.push(s.border);
        }
    }

    Ok(DataFrame::new(vec![
        Column::new("polynom".into(), polynom),
        Column::new("split".into(), split),
        Column::new("feature".into(), feature),
        Column::new("split_type".into(), split_type),
        Column::new("border".into(), border),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catboost::inspector::str_values;

    struct TwoTermForest;

    impl MonoForestModel for TwoTermForest {
        type Error = String;

        fn feature_names(&self) -> Vec<String> {
            vec!["age".to_string(), "income".to_string()]
        }

        fn to_polynom(&self) -> std::result::Result<Vec<Polynom>, String> {
            Ok(vec![
                Polynom {
                    splits: vec![BinarySplit {
                        feature_idx: 0,
                        split_type: "FloatFeature".to_string(),
                        border: 30.5,
                    }],
                    value: vec![0.25],
                    weight: 10.0,
                },
                Polynom {
                    splits: vec![
                        BinarySplit {
                            feature_idx: 0,
                            split_type: "FloatFeature".to_string(),
                            border: 45.0,
                        },
                        BinarySplit {
                            feature_idx: 1,
                            split_type: "FloatFeature".to_string(),
                            border: 1500.0,
                        },
                    ],
                    value: vec![-0.5],
                    weight: 40.0,
                },
            ])
        }
    }

    #[test]
    fn test_fit_builds_tables() {
        let mut inspector = MonoForestInspector::new(TwoTermForest);
        inspector.fit().unwrap();

        let polynoms = inspector.polynom_df().unwrap();
        assert_eq!(polynoms.height(), 2);
        assert_eq!(
            f64_values(polynoms, "value").unwrap(),
            vec![Some(0.25), Some(-0.5)]
        );

        let splits = inspector.splits_df().unwrap();
        assert_eq!(splits.height(), 3);
        assert_eq!(
            str_values(splits, "feature").unwrap(),
            vec!["age", "age", "income"]
        );
    }

    #[test]
    fn test_plot_weight_sorted_descending() {
        let mut inspector = MonoForestInspector::new(TwoTermForest);
        inspector.fit().unwrap();

        let figure = inspector.plot_weight().unwrap();
        let panel = &figure.panels[0];
        assert_eq!(panel.series[0].y, vec![40.0, 10.0]);
        assert_eq!(panel.table.as_ref().unwrap().get("mean"), Some(25.0));
    }

    #[test]
    fn test_not_fitted() {
        let inspector = MonoForestInspector::new(TwoTermForest);
        assert!(matches!(inspector.polynom_df(), Err(ToolboxError::NotFitted)));
        assert!(inspector.plot_weight().is_err());
    }
}
