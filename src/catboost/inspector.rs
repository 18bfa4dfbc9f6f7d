//! Post-training inspection of a boosting model
//!
//! [`CatBoostInspector`] asks a trained model for its evaluation metrics,
//! ROC/FNR curves, feature importances and pairwise interactions on a given
//! dataset, reshapes them into polars frames and composes figures from them.
//! All numbers come from the model; the inspector only joins, labels and
//! sorts.

use super::params::ParameterSet;
use crate::error::{Result, ToolboxError};
use crate::plot::{
    describe, round_to, Axis, Figure, Panel, PanelKind, PlotSeries, ReferenceLine, SummaryTable,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Dataset handed to the model: features, labels and categorical columns
#[derive(Debug, Clone)]
pub struct Pool {
    pub features: DataFrame,
    pub labels: Series,
    pub cat_features: Vec<String>,
    /// Any other pool constructor argument
    pub options: Map<String, Value>,
}

/// Feature importance flavours computed by the inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportanceType {
    PredictionValuesChange,
    LossFunctionChange,
}

impl ImportanceType {
    pub const ALL: [ImportanceType; 2] = [
        ImportanceType::PredictionValuesChange,
        ImportanceType::LossFunctionChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImportanceType::PredictionValuesChange => "PredictionValuesChange",
            ImportanceType::LossFunctionChange => "LossFunctionChange",
        }
    }
}

impl fmt::Display for ImportanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ROC curve points, parallel vectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// False-negative-rate curve points, parallel vectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FnrCurve {
    pub thresholds: Vec<f64>,
    pub fnr: Vec<f64>,
}

/// Interaction strength between two features, by index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureInteraction {
    pub first: usize,
    pub second: usize,
    pub score: f64,
}

/// What the inspector needs from a trained model
pub trait InspectableModel {
    type Error: fmt::Display;

    /// Feature names in training order
    fn feature_names(&self) -> Vec<String>;

    /// Parameters the model was trained with
    fn params(&self) -> ParameterSet;

    /// metric -> value per iteration
    fn eval_metrics(
        &self,
        pool: &Pool,
        metrics: &[String],
    ) -> std::result::Result<BTreeMap<String, Vec<f64>>, Self::Error>;

    fn roc_curve(&self, pool: &Pool) -> std::result::Result<RocCurve, Self::Error>;

    fn fnr_curve(&self, pool: &Pool) -> std::result::Result<FnrCurve, Self::Error>;

    /// One value per feature, in [`feature_names`](Self::feature_names) order
    fn feature_importance(
        &self,
        pool: &Pool,
        kind: ImportanceType,
    ) -> std::result::Result<Vec<f64>, Self::Error>;

    fn interactions(
        &self,
        pool: &Pool,
    ) -> std::result::Result<Vec<FeatureInteraction>, Self::Error>;
}

/// Frames computed by [`CatBoostInspector::fit`]
#[derive(Debug, Clone)]
pub struct Inspection {
    /// One column per metric, one row per iteration
    pub eval_metrics_df: DataFrame,
    /// `thresholds, fpr, tpr, fnr`
    pub thresholded_metrics_df: DataFrame,
    /// `feature, PredictionValuesChange, LossFunctionChange`, by loss change
    pub feature_importances_df: DataFrame,
    /// `first_feature, second_feature, interactions`
    pub interactions_df: DataFrame,
}

/// Computes and plots evaluation artefacts of a trained model
pub struct CatBoostInspector<M: InspectableModel> {
    model: M,
    metrics: Vec<String>,
    inspection: Option<Inspection>,
}

impl<M: InspectableModel> CatBoostInspector<M> {
    pub fn new<I, S>(model: M, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model,
            metrics: metrics.into_iter().map(Into::into).collect(),
            inspection: None,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Compute metrics, curves, importances and interactions on `(x, y)`.
    ///
    /// The pool's categorical features are taken from the model's params.
    pub fn fit(
        &mut self,
        x: &DataFrame,
        y: &Series,
        pool_options: Map<String, Value>,
    ) -> Result<&mut Self> {
        let pool = Pool {
            features: x.clone(),
            labels: y.clone(),
            cat_features: self.model.params().categorical_features,
            options: pool_options,
        };

        let eval_metrics = self
            .model
            .eval_metrics(&pool, &self.metrics)
            .map_err(ToolboxError::model)?;
        let eval_metrics_df = eval_metrics_frame(&self.metrics, &eval_metrics)?;

        let roc = self.model.roc_curve(&pool).map_err(ToolboxError::model)?;
        let fnr = self.model.fnr_curve(&pool).map_err(ToolboxError::model)?;
        let thresholded_metrics_df = thresholded_frame(&roc, &fnr)?;

        let features = self.model.feature_names();
        let mut importances = Vec::with_capacity(ImportanceType::ALL.len());
        for kind in ImportanceType::ALL {
            let values = self
                .model
                .feature_importance(&pool, kind)
                .map_err(ToolboxError::model)?;
            importances.push(values);
        }
        let feature_importances_df =
            importances_frame(&features, &importances[0], &importances[1])?;

        let interactions = self.model.interactions(&pool).map_err(ToolboxError::model)?;
        let interactions_df = interactions_frame(&features, &interactions)?;

        self.inspection = Some(Inspection {
            eval_metrics_df,
            thresholded_metrics_df,
            feature_importances_df,
            interactions_df,
        });
        Ok(self)
    }

    /// Frames from the last [`fit`](Self::fit)
    pub fn inspection(&self) -> Result<&Inspection> {
        self.inspection.as_ref().ok_or(ToolboxError::NotFitted)
    }

    pub fn eval_metrics_df(&self) -> Result<&DataFrame> {
        Ok(&self.inspection()?.eval_metrics_df)
    }

    pub fn thresholded_metrics_df(&self) -> Result<&DataFrame> {
        Ok(&self.inspection()?.thresholded_metrics_df)
    }

    pub fn feature_importances_df(&self) -> Result<&DataFrame> {
        Ok(&self.inspection()?.feature_importances_df)
    }

    pub fn interactions_df(&self) -> Result<&DataFrame> {
        Ok(&self.inspection()?.interactions_df)
    }

    /// Last-iteration metrics as sorted bars, or every metric's history
    pub fn plot_eval_metrics(&self, last: bool) -> Result<Figure> {
        let df = self.eval_metrics_df()?;
        let names = column_names(df);

        if last {
            let mut latest = Vec::with_capacity(names.len());
            for name in &names {
                let value = f64_values(df, name)?
                    .last()
                    .copied()
                    .flatten()
                    .unwrap_or(f64::NAN);
                latest.push((name.clone(), value));
            }
            latest.sort_by(|a, b| a.1.total_cmp(&b.1));

            let table = SummaryTable {
                title: "metrics".to_string(),
                rows: latest
                    .iter()
                    .map(|(name, value)| (name.clone(), round_to(*value, 3)))
                    .collect(),
            };
            let (labels, values): (Vec<String>, Vec<f64>) = latest.into_iter().unzip();
            let panel = Panel::new(PanelKind::HorizontalBar)
                .with_series(PlotSeries::bars("metrics", labels, values))
                .with_reference_line(ReferenceLine::zero(Axis::Vertical))
                .with_table(table);
            Ok(Figure::single("Eval metrics", panel))
        } else {
            let mut panels = Vec::with_capacity(names.len());
            for name in &names {
                let values = dense(f64_values(df, name)?);
                panels.push(
                    Panel::new(PanelKind::Line)
                        .with_series(PlotSeries::indexed(name.clone(), values)),
                );
            }
            let height = 3.0 * names.len() as f64;
            Ok(Figure::column("Eval metrics", panels).with_size(10.0, height))
        }
    }

    /// ROC curve against the chance diagonal
    pub fn plot_roc_curve(&self) -> Result<Figure> {
        let df = self.thresholded_metrics_df()?;
        let (fpr, tpr) = paired(f64_values(df, "fpr")?, f64_values(df, "tpr")?);

        let panel = Panel::new(PanelKind::Line)
            .with_labels("fpr", "tpr")
            .with_series(PlotSeries::line("ROC curve", fpr, tpr))
            .with_series(PlotSeries::line("Chance", vec![0.0, 1.0], vec![0.0, 1.0]).dotted());
        Ok(Figure::single("ROC curve", panel).with_size(5.0, 5.0))
    }

    /// FPR and FNR for every threshold
    pub fn plot_fpr_fnr(&self) -> Result<Figure> {
        let df = self.thresholded_metrics_df()?;
        let thresholds = f64_values(df, "thresholds")?;

        let mut panel = Panel::new(PanelKind::Line).with_labels("thresholds", "rate");
        for rate in ["fpr", "fnr"] {
            let (x, y) = paired(thresholds.clone(), f64_values(df, rate)?);
            panel = panel.with_series(PlotSeries::line(rate, x, y));
        }
        Ok(Figure::single("FPR and FNR", panel))
    }

    /// One panel per importance type, with a summary table
    pub fn plot_feature_importances(&self) -> Result<Figure> {
        let df = self.feature_importances_df()?;

        let mut panels = Vec::with_capacity(ImportanceType::ALL.len());
        for kind in ImportanceType::ALL {
            let values = dense(f64_values(df, kind.as_str())?);
            let table = describe(kind.as_str(), &values);
            panels.push(
                Panel::new(PanelKind::Line)
                    .with_series(PlotSeries::indexed(kind.as_str(), values))
                    .with_reference_line(ReferenceLine::zero(Axis::Horizontal))
                    .with_table(table)
                    .without_x_ticks(),
            );
        }
        Ok(Figure::column("Feature importances", panels).with_size(10.0, 10.0))
    }

    /// Top `n` features by `by`, largest at the top
    pub fn plot_top_feature_importances(&self, n: usize, by: ImportanceType) -> Result<Figure> {
        let df = self.feature_importances_df()?;
        let features = str_values(df, "feature")?;
        let by_values = f64_values(df, by.as_str())?;

        let mut order: Vec<usize> = (0..features.len()).collect();
        order.sort_by(|&a, &b| nan_last(by_values[b]).total_cmp(&nan_last(by_values[a])));
        order.truncate(n);
        order.reverse();

        let labels: Vec<String> = order.iter().map(|&i| features[i].clone()).collect();
        let mut panels = Vec::with_capacity(ImportanceType::ALL.len());
        for kind in ImportanceType::ALL {
            let values = f64_values(df, kind.as_str())?;
            let picked = order
                .iter()
                .map(|&i| values[i].unwrap_or(f64::NAN))
                .collect();
            panels.push(
                Panel::new(PanelKind::HorizontalBar)
                    .with_title(kind.as_str())
                    .with_series(PlotSeries::bars(kind.as_str(), labels.clone(), picked)),
            );
        }
        Ok(Figure::row("Top feature importances", panels).with_shared_y())
    }

    /// Interaction strengths in model order, with a summary table
    pub fn plot_interactions(&self) -> Result<Figure> {
        let df = self.interactions_df()?;
        let values = dense(f64_values(df, "interactions")?);
        let table = describe("interactions", &values);

        let panel = Panel::new(PanelKind::Line)
            .with_series(PlotSeries::indexed("interactions", values))
            .with_reference_line(ReferenceLine::zero(Axis::Horizontal))
            .with_table(table);
        Ok(Figure::single("Interactions", panel))
    }

    /// Top `n` feature pairs, largest at the top
    pub fn plot_top_interactions(&self, n: usize) -> Result<Figure> {
        let df = self.interactions_df()?;
        let first = str_values(df, "first_feature")?;
        let second = str_values(df, "second_feature")?;
        let scores = f64_values(df, "interactions")?;

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| nan_last(scores[b]).total_cmp(&nan_last(scores[a])));
        order.truncate(n);
        order.reverse();

        let labels = order
            .iter()
            .map(|&i| format!("({}, {})", first[i], second[i]))
            .collect();
        let values = order
            .iter()
            .map(|&i| scores[i].unwrap_or(f64::NAN))
            .collect();
        let panel = Panel::new(PanelKind::HorizontalBar)
            .with_series(PlotSeries::bars("interactions", labels, values));
        Ok(Figure::single("Top interactions", panel))
    }
}

// ============ Frame builders ============

fn eval_metrics_frame(
    requested: &[String],
    reported: &BTreeMap<String, Vec<f64>>,
) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(requested.len());
    let mut height: Option<usize> = None;

    for metric in requested {
        let values = reported
            .get(metric)
            .ok_or_else(|| ToolboxError::Model(format!("metric '{}' was not reported", metric)))?;
        match height {
            Some(expected) if expected != values.len() => {
                return Err(ToolboxError::ShapeError {
                    expected: format!("{} iterations", expected),
                    actual: format!("{} for '{}'", values.len(), metric),
                });
            }
            _ => height = Some(values.len()),
        }
        columns.push(Column::new(metric.as_str().into(), values.as_slice()));
    }

    Ok(DataFrame::new(columns)?)
}

/// Outer-join the ROC and FNR curves on their thresholds, ascending.
///
/// When a curve repeats a threshold, its first point wins.
fn thresholded_frame(roc: &RocCurve, fnr: &FnrCurve) -> Result<DataFrame> {
    if roc.fpr.len() != roc.thresholds.len() || roc.tpr.len() != roc.thresholds.len() {
        return Err(ToolboxError::ShapeError {
            expected: format!("{} ROC points", roc.thresholds.len()),
            actual: format!("fpr {} / tpr {}", roc.fpr.len(), roc.tpr.len()),
        });
    }
    if fnr.fnr.len() != fnr.thresholds.len() {
        return Err(ToolboxError::ShapeError {
            expected: format!("{} FNR points", fnr.thresholds.len()),
            actual: format!("fnr {}", fnr.fnr.len()),
        });
    }

    let roc_points = by_threshold(
        roc.thresholds
            .iter()
            .zip(roc.fpr.iter().zip(roc.tpr.iter()))
            .map(|(&t, (&fpr, &tpr))| (t, (fpr, tpr))),
    );
    let fnr_points = by_threshold(fnr.thresholds.iter().copied().zip(fnr.fnr.iter().copied()));

    let mut thresholds: Vec<f64> = roc_points
        .iter()
        .map(|(t, _)| *t)
        .chain(fnr_points.iter().map(|(t, _)| *t))
        .collect();
    thresholds.sort_by(|a, b| a.total_cmp(b));
    thresholds.dedup_by(|a, b| a.total_cmp(b).is_eq());

    let mut fpr = Vec::with_capacity(thresholds.len());
    let mut tpr = Vec::with_capacity(thresholds.len());
    let mut fnr_col = Vec::with_capacity(thresholds.len());
    for &t in &thresholds {
        let roc_point = find_threshold(&roc_points, t).map(|i| roc_points[i].1);
        fpr.push(roc_point.map(|(f, _)| f));
        tpr.push(roc_point.map(|(_, t)| t));
        fnr_col.push(find_threshold(&fnr_points, t).map(|i| fnr_points[i].1));
    }

    Ok(DataFrame::new(vec![
        Column::new("thresholds".into(), thresholds),
        Column::new("fpr".into(), fpr),
        Column::new("tpr".into(), tpr),
        Column::new("fnr".into(), fnr_col),
    ])?)
}

/// Sort points by threshold, keeping the first point of each threshold
fn by_threshold<T>(points: impl Iterator<Item = (f64, T)>) -> Vec<(f64, T)> {
    let mut points: Vec<(f64, T)> = points.collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points.dedup_by(|later, earlier| later.0.total_cmp(&earlier.0).is_eq());
    points
}

fn find_threshold<T>(points: &[(f64, T)], threshold: f64) -> Option<usize> {
    points
        .binary_search_by(|(candidate, _)| candidate.total_cmp(&threshold))
        .ok()
}

fn importances_frame(
    features: &[String],
    prediction_change: &[f64],
    loss_change: &[f64],
) -> Result<DataFrame> {
    for (kind, values) in ImportanceType::ALL.iter().zip([prediction_change, loss_change]) {
        if values.len() != features.len() {
            return Err(ToolboxError::ShapeError {
                expected: format!("{} {} values", features.len(), kind),
                actual: values.len().to_string(),
            });
        }
    }

    let mut order: Vec<usize> = (0..features.len()).collect();
    order.sort_by(|&a, &b| nan_last(Some(loss_change[b])).total_cmp(&nan_last(Some(loss_change[a]))));

    let feature: Vec<String> = order.iter().map(|&i| features[i].clone()).collect();
    let prediction: Vec<f64> = order.iter().map(|&i| prediction_change[i]).collect();
    let loss: Vec<f64> = order.iter().map(|&i| loss_change[i]).collect();

    Ok(DataFrame::new(vec![
        Column::new("feature".into(), feature),
        Column::new(ImportanceType::PredictionValuesChange.as_str().into(), prediction),
        Column::new(ImportanceType::LossFunctionChange.as_str().into(), loss),
    ])?)
}

fn interactions_frame(
    features: &[String],
    interactions: &[FeatureInteraction],
) -> Result<DataFrame> {
    let name = |index: usize| {
        features
            .get(index)
            .cloned()
            .ok_or_else(|| ToolboxError::FeatureNotFound(format!("feature index {}", index)))
    };

    let mut first = Vec::with_capacity(interactions.len());
    let mut second = Vec::with_capacity(interactions.len());
    let mut scores = Vec::with_capacity(interactions.len());
    for interaction in interactions {
        first.push(name(interaction.first)?);
        second.push(name(interaction.second)?);
        scores.push(interaction.score);
    }

    Ok(DataFrame::new(vec![
        Column::new("first_feature".into(), first),
        Column::new("second_feature".into(), second),
        Column::new("interactions".into(), scores),
    ])?)
}

// ============ Column helpers ============

pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

pub(crate) fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ToolboxError::FeatureNotFound(name.to_string()))?;
    Ok(column.f64()?.into_iter().collect())
}

pub(crate) fn str_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| ToolboxError::FeatureNotFound(name.to_string()))?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

/// Nulls become NaN
pub(crate) fn dense(values: Vec<Option<f64>>) -> Vec<f64> {
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

/// Keep only the positions where both sides are present
fn paired(x: Vec<Option<f64>>, y: Vec<Option<f64>>) -> (Vec<f64>, Vec<f64>) {
    x.into_iter()
        .zip(y)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .unzip()
}

/// Sort key placing nulls and NaNs after every number in a descending sort
fn nan_last(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => f64::NEG_INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholded_frame_outer_join() {
        let roc = RocCurve {
            fpr: vec![1.0, 0.5, 0.0],
            tpr: vec![1.0, 0.8, 0.0],
            thresholds: vec![0.0, 0.5, 1.0],
        };
        let fnr = FnrCurve {
            thresholds: vec![0.25, 0.5],
            fnr: vec![0.1, 0.2],
        };

        let df = thresholded_frame(&roc, &fnr).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(
            f64_values(&df, "thresholds").unwrap(),
            vec![Some(0.0), Some(0.25), Some(0.5), Some(1.0)]
        );
        assert_eq!(
            f64_values(&df, "fpr").unwrap(),
            vec![Some(1.0), None, Some(0.5), Some(0.0)]
        );
        assert_eq!(
            f64_values(&df, "fnr").unwrap(),
            vec![None, Some(0.1), Some(0.2), None]
        );
    }

    #[test]
    fn test_thresholded_frame_rejects_ragged_curve() {
        let roc = RocCurve {
            fpr: vec![0.0],
            tpr: vec![0.0, 1.0],
            thresholds: vec![0.0, 1.0],
        };
        let result = thresholded_frame(&roc, &FnrCurve::default());
        assert!(matches!(result, Err(ToolboxError::ShapeError { .. })));
    }

    #[test]
    fn test_importances_sorted_by_loss_change() {
        let features = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let df = importances_frame(&features, &[10.0, 20.0, 30.0], &[0.1, 0.3, 0.2]).unwrap();
        assert_eq!(str_values(&df, "feature").unwrap(), vec!["b", "c", "a"]);
        assert_eq!(
            f64_values(&df, "PredictionValuesChange").unwrap(),
            vec![Some(20.0), Some(30.0), Some(10.0)]
        );
    }

    #[test]
    fn test_interactions_map_indices_to_names() {
        let features = vec!["age".to_string(), "income".to_string()];
        let df = interactions_frame(
            &features,
            &[FeatureInteraction { first: 1, second: 0, score: 4.5 }],
        )
        .unwrap();
        assert_eq!(str_values(&df, "first_feature").unwrap(), vec!["income"]);
        assert_eq!(str_values(&df, "second_feature").unwrap(), vec!["age"]);

        let err = interactions_frame(
            &features,
            &[FeatureInteraction { first: 2, second: 0, score: 1.0 }],
        )
        .unwrap_err();
        assert!(matches!(err, ToolboxError::FeatureNotFound(_)));
    }

    #[test]
    fn test_eval_metrics_frame_requires_requested_metrics() {
        let mut reported = BTreeMap::new();
        reported.insert("Logloss".to_string(), vec![0.6, 0.5]);
        let requested = vec!["Logloss".to_string(), "AUC".to_string()];
        assert!(eval_metrics_frame(&requested, &reported).is_err());

        reported.insert("AUC".to_string(), vec![0.7, 0.8]);
        let df = eval_metrics_frame(&requested, &reported).unwrap();
        assert_eq!(column_names(&df), vec!["Logloss", "AUC"]);
        assert_eq!(df.height(), 2);
    }
}
