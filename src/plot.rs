//! Renderer-independent figure descriptions
//!
//! Inspectors compose [`Figure`]s out of panels, series, reference lines and
//! summary tables. Drawing them is left to whatever consumes the JSON form.

use serde::{Deserialize, Serialize};

/// How a panel's series are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Line,
    HorizontalBar,
}

/// One named sequence of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub label: String,
    /// Numeric x positions; empty for categorical bar charts
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Category labels, one per point, for bar charts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Dotted style (used for reference diagonals)
    #[serde(default)]
    pub dotted: bool,
}

impl PlotSeries {
    pub fn line(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            categories: Vec::new(),
            dotted: false,
        }
    }

    /// Series against 0..n
    pub fn indexed(label: impl Into<String>, y: Vec<f64>) -> Self {
        let x = (0..y.len()).map(|i| i as f64).collect();
        Self::line(label, x, y)
    }

    pub fn bars(label: impl Into<String>, categories: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            x: Vec::new(),
            y: values,
            categories,
            dotted: false,
        }
    }

    pub fn dotted(mut self) -> Self {
        self.dotted = true;
        self
    }
}

/// Axis of a reference line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Horizontal line at a y value
    Horizontal,
    /// Vertical line at an x value
    Vertical,
}

/// Dotted guide line across a panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub axis: Axis,
    pub at: f64,
}

impl ReferenceLine {
    pub fn zero(axis: Axis) -> Self {
        Self { axis, at: 0.0 }
    }
}

/// Row-labelled table drawn beside a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub title: String,
    pub rows: Vec<(String, f64)>,
}

impl SummaryTable {
    pub fn get(&self, row: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|(name, _)| name == row)
            .map(|(_, value)| *value)
    }
}

/// A single set of axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub series: Vec<PlotSeries>,
    pub reference_lines: Vec<ReferenceLine>,
    pub table: Option<SummaryTable>,
    /// Hide x tick labels
    #[serde(default)]
    pub hide_x_ticks: bool,
}

impl Panel {
    pub fn new(kind: PanelKind) -> Self {
        Self {
            kind,
            title: None,
            x_label: None,
            y_label: None,
            series: Vec::new(),
            reference_lines: Vec::new(),
            table: None,
            hide_x_ticks: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = Some(x.into());
        self.y_label = Some(y.into());
        self
    }

    pub fn with_series(mut self, series: PlotSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_reference_line(mut self, line: ReferenceLine) -> Self {
        self.reference_lines.push(line);
        self
    }

    pub fn with_table(mut self, table: SummaryTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn without_x_ticks(mut self) -> Self {
        self.hide_x_ticks = true;
        self
    }
}

/// Panels stacked in a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: String,
    /// (rows, columns)
    pub layout: (usize, usize),
    /// (width, height) in inches, if the figure asks for one
    pub size: Option<(f64, f64)>,
    pub panels: Vec<Panel>,
    /// Panels share their y axis
    #[serde(default)]
    pub share_y: bool,
}

impl Figure {
    /// Single-panel figure
    pub fn single(title: impl Into<String>, panel: Panel) -> Self {
        Self {
            title: title.into(),
            layout: (1, 1),
            size: None,
            panels: vec![panel],
            share_y: false,
        }
    }

    /// Panels stacked in one column
    pub fn column(title: impl Into<String>, panels: Vec<Panel>) -> Self {
        Self {
            title: title.into(),
            layout: (panels.len(), 1),
            size: None,
            panels,
            share_y: false,
        }
    }

    /// Panels side by side in one row
    pub fn row(title: impl Into<String>, panels: Vec<Panel>) -> Self {
        Self {
            title: title.into(),
            layout: (1, panels.len()),
            size: None,
            panels,
            share_y: false,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_shared_y(mut self) -> Self {
        self.share_y = true;
        self
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Round to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Descriptive statistics of `values` rounded to 3 decimals: count, mean,
/// std (sample), min, quartiles and max. NaNs are ignored.
pub fn describe(title: impl Into<String>, values: &[f64]) -> SummaryTable {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let count = n as f64;
    let (mean, std, min, max) = if n == 0 {
        (f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    } else {
        let mean = sorted.iter().sum::<f64>() / count;
        let std = if n > 1 {
            (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0)).sqrt()
        } else {
            f64::NAN
        };
        (mean, std, sorted[0], sorted[n - 1])
    };

    let rows = vec![
        ("count".to_string(), count),
        ("mean".to_string(), round_to(mean, 3)),
        ("std".to_string(), round_to(std, 3)),
        ("min".to_string(), round_to(min, 3)),
        ("25%".to_string(), round_to(quantile(&sorted, 0.25), 3)),
        ("50%".to_string(), round_to(quantile(&sorted, 0.50), 3)),
        ("75%".to_string(), round_to(quantile(&sorted, 0.75), 3)),
        ("max".to_string(), round_to(max, 3)),
    ];

    SummaryTable {
        title: title.into(),
        rows,
    }
}

/// Linearly interpolated quantile of already sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let table = describe("weight", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(table.get("count"), Some(4.0));
        assert_eq!(table.get("mean"), Some(2.5));
        assert_eq!(table.get("std"), Some(1.291));
        assert_eq!(table.get("min"), Some(1.0));
        assert_eq!(table.get("25%"), Some(1.75));
        assert_eq!(table.get("50%"), Some(2.5));
        assert_eq!(table.get("75%"), Some(3.25));
        assert_eq!(table.get("max"), Some(4.0));
    }

    #[test]
    fn test_describe_empty() {
        let table = describe("empty", &[]);
        assert_eq!(table.get("count"), Some(0.0));
        assert!(table.get("mean").unwrap().is_nan());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 3), 0.123);
        assert_eq!(round_to(-1.9996, 3), -2.0);
    }

    #[test]
    fn test_figure_layouts() {
        let panels = vec![Panel::new(PanelKind::Line), Panel::new(PanelKind::Line)];
        assert_eq!(Figure::column("a", panels.clone()).layout, (2, 1));
        assert_eq!(Figure::row("b", panels).layout, (1, 2));
    }

    #[test]
    fn test_figure_json() {
        let figure = Figure::single(
            "roc",
            Panel::new(PanelKind::Line)
                .with_series(PlotSeries::line("ROC curve", vec![0.0, 1.0], vec![0.0, 1.0]))
                .with_reference_line(ReferenceLine::zero(Axis::Horizontal)),
        );
        let json = figure.to_json().unwrap();
        assert!(json.contains("\"kind\": \"line\""));
        assert!(json.contains("ROC curve"));
    }
}
