//! Chart descriptions and the data they pull out of a table.
//!
//! A `Chart` is a plain value: what to plot and how to label it. `prepare`
//! turns a chart and a table into `PlotData`, which is all the renderer sees.

use std::collections::HashMap;
use std::ops::Range;

use itertools::Itertools;
use plotters::style::RGBColor;

use crate::config::{Settings, DEFAULT_PALETTE};
use crate::error::{PipelineError, Result};
use crate::table::{Table, Value};

/// Entity name to series color.
pub(crate) type ColorMap = Vec<(String, RGBColor)>;

/// Pairs a selection with colors, in order. Extra entities get no color.
pub(crate) fn color_map(entities: &[String], colors: &[RGBColor]) -> ColorMap {
    entities.iter().cloned().zip(colors.iter().copied()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChartKind {
    Line,
    Box,
    Scatter,
}

#[derive(Debug, Clone)]
pub(crate) struct Chart {
    pub(crate) name: String,
    pub(crate) kind: ChartKind,
    pub(crate) x: String,
    pub(crate) y: Vec<String>,
    pub(crate) color: Option<String>,
    pub(crate) title: String,
    pub(crate) labels: Vec<(String, String)>,
    pub(crate) color_map: ColorMap,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) font_size: u32,
    pub(crate) marginal_histograms: bool,
}

impl Chart {
    pub(crate) fn new(name: &str, kind: ChartKind, settings: &Settings) -> Self {
        Chart {
            name: name.to_string(),
            kind,
            x: String::new(),
            y: Vec::new(),
            color: None,
            title: String::new(),
            labels: Vec::new(),
            color_map: Vec::new(),
            width: settings.width,
            height: settings.height,
            font_size: settings.font_size,
            marginal_histograms: false,
        }
    }

    pub(crate) fn x(mut self, column: &str) -> Self {
        self.x = column.to_string();
        self
    }

    pub(crate) fn y(mut self, columns: &[&str]) -> Self {
        self.y = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub(crate) fn color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }

    pub(crate) fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub(crate) fn labels(mut self, labels: &[(&str, &str)]) -> Self {
        self.labels
            .extend(labels.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    pub(crate) fn color_map(mut self, map: ColorMap) -> Self {
        self.color_map = map;
        self
    }

    pub(crate) fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub(crate) fn marginal_histograms(mut self) -> Self {
        self.marginal_histograms = true;
        self
    }

    /// Display label for a column, falling back to the column name.
    pub(crate) fn label<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels
            .iter()
            .rev()
            .find(|(k, _)| k == column)
            .map_or(column, |(_, v)| v.as_str())
    }

    /// Label of the single y axis; several y columns share the `value` label.
    pub(crate) fn y_label(&self) -> &str {
        match self.y.as_slice() {
            [one] => self.label(one),
            _ => self.label("value"),
        }
    }

    fn mapped_color(&self, key: &str) -> Option<RGBColor> {
        self.color_map
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, c)| *c)
    }

    fn map_position(&self, key: &str) -> usize {
        self.color_map
            .iter()
            .position(|(name, _)| name == key)
            .unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Series {
    pub(crate) name: String,
    pub(crate) color: RGBColor,
    pub(crate) points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoxGroup {
    pub(crate) category: String,
    pub(crate) values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScatterPoint {
    pub(crate) x: f64,
    pub(crate) y: f64,
    /// Position of the color value within its range, 0.0 to 1.0.
    pub(crate) shade: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlotData {
    Lines {
        series: Vec<Series>,
        legend: String,
        x_range: Range<f64>,
        y_range: Range<f64>,
    },
    Boxes {
        groups: Vec<BoxGroup>,
        y_range: Range<f64>,
    },
    Scatter {
        points: Vec<ScatterPoint>,
        /// Lowest and highest value of the color column, if there is one.
        shade_range: Option<(f64, f64)>,
        x_range: Range<f64>,
        y_range: Range<f64>,
    },
}

pub(crate) fn prepare(chart: &Chart, table: &Table) -> Result<PlotData> {
    match chart.kind {
        ChartKind::Line => prepare_lines(chart, table),
        ChartKind::Box => prepare_boxes(chart, table),
        ChartKind::Scatter => prepare_scatter(chart, table),
    }
}

fn prepare_lines(chart: &Chart, table: &Table) -> Result<PlotData> {
    let x = table.column_index(&chart.x)?;
    let ys = chart
        .y
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;

    let mut series: Vec<Series> = match &chart.color {
        Some(column) => {
            let group = table.column_index(column)?;
            let y = *ys
                .first()
                .ok_or_else(|| PipelineError::MissingColumn("y".to_string()))?;

            let mut order: Vec<String> = Vec::new();
            let mut points: HashMap<String, Vec<(f64, f64)>> = HashMap::new();
            for row in table.rows() {
                let key = row.value(group);
                if matches!(key, Value::Missing) {
                    continue;
                }
                let (Some(px), Some(py)) = (row.value(x).as_number(), row.value(y).as_number())
                else {
                    continue;
                };
                let key = key.label();
                if !points.contains_key(&key) {
                    order.push(key.clone());
                }
                points.entry(key).or_default().push((px, py));
            }

            // Mapped entities first, in map order; the rest as they appeared.
            order.sort_by_key(|k| chart.map_position(k));
            order
                .into_iter()
                .enumerate()
                .map(|(i, name)| Series {
                    color: chart
                        .mapped_color(&name)
                        .unwrap_or(DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()]),
                    points: points.remove(&name).unwrap_or_default(),
                    name,
                })
                .collect()
        }
        None => chart
            .y
            .iter()
            .zip(&ys)
            .enumerate()
            .map(|(i, (name, &y))| Series {
                name: name.clone(),
                color: chart
                    .mapped_color(name)
                    .unwrap_or(DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()]),
                points: table
                    .rows()
                    .filter_map(|row| Some((row.value(x).as_number()?, row.value(y).as_number()?)))
                    .collect(),
            })
            .collect(),
    };

    series.retain(|s| !s.points.is_empty());
    for s in &mut series {
        s.points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let all = || series.iter().flat_map(|s| s.points.iter());
    let x_range = padded_range(all().map(|p| p.0));
    let y_range = padded_range(all().map(|p| p.1));
    let (Some(x_range), Some(y_range)) = (x_range, y_range) else {
        return Err(PipelineError::EmptyChart(chart.name.clone()));
    };

    let legend = match &chart.color {
        Some(column) => chart.label(column).to_string(),
        None => chart.label("variable").to_string(),
    };

    Ok(PlotData::Lines {
        series,
        legend,
        x_range,
        y_range,
    })
}

fn prepare_boxes(chart: &Chart, table: &Table) -> Result<PlotData> {
    let x = table.column_index(&chart.x)?;
    let y = table.column_index(
        chart
            .y
            .first()
            .ok_or_else(|| PipelineError::MissingColumn("y".to_string()))?,
    )?;

    // Categories sort numerically when they are numbers (years), else by name.
    let groups: Vec<BoxGroup> = table
        .rows()
        .filter_map(|row| {
            let key = row.value(x);
            if matches!(key, Value::Missing) {
                return None;
            }
            let value = row.value(y).as_number()?;
            Some(((key.as_number().map(ordered_key), key.label()), value))
        })
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|((_, category), values)| BoxGroup { category, values })
        .collect();

    let y_range = padded_range(groups.iter().flat_map(|g| g.values.iter().copied()))
        .ok_or_else(|| PipelineError::EmptyChart(chart.name.clone()))?;

    Ok(PlotData::Boxes { groups, y_range })
}

fn prepare_scatter(chart: &Chart, table: &Table) -> Result<PlotData> {
    let x = table.column_index(&chart.x)?;
    let y = table.column_index(
        chart
            .y
            .first()
            .ok_or_else(|| PipelineError::MissingColumn("y".to_string()))?,
    )?;
    let shade = chart
        .color
        .as_deref()
        .map(|c| table.column_index(c))
        .transpose()?;

    let raw: Vec<(f64, f64, Option<f64>)> = table
        .rows()
        .filter_map(|row| {
            let px = row.value(x).as_number()?;
            let py = row.value(y).as_number()?;
            Some((px, py, shade.and_then(|i| row.value(i).as_number())))
        })
        .collect();

    let shade_range = raw
        .iter()
        .filter_map(|p| p.2)
        .minmax()
        .into_option();
    let points = raw
        .iter()
        .map(|&(px, py, s)| ScatterPoint {
            x: px,
            y: py,
            shade: match (s, shade_range) {
                (Some(v), Some((lo, hi))) if hi > lo => (v - lo) / (hi - lo),
                _ => 0.0,
            },
        })
        .collect();

    let x_range = padded_range(raw.iter().map(|p| p.0));
    let y_range = padded_range(raw.iter().map(|p| p.1));
    let (Some(x_range), Some(y_range)) = (x_range, y_range) else {
        return Err(PipelineError::EmptyChart(chart.name.clone()));
    };

    Ok(PlotData::Scatter {
        points,
        shade_range,
        x_range,
        y_range,
    })
}

// Category keys need `Ord`; years are whole numbers so this is lossless for them.
fn ordered_key(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}

/// Smallest range covering `values` with 5% headroom on each side.
pub(crate) fn padded_range(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    let (lo, hi) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    Some(lo - pad..hi + pad)
}

/// Equal-width bins over `range`: `(start, end, count)`.
pub(crate) fn histogram(
    values: impl Iterator<Item = f64>,
    range: &Range<f64>,
    bins: usize,
) -> Vec<(f64, f64, u32)> {
    let width = (range.end - range.start) / bins as f64;
    let mut counts = vec![0u32; bins];
    for v in values {
        if !range.contains(&v) && v != range.end {
            continue;
        }
        let i = (((v - range.start) / width) as usize).min(bins - 1);
        counts[i] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let start = range.start + width * i as f64;
            (start, start + width, c)
        })
        .collect()
}
