use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::chart::{histogram, prepare, BoxGroup, Chart, PlotData, ScatterPoint, Series};
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::table::Table;

const HISTOGRAM_BINS: usize = 20;
const LOW_SHADE: RGBColor = RGBColor(13, 8, 135);
const HIGH_SHADE: RGBColor = RGBColor(240, 249, 33);

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// The two folders every chart is written to.
#[derive(Debug, Clone)]
pub(crate) struct OutputDirs {
    images: PathBuf,
    plots: PathBuf,
}

impl OutputDirs {
    /// Creates the image and page folders if they are missing. The paths
    /// created here are the same ones `render` writes to.
    pub(crate) fn ensure(settings: &Settings) -> Result<Self> {
        for dir in [&settings.images_dir, &settings.plots_dir] {
            if !dir.is_dir() {
                fs::create_dir_all(dir).map_err(|source| PipelineError::DirectoryCreate {
                    path: dir.clone(),
                    source,
                })?;
                debug!("Created output directory {}", dir.display());
            }
        }
        Ok(OutputDirs {
            images: settings.images_dir.clone(),
            plots: settings.plots_dir.clone(),
        })
    }

    pub(crate) fn image_path(&self, name: &str) -> PathBuf {
        self.images.join(format!("{name}.png"))
    }

    pub(crate) fn page_path(&self, name: &str) -> PathBuf {
        self.plots.join(format!("{name}.html"))
    }
}

/// Writes `images/<name>.png` and `plots/<name>.html` for one chart,
/// replacing any previous version.
pub(crate) fn render(chart: &Chart, table: &Table, dirs: &OutputDirs) -> Result<()> {
    let data = prepare(chart, table)?;
    let size = (chart.width, chart.height);
    let failed = |e: &dyn std::fmt::Display| PipelineError::Render {
        chart: chart.name.clone(),
        reason: e.to_string(),
    };

    let image = dirs.image_path(&chart.name);
    {
        let root = BitMapBackend::new(&image, size).into_drawing_area();
        draw(&root, chart, &data).map_err(|e| failed(&e))?;
        root.present().map_err(|e| failed(&e))?;
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root, chart, &data).map_err(|e| failed(&e))?;
        root.present().map_err(|e| failed(&e))?;
    }

    let page = dirs.page_path(&chart.name);
    write_page(&page, &chart.title, &svg)?;

    info!(
        "Chart {} saved to {} and {}",
        chart.name,
        image.display(),
        page.display()
    );
    Ok(())
}

fn write_page(path: &Path, title: &str, svg: &str) -> Result<()> {
    fs::write(path, html_page(title, svg)).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Minimal standalone page around an inline chart.
pub(crate) fn html_page(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8" />
        <title>{title}</title>
    </head>
    <body style="background-color: #6aa4c8; height: 900px; display: flex; justify-content: center; align-items: center;">
        {body}
    </body>
</html>"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    data: &PlotData,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    match data {
        PlotData::Lines {
            series,
            legend,
            x_range,
            y_range,
        } => draw_lines(root, chart, series, legend, x_range.clone(), y_range.clone()),
        PlotData::Boxes { groups, y_range } => draw_boxes(root, chart, groups, y_range.clone()),
        PlotData::Scatter {
            points,
            shade_range,
            x_range,
            y_range,
        } => draw_scatter(
            root,
            chart,
            points,
            *shade_range,
            x_range.clone(),
            y_range.clone(),
        ),
    }
}

fn draw_lines<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    series: &[Series],
    legend: &str,
    x_range: std::ops::Range<f64>,
    y_range: std::ops::Range<f64>,
) -> DrawResult<DB> {
    let font = f64::from(chart.font_size);
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", font * 1.2))
        .margin(20)
        .x_label_area_size(chart.font_size * 3)
        .y_label_area_size(chart.font_size * 4)
        .build_cartesian_2d(x_range, y_range)?;

    ctx.configure_mesh()
        .x_desc(chart.label(&chart.x))
        .y_desc(chart.y_label())
        .label_style(("sans-serif", font * 0.75))
        .axis_desc_style(("sans-serif", font))
        .x_label_formatter(&|v| tick(*v))
        .draw()?;

    // Heading row for the legend.
    ctx.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
        .label(legend)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x, y)], WHITE.mix(0.0)));

    for s in series {
        let color = s.color;
        ctx.draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(3)))?
            .label(s.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
    }

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", font * 0.75))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_boxes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    groups: &[BoxGroup],
    y_range: std::ops::Range<f64>,
) -> DrawResult<DB> {
    let font = f64::from(chart.font_size);
    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    let count = groups.len() as u32;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", font * 1.2))
        .margin(20)
        .x_label_area_size(chart.font_size * 3)
        .y_label_area_size(chart.font_size * 4)
        .build_cartesian_2d(
            (0u32..count).into_segmented(),
            y_range.start as f32..y_range.end as f32,
        )?;

    let category_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            categories.get(*i as usize).map(|c| c.to_string()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len())
        .x_desc(chart.label(&chart.x))
        .y_desc(chart.y_label())
        .label_style(("sans-serif", font * 0.75))
        .axis_desc_style(("sans-serif", font))
        .x_label_formatter(&category_label)
        .draw()?;

    let width = (chart.width * 6 / 10 / count.max(1)).clamp(4, 60);
    let color = crate::config::DEFAULT_PALETTE[0];
    ctx.draw_series(groups.iter().enumerate().map(|(i, g)| {
        Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &Quartiles::new(&g.values))
            .width(width)
            .whisker_width(0.5)
            .style(color.stroke_width(2))
    }))?;

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    points: &[ScatterPoint],
    shade_range: Option<(f64, f64)>,
    x_range: std::ops::Range<f64>,
    y_range: std::ops::Range<f64>,
) -> DrawResult<DB> {
    let font = f64::from(chart.font_size);
    let area = root.titled(&chart.title, ("sans-serif", font * 1.2))?;
    let x_label_size = chart.font_size * 3;
    let y_label_size = chart.font_size * 4;

    let (main, top, right) = if chart.marginal_histograms {
        let (w, h) = area.dim_in_pixel();
        let (top, rest) = area.split_vertically(h / 5);
        let (main, right) = rest.split_horizontally(w * 4 / 5);
        let (top, _) = top.split_horizontally(w * 4 / 5);
        (main, Some(top), Some(right))
    } else {
        (area, None, None)
    };

    let mut ctx = ChartBuilder::on(&main)
        .margin(10)
        .x_label_area_size(x_label_size)
        .y_label_area_size(y_label_size)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    ctx.configure_mesh()
        .x_desc(chart.label(&chart.x))
        .y_desc(chart.y_label())
        .label_style(("sans-serif", font * 0.75))
        .axis_desc_style(("sans-serif", font))
        .draw()?;

    ctx.draw_series(
        points
            .iter()
            .map(|p| Circle::new((p.x, p.y), 4, shade_color(p.shade).mix(0.8).filled())),
    )?;

    if let (Some(column), Some((lo, hi))) = (chart.color.as_deref(), shade_range) {
        let name = chart.label(column);
        for (value, shade) in [(lo, 0.0), (hi, 1.0)] {
            let color = shade_color(shade);
            ctx.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
                .label(format!("{name} {}", tick(value)))
                .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
        }
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(("sans-serif", font * 0.75))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    let bar = DEFAULT_BAR.mix(0.7).filled();
    if let Some(top) = top {
        let bins = histogram(points.iter().map(|p| p.x), &x_range, HISTOGRAM_BINS);
        let max = bins.iter().map(|b| b.2).max().unwrap_or(0).max(1);
        let mut hist = ChartBuilder::on(&top)
            .margin(10)
            .y_label_area_size(y_label_size)
            .build_cartesian_2d(x_range.clone(), 0u32..max)?;
        hist.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(3)
            .label_style(("sans-serif", font * 0.6))
            .draw()?;
        hist.draw_series(
            bins.iter()
                .map(|&(start, end, n)| Rectangle::new([(start, 0), (end, n)], bar)),
        )?;
    }
    if let Some(right) = right {
        let bins = histogram(points.iter().map(|p| p.y), &y_range, HISTOGRAM_BINS);
        let max = bins.iter().map(|b| b.2).max().unwrap_or(0).max(1);
        let mut hist = ChartBuilder::on(&right)
            .margin(10)
            .x_label_area_size(x_label_size)
            .build_cartesian_2d(0u32..max, y_range.clone())?;
        hist.configure_mesh()
            .disable_mesh()
            .disable_y_axis()
            .x_labels(3)
            .label_style(("sans-serif", font * 0.6))
            .draw()?;
        hist.draw_series(
            bins.iter()
                .map(|&(start, end, n)| Rectangle::new([(0, start), (n, end)], bar)),
        )?;
    }

    Ok(())
}

const DEFAULT_BAR: RGBColor = RGBColor(99, 110, 250);

/// Linear blend between the low and high ends of the shade scale.
fn shade_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(
        mix(LOW_SHADE.0, HIGH_SHADE.0),
        mix(LOW_SHADE.1, HIGH_SHADE.1),
        mix(LOW_SHADE.2, HIGH_SHADE.2),
    )
}

// Whole numbers (years) print without decimals.
fn tick(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
