mod chart;
mod config;
mod derive;
mod error;
mod load_clean;
mod merge;
mod models;
mod render;
mod select;
mod table;

use std::process;

use log::{error, info};

use crate::chart::{color_map, Chart, ChartKind};
use crate::config::{
    Settings, EXPECTANCY_RENAME, HALE_CSV, HALE_RENAME, LABELS, LIFE_EXPECTANCY_CSV,
    MEN_RENAME, MEN_RETIREMENT_CSV, WOMEN_RENAME, WOMEN_RETIREMENT_CSV,
};
use crate::derive::{with_difference, with_mean};
use crate::error::Result;
use crate::load_clean::load_table;
use crate::merge::merge;
use crate::render::{render, OutputDirs};
use crate::select::select_countries;
use crate::table::{Table, ENTITY, YEAR};

/// Per-country line chart of `metric` for the countries selected on it.
fn country_chart(
    settings: &Settings,
    table: &Table,
    name: &str,
    metric: &str,
    title: &str,
) -> Result<(Chart, Table)> {
    let countries = select_countries(table, metric, &settings.anchors)?;
    let chart = Chart::new(name, ChartKind::Line, settings)
        .x(YEAR)
        .y(&[metric])
        .color(ENTITY)
        .title(title)
        .labels(LABELS)
        .color_map(color_map(&countries, &settings.selection_colors));
    Ok((chart, table.filter_entities(&countries)))
}

fn run(settings: &Settings) -> Result<()> {
    let dirs = OutputDirs::ensure(settings)?;

    info!("Stage: retirement tables");
    let women = load_table(settings.data_file(WOMEN_RETIREMENT_CSV))?.renamed(&[WOMEN_RENAME])?;
    let men = load_table(settings.data_file(MEN_RETIREMENT_CSV))?.renamed(&[MEN_RENAME])?;
    let retirement = with_mean(&merge(&women, &men)?, &["Women", "Men"], "Retirement")?;

    let featured = retirement.filter_entities(std::slice::from_ref(&settings.featured_country));
    let chart = Chart::new("PT_Retirement", ChartKind::Line, settings)
        .x(YEAR)
        .y(&["Men", "Women"])
        .title(&format!(
            "Average effective age of retirement in {}",
            settings.featured_country
        ))
        .labels(&[("value", "Age (Years)"), ("variable", "Sex")]);
    render(&chart, &featured, &dirs)?;

    info!("Stage: life expectancy tables");
    let life_exp =
        load_table(settings.data_file(LIFE_EXPECTANCY_CSV))?.renamed(&[EXPECTANCY_RENAME])?;
    let hale = load_table(settings.data_file(HALE_CSV))?.renamed(&[HALE_RENAME])?;
    let life = with_difference(&merge(&life_exp, &hale)?, "Expectancy", "HALE", "Sick")?;

    info!("Stage: years after retirement");
    let df = with_difference(
        &merge(&retirement, &life_exp)?,
        "Expectancy",
        "Retirement",
        "Retired",
    )?;

    info!("Stage: charts");
    let (chart, table) = country_chart(
        settings,
        &life_exp,
        "LifeExpectancy",
        "Expectancy",
        "Life expectancy over the years",
    )?;
    render(&chart, &table, &dirs)?;

    let (chart, table) = country_chart(
        settings,
        &retirement,
        "RetirementAge",
        "Retirement",
        "Effective age of retirement",
    )?;
    render(&chart, &table, &dirs)?;

    let chart = Chart::new("HALEvsLifeExpectancy", ChartKind::Box, settings)
        .x(YEAR)
        .y(&["Sick"])
        .title("Years lived not in \"full health\"")
        .labels(LABELS)
        .size(500, 700);
    render(&chart, &life, &dirs)?;

    let chart = Chart::new("LifeAfterRetirement", ChartKind::Box, settings)
        .x(YEAR)
        .y(&["Retired"])
        .title("Average years left after retirement")
        .labels(LABELS);
    render(&chart, &df, &dirs)?;

    let (chart, table) = country_chart(
        settings,
        &df,
        "LAR_country",
        "Retired",
        "Life after retirement per country",
    )?;
    render(&chart, &table, &dirs)?;

    let chart = Chart::new("Retirement_vs_Expectancy", ChartKind::Scatter, settings)
        .x("Retired")
        .y(&["Expectancy"])
        .color(YEAR)
        .title("Years after Retirement vs Life Expectancy")
        .labels(LABELS)
        .size(settings.width, 700)
        .marginal_histograms();
    render(&chart, &df, &dirs)?;

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::default();
    if let Err(e) = run(&settings) {
        error!("Pipeline stopped: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }

    println!(
        "\n\u{1f389} All good! Check the images and plots folders to see the figures. \u{1f389}\n"
    );
}
