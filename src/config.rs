use std::path::PathBuf;

use plotters::style::RGBColor;

/// Paths and presentation constants for one run. There is no external
/// configuration; `main` builds the defaults and passes them down.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) data_dir: PathBuf,
    pub(crate) images_dir: PathBuf,
    pub(crate) plots_dir: PathBuf,
    /// Countries pinned to the front of every selection.
    pub(crate) anchors: Vec<String>,
    /// Country of the introductory retirement chart.
    pub(crate) featured_country: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) font_size: u32,
    /// Colors handed out to a selection, in selection order.
    pub(crate) selection_colors: Vec<RGBColor>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("data"),
            images_dir: PathBuf::from("images"),
            plots_dir: PathBuf::from("plots"),
            anchors: vec!["Portugal".to_string(), "Spain".to_string()],
            featured_country: "Portugal".to_string(),
            width: 1000,
            height: 650,
            font_size: 20,
            selection_colors: vec![
                RGBColor(255, 0, 0),
                RGBColor(0, 128, 0),
                RGBColor(0x23, 0x46, 0xa6),
                RGBColor(0x56, 0x7f, 0xd9),
                RGBColor(0xa2, 0xc8, 0xff),
                RGBColor(0xff, 0x7e, 0x26),
                RGBColor(0xff, 0x9c, 0x59),
                RGBColor(0xff, 0xc9, 0x9d),
            ],
        }
    }
}

impl Settings {
    pub(crate) fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

pub(crate) const WOMEN_RETIREMENT_CSV: &str = "average-effective-retirement-women.csv";
pub(crate) const MEN_RETIREMENT_CSV: &str = "average-effective-retirement-men.csv";
pub(crate) const LIFE_EXPECTANCY_CSV: &str = "life-expectancy.csv";
pub(crate) const HALE_CSV: &str = "healthy-life-expectancy-at-birth.csv";

pub(crate) const WOMEN_RENAME: (&str, &str) =
    ("Average effective age of retirement, women (OECD)", "Women");
pub(crate) const MEN_RENAME: (&str, &str) =
    ("Average effective age of retirement, men (OECD)", "Men");
pub(crate) const EXPECTANCY_RENAME: (&str, &str) =
    ("Period life expectancy at birth - Sex: total - Age: 0", "Expectancy");
pub(crate) const HALE_RENAME: (&str, &str) =
    ("Healthy life expectancy (HALE) at birth (years) - Sex: both sexes", "HALE");

/// Axis and legend labels shared by the country charts.
pub(crate) const LABELS: &[(&str, &str)] = &[
    ("Expectancy", "Life Expectancy (Years)"),
    ("Retirement", "Retirement Age"),
    ("Entity", "Country"),
    ("Sick", "Life Expectancy - HALE (Years)"),
    ("Retired", "Years spent in Retirement"),
];

/// Series colors when a chart has no explicit color map.
pub(crate) const DEFAULT_PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];
