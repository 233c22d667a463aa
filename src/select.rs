use itertools::Itertools;
use log::{debug, warn};
use ordered_float::NotNan;

use crate::error::Result;
use crate::table::Table;

/// How many countries are taken from each end of the ranking.
pub(crate) const PER_SIDE: usize = 3;

/// Representative countries for a per-country chart: the anchors, then the
/// `PER_SIDE` smallest and the `PER_SIDE` largest entities by `metric` in the
/// latest year of `table`.
///
/// Anchors always come first. Neither walk picks an anchor or an entity that
/// is already selected, so the result has no duplicates. With fewer than
/// `2 * PER_SIDE` non-anchor entities the list is shorter than anchors plus
/// `2 * PER_SIDE`: the largest side only gets what the smallest side left.
pub(crate) fn select_countries(
    table: &Table,
    metric: &str,
    anchors: &[String],
) -> Result<Vec<String>> {
    let (entity, year) = table.key_indices()?;
    let value = table.column_index(metric)?;

    let mut selection: Vec<String> = anchors.iter().unique().cloned().collect();
    let Some(latest) = table.max_year()? else {
        return Ok(selection);
    };

    let mut skipped = 0usize;
    let mut ranked: Vec<(NotNan<f64>, &str)> = Vec::new();
    for row in table.rows() {
        if row.value(year).as_year() != Some(latest) {
            continue;
        }
        let Some(name) = row.value(entity).as_text() else {
            continue;
        };
        match row.value(value).as_number().and_then(|v| NotNan::new(v).ok()) {
            Some(v) => ranked.push((v, name)),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{skipped} entities have no {metric} value in {latest} and are not ranked");
    }
    // Ties fall back to the entity name so the order is stable.
    ranked.sort();

    let smallest = pick(ranked.iter().map(|(_, e)| *e), &selection);
    selection.extend(smallest);
    let largest = pick(ranked.iter().rev().map(|(_, e)| *e), &selection);
    selection.extend(largest);

    debug!(
        "Selected by {metric} in {latest}: {}",
        selection.iter().join(", ")
    );
    Ok(selection)
}

fn pick<'a>(ordered: impl Iterator<Item = &'a str>, taken: &[String]) -> Vec<String> {
    ordered
        .filter(|e| !taken.iter().any(|t| t == e))
        .unique()
        .take(PER_SIDE)
        .map(str::to_string)
        .collect()
}
