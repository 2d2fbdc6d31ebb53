use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use crate::summary::{round2, RootSummary, Unit};

/// Converts root summaries to a fixed width table.
///
/// # Errors
///
/// This function uses [`writeln`] to write to the output [`String`] that is
/// returned. It can only fail if any of these [`writeln`] fails.
pub fn to_table(summaries: &[RootSummary], unit: Unit) -> Result<String> {
    let mut output = String::default();

    let total = unit.to_string();
    let used = format!("{} used", unit);
    let available = format!("{} available", unit);

    writeln!(
        output,
        "{:<20}{:>10}{:>10}{:>10}{:>20}{:>30}",
        "Crush root", "OSDs", total, used, available, "Average utilization",
    )?;
    writeln!(output, "{:-^100}", "")?;

    for summary in summaries {
        writeln!(
            output,
            "{:<20}{:>10}{:>10.2}{:>10.2}{:>20.2}{:>29.2}%",
            summary.name(),
            summary.osds(),
            summary.total(unit),
            summary.used(unit),
            summary.available(unit),
            round2(summary.average_utilization()),
        )?;
    }

    Ok(output)
}

#[derive(Debug, Serialize)]
struct RootRow<'a> {
    root: &'a str,
    osds: usize,
    unit: Unit,
    total: f64,
    used: f64,
    available: f64,
    average_utilization: f64,
}

impl<'a> RootRow<'a> {
    fn new(summary: &'a RootSummary, unit: Unit) -> Self {
        Self {
            root: summary.name(),
            osds: summary.osds(),
            unit,
            total: summary.total(unit),
            used: summary.used(unit),
            available: summary.available(unit),
            average_utilization: round2(summary.average_utilization()),
        }
    }
}

/// Converts root summaries to a pretty printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(summaries: &[RootSummary], unit: Unit) -> Result<String> {
    let rows = summaries
        .iter()
        .map(|summary| RootRow::new(summary, unit))
        .collect::<Vec<_>>();

    Ok(serde_json::to_string_pretty(&rows)?)
}
