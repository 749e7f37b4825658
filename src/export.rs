//! CSV export of the statistics tables.

use crate::categories::CategoryStore;
use crate::errors::Result;
use crate::stats::{build_breakdown, StatsAggregate, Window};
use chrono::{DateTime, Local, Utc};
use csv::{Terminator, WriterBuilder};

/// `45 min`, or with `show_hours` and at least an hour: `2h` / `2h 5min`.
pub fn format_time(minutes: u64, show_hours: bool) -> String {
    if !show_hours || minutes < 60 {
        return format!("{minutes} min");
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {mins}min")
    }
}

pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

pub fn export_csv(
    categories: &CategoryStore,
    stats: &StatsAggregate,
    window: Window,
    now: DateTime<Utc>,
) -> Result<CsvExport> {
    let breakdown = build_breakdown(categories, stats, window);
    let is_today = window == Window::Today;
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let title = if is_today { "Today" } else { "All-Time" };
    writer.write_record([format!("Call Statistics Report - {title}")])?;
    writer.write_record([format!("Time Window: {}", time_window(stats.timestamps(window)))])?;
    writer.write_record([format!("Total Calls: {}", breakdown.total_calls)])?;

    if is_today {
        writer.write_record([
            "Main Category",
            "Subcategory",
            "Calls",
            "Percentage",
            "Inbound (min)",
            "Outbound (min)",
            "Total (min)",
        ])?;
    } else {
        writer.write_record([
            "Main Category",
            "Subcategory",
            "Calls",
            "Percentage",
            "Inbound",
            "Outbound",
            "Total",
            "Avg per Call",
        ])?;
    }

    for main in &breakdown.categories {
        let percentage = format!("{:.1}%", main.percentage);
        let mut main_row = vec![fold_umlauts(&main.name), String::new(), String::new(), percentage];
        main_row.resize(if is_today { 7 } else { 8 }, String::new());
        writer.write_record(&main_row)?;

        for sub in &main.subcategories {
            let stats = sub.stats;
            let mut row = vec![
                String::new(),
                fold_umlauts(&sub.name),
                stats.calls.to_string(),
                String::new(),
            ];
            if is_today {
                row.extend([
                    stats.inbound.to_string(),
                    stats.outbound.to_string(),
                    stats.total_minutes().to_string(),
                ]);
            } else {
                row.extend([
                    format_time(stats.inbound, true),
                    format_time(stats.outbound, true),
                    format_time(stats.total_minutes(), true),
                    format_time(sub.average_minutes, false),
                ]);
            }
            writer.write_record(&row)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;

    Ok(CsvExport {
        filename: format!(
            "call-stats-{}-{}.csv",
            window.as_str(),
            now.format("%Y-%m-%dT%H-%M-%S")
        ),
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn time_window(timestamps: &[String]) -> String {
    let mut parsed: Vec<DateTime<Utc>> = timestamps
        .iter()
        .filter_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc))
        .collect();
    parsed.sort();

    match (parsed.first(), parsed.last()) {
        (Some(first), Some(last)) => format!("{} - {}", local_minute(first), local_minute(last)),
        _ => "No calls logged yet".to_string(),
    }
}

fn local_minute(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d.%m.%Y %H.%M").to_string()
}

fn fold_umlauts(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'ä' => 'a',
            'Ä' => 'A',
            'ö' => 'o',
            'Ö' => 'O',
            other => other,
        })
        .collect()
}
