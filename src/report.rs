use crate::core::dashboard::DashboardView;
use crate::core::normalizer::display_key;
use crate::core::stats::is_closing_soon;
use crate::utils::error::Result;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    key: String,
    announcement_id: &'a str,
    category: &'a str,
    title: &'a str,
    institution: &'a str,
    closing_date: &'a str,
    closing_time: &'a str,
    urgent: bool,
    closing_soon: bool,
    detail_url: &'a str,
}

/// Renders the view; `now` and `soon` drive the closing-soon flag.
pub fn render(
    view: &DashboardView,
    format: OutputFormat,
    now: NaiveDateTime,
    soon: Duration,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(view, now, soon)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
        OutputFormat::Csv => render_csv(view, now, soon),
    }
}

fn render_table(view: &DashboardView, now: NaiveDateTime, soon: Duration) -> String {
    let stats = &view.statistics;
    let mut lines = vec![format!(
        "전체 {}건 | 긴급 {}건 | 오늘 마감 {}건",
        stats.total, stats.urgent, stats.closing_today
    )];

    if let Some(error) = &view.error {
        lines.push(error.clone());
        return lines.join("\n");
    }

    for record in &view.records {
        let mut flags = String::new();
        if record.is_urgent() {
            flags.push('!');
        }
        if is_closing_soon(record, now, soon) {
            flags.push('*');
        }

        let closing = match record.closing_at() {
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => "-".to_string(),
        };

        lines.push(format!(
            "{:<2} {:<14} {:<6} {} | {} | {}",
            flags,
            record.announcement_id.as_deref().unwrap_or("-"),
            record.category.as_deref().unwrap_or("-"),
            record.title,
            record.announcing_institution.as_deref().unwrap_or("-"),
            closing
        ));
    }

    lines.join("\n")
}

fn render_csv(view: &DashboardView, now: NaiveDateTime, soon: Duration) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for (index, record) in view.records.iter().enumerate() {
        writer.serialize(CsvRow {
            key: display_key(index, record),
            announcement_id: record.announcement_id.as_deref().unwrap_or(""),
            category: record.category.as_deref().unwrap_or(""),
            title: &record.title,
            institution: record.announcing_institution.as_deref().unwrap_or(""),
            closing_date: record.closing_date.as_deref().unwrap_or(""),
            closing_time: record.closing_time.as_deref().unwrap_or(""),
            urgent: record.is_urgent(),
            closing_soon: is_closing_soon(record, now, soon),
            detail_url: record.detail_url.as_deref().unwrap_or(""),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
