//! Plain-text report bodies.
//!
//! A body is a header (kind, period, pool, formation time), an optional block
//! of data collected for the report kind, and the author's notes.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::models::{FeedingRecord, GrowthRecord, MonitoringReading, Pool, ReportKind, Sensor};

/// At most this many monitoring readings are copied into a body.
pub const MONITORING_LINES: usize = 10;

const STAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Data gathered for one report kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected {
    Monitoring(Vec<MonitoringReading>),
    Feeding(Vec<FeedingRecord>),
    Growth(Vec<GrowthRecord>),
    Equipment(Vec<Sensor>),
    Nothing,
}

pub struct BodyParts<'a> {
    pub kind: ReportKind,
    pub pool: &'a Pool,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub formed_at: DateTime<Utc>,
    pub collected: &'a Collected,
    pub notes: &'a str,
}

pub fn render(parts: &BodyParts<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Report: {}", parts.kind.label());
    let _ = writeln!(out, "Period: {} - {}", parts.period_start, parts.period_end);
    let _ = writeln!(out, "Pool: {} ({})", parts.pool.name, parts.pool.species);
    let _ = writeln!(out, "Formed at: {}", parts.formed_at.format(STAMP));
    out.push('\n');

    match parts.collected {
        Collected::Monitoring(rows) => monitoring(&mut out, rows),
        Collected::Feeding(rows) => feeding(&mut out, rows),
        Collected::Growth(rows) => growth(&mut out, rows),
        Collected::Equipment(sensors) => equipment(&mut out, sensors),
        Collected::Nothing => {}
    }

    let _ = write!(out, "\nADDITIONAL NOTES:\n{}", parts.notes.trim());
    out
}

fn monitoring(out: &mut String, rows: &[MonitoringReading]) {
    if rows.is_empty() {
        out.push_str("No monitoring data for the period\n");
        return;
    }
    out.push_str("MONITORING DATA:\n");
    for r in rows.iter().take(MONITORING_LINES) {
        let _ = writeln!(
            out,
            "- {}: {} = {}{} ({})",
            r.recorded_at.format(STAMP),
            r.sensor_type,
            r.value,
            unit_suffix(r.sensor_type.unit()),
            r.status
        );
    }
}

fn feeding(out: &mut String, rows: &[FeedingRecord]) {
    if rows.is_empty() {
        out.push_str("No feeding data for the period\n");
        return;
    }
    out.push_str("FEEDING DATA:\n");
    let mut total = 0.0;
    for f in rows {
        let _ = writeln!(
            out,
            "- {}: {} - {} kg",
            f.fed_at.format(STAMP),
            f.feed_type,
            f.amount_kg
        );
        total += f.amount_kg;
    }
    let _ = writeln!(out, "Total feed used: {total:.2} kg");
}

fn growth(out: &mut String, rows: &[GrowthRecord]) {
    if rows.is_empty() {
        out.push_str("No growth data for the period\n");
        return;
    }
    out.push_str("FISH GROWTH DATA:\n");
    for g in rows {
        let _ = writeln!(
            out,
            "- {}: average weight {} g, count {}",
            g.caught_on, g.average_weight_g, g.fish_count
        );
    }
}

fn equipment(out: &mut String, sensors: &[Sensor]) {
    if sensors.is_empty() {
        out.push_str("No sensors installed\n");
        return;
    }
    out.push_str("INSTALLED SENSORS:\n");
    for s in sensors {
        let range = match (s.range_min, s.range_max) {
            (Some(lo), Some(hi)) => format!("{lo}..{hi}"),
            (Some(lo), None) => format!(">= {lo}"),
            (None, Some(hi)) => format!("<= {hi}"),
            (None, None) => "no range".to_owned(),
        };
        let _ = writeln!(
            out,
            "- #{} {} {} ({}), installed {}",
            s.id, s.sensor_type, s.model, range, s.installed_on
        );
    }
}

fn unit_suffix(unit: &str) -> String {
    if unit.is_empty() {
        String::new()
    } else {
        format!(" {unit}")
    }
}
