//! Display formatters for timestamps, costs, durations and sizes.
//!
//! Every formatter takes an `Option` and renders a placeholder for missing
//! values ("" for dates, "-" for numbers) so views never branch on presence.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

use crate::pipeline::PipelineStatus;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;
const WEEK_MS: i64 = 604_800_000;

/// Parse an ISO-8601 timestamp. Offsets are honoured; naive values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_local(raw: Option<&str>) -> Option<DateTime<Local>> {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(&Local))
}

/// "just now", "5m ago", "3h ago", "2d ago", or the local date for older values.
pub fn format_relative_time(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(at) = raw.and_then(parse_timestamp) else {
        return String::new();
    };
    let diff = now.signed_duration_since(at).num_milliseconds();

    if diff < MINUTE_MS {
        return "just now".to_string();
    }
    if diff < HOUR_MS {
        return format!("{}m ago", diff / MINUTE_MS);
    }
    if diff < DAY_MS {
        return format!("{}h ago", diff / HOUR_MS);
    }
    if diff < WEEK_MS {
        return format!("{}d ago", diff / DAY_MS);
    }
    at.with_timezone(&Local).format("%-m/%-d/%Y").to_string()
}

/// Local wall-clock time, e.g. `02:15:09 PM`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    parse_local(raw)
        .map(|dt| dt.format("%I:%M:%S %p").to_string())
        .unwrap_or_default()
}

/// Alias of [`format_timestamp`] used by timeline rows.
pub fn format_time(raw: Option<&str>) -> String {
    format_timestamp(raw)
}

/// Local calendar date, e.g. `Jan 5, 2026`.
pub fn format_date(raw: Option<&str>) -> String {
    parse_local(raw)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Local date and time without seconds, e.g. `Jan 5, 02:15 PM`.
pub fn format_date_time(raw: Option<&str>) -> String {
    parse_local(raw)
        .map(|dt| dt.format("%b %-d, %I:%M %p").to_string())
        .unwrap_or_default()
}

pub fn format_cost(cost: Option<f64>) -> String {
    match cost {
        Some(cost) => format!("${cost:.4}"),
        None => "-".to_string(),
    }
}

/// Milliseconds → `850ms`, `1.5s`, `1m 5s`, `1h 1m`.
pub fn format_duration(ms: Option<u64>) -> String {
    let Some(ms) = ms else {
        return "-".to_string();
    };
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    if ms < 60_000 {
        return format!("{:.1}s", ms as f64 / 1000.0);
    }
    if ms < 3_600_000 {
        return format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1_000);
    }
    format!("{}h {}m", ms / 3_600_000, (ms % 3_600_000) / 60_000)
}

/// Integer with `,` thousands separators.
pub fn format_number(num: Option<i64>) -> String {
    let Some(num) = num else {
        return "-".to_string();
    };
    let digits = num.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => "-".to_string(),
    }
}

pub fn format_bytes(bytes: Option<u64>) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let Some(bytes) = bytes else {
        return "-".to_string();
    };
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else {
        format!("{:.1} GB", b / GB)
    }
}

/// Shorten `text` to exactly `max` characters, the last three being `...`.
///
/// Counts characters, not bytes.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Human label for a status value.
pub fn status_label(status: &PipelineStatus) -> &str {
    match status {
        PipelineStatus::Running => "Running",
        PipelineStatus::WaitingApproval => "Waiting Approval",
        PipelineStatus::Completed => "Completed",
        PipelineStatus::Failed => "Failed",
        PipelineStatus::Other(s) => s,
    }
}

/// Semantic tone a front-end maps to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Running,
    Waiting,
    Success,
    Failed,
    Muted,
}

pub fn status_tone(status: &PipelineStatus) -> StatusTone {
    match status {
        PipelineStatus::Running => StatusTone::Running,
        PipelineStatus::WaitingApproval => StatusTone::Waiting,
        PipelineStatus::Completed => StatusTone::Success,
        PipelineStatus::Failed => StatusTone::Failed,
        PipelineStatus::Other(_) => StatusTone::Muted,
    }
}

/// Accept either a bare task id or a task URL and return the id.
pub fn extract_task_id(input: &str) -> String {
    if !input.contains('/') {
        return input.trim().to_string();
    }
    input
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn duration_boundaries() {
        assert_eq!(format_duration(Some(0)), "0ms");
        assert_eq!(format_duration(Some(999)), "999ms");
        assert_eq!(format_duration(Some(1500)), "1.5s");
        assert_eq!(format_duration(Some(65_000)), "1m 5s");
        assert_eq!(format_duration(Some(3_661_000)), "1h 1m");
        assert_eq!(format_duration(None), "-");
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn truncate_produces_exact_length() {
        let out = truncate("hello world", 8);
        assert_eq!(out, "hello...");
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn truncate_counts_characters() {
        let out = truncate("héllo wörld", 7);
        assert_eq!(out, "héll...");
    }

    #[test]
    fn cost_and_percentage() {
        assert_eq!(format_cost(Some(1.5)), "$1.5000");
        assert_eq!(format_cost(Some(0.0)), "$0.0000");
        assert_eq!(format_cost(None), "-");
        assert_eq!(format_percentage(Some(42.0)), "42.0%");
        assert_eq!(format_percentage(None), "-");
    }

    #[test]
    fn bytes_units() {
        assert_eq!(format_bytes(Some(512)), "512 B");
        assert_eq!(format_bytes(Some(1536)), "1.5 KB");
        assert_eq!(format_bytes(Some(5 * 1024 * 1024)), "5.0 MB");
        assert_eq!(format_bytes(Some(3 * 1024 * 1024 * 1024)), "3.0 GB");
        assert_eq!(format_bytes(None), "-");
    }

    #[test]
    fn number_separators() {
        assert_eq!(format_number(Some(0)), "0");
        assert_eq!(format_number(Some(999)), "999");
        assert_eq!(format_number(Some(1_234_567)), "1,234,567");
        assert_eq!(format_number(Some(-12_000)), "-12,000");
        assert_eq!(format_number(None), "-");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let rel = |s: &str| format_relative_time(Some(s), now);
        assert_eq!(rel("2026-03-10T12:00:30Z"), "just now");
        assert_eq!(rel("2026-03-10T11:59:30Z"), "just now");
        assert_eq!(rel("2026-03-10T11:45:00Z"), "15m ago");
        assert_eq!(rel("2026-03-10T09:00:00Z"), "3h ago");
        assert_eq!(rel("2026-03-08T12:00:00Z"), "2d ago");
        assert!(rel("2026-01-01T12:00:00Z").contains("2026"));
        assert_eq!(format_relative_time(None, now), "");
        assert_eq!(format_relative_time(Some("garbage"), now), "");
    }

    #[test]
    fn absent_dates_render_empty() {
        assert_eq!(format_timestamp(None), "");
        assert_eq!(format_date(Some("nope")), "");
        assert_eq!(format_date_time(None), "");
    }

    #[test]
    fn timestamp_shape() {
        let out = format_time(Some("2026-03-10T12:34:56Z"));
        assert_eq!(out.len(), "12:34:56 PM".len());
        assert!(out.ends_with("AM") || out.ends_with("PM"));
        assert!(format_date(Some("2026-03-10T12:00:00Z")).contains("2026"));
    }

    #[test]
    fn naive_timestamps_parse_as_utc() {
        let dt = parse_timestamp("2026-03-10T12:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn task_id_from_url_or_raw() {
        assert_eq!(extract_task_id("  abc123 "), "abc123");
        assert_eq!(
            extract_task_id("https://tasks.example.com/v2/tasks/cmjoi1s3w"),
            "cmjoi1s3w"
        );
        assert_eq!(extract_task_id("https://tasks.example.com/"), "");
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(&PipelineStatus::WaitingApproval), "Waiting Approval");
        assert_eq!(status_label(&PipelineStatus::Other("paused".into())), "paused");
        assert_eq!(status_tone(&PipelineStatus::Failed), StatusTone::Failed);
    }
}
