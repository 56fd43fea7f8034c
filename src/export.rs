//! CSV rendering of the log table.

use crate::models::{LogEntry, MetricType};

const COLUMNS: [&str; 7] = ["id", "ritual_id", "quota_id", "timestamp", "value", "tag", "metric_type"];

/// RFC 4180 rows with CRLF endings; absent values are empty fields.
pub fn logs_csv(logs: &[LogEntry]) -> String {
    let mut out = String::new();
    push_row(&mut out, COLUMNS.iter().map(|column| column.to_string()));
    for log in logs {
        push_row(
            &mut out,
            [
                log.id.to_string(),
                optional(log.ritual_id),
                optional(log.quota_id),
                log.timestamp.clone(),
                log.value.to_string(),
                log.tag.clone().unwrap_or_default(),
                metric_name(log.metric_type).to_string(),
            ],
        );
    }
    out
}

fn optional(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

fn metric_name(metric: MetricType) -> &'static str {
    match metric {
        MetricType::Ritual => "ritual",
        MetricType::Quota => "quota",
    }
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&escape(&field));
    }
    out.push_str("\r\n");
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, tag: Option<&str>) -> LogEntry {
        LogEntry {
            id,
            ritual_id: Some(3),
            quota_id: None,
            timestamp: "2024-03-04T12:00:00".into(),
            value: 2.5,
            tag: tag.map(str::to_string),
            metric_type: MetricType::Ritual,
        }
    }

    #[test]
    fn header_only_for_an_empty_ledger() {
        assert_eq!(logs_csv(&[]), "id,ritual_id,quota_id,timestamp,value,tag,metric_type\r\n");
    }

    #[test]
    fn rows_leave_missing_fields_empty() {
        let csv = logs_csv(&[entry(7, None)]);
        let rows: Vec<_> = csv.split("\r\n").collect();
        assert_eq!(rows[1], "7,3,,2024-03-04T12:00:00,2.5,,ritual");
        assert_eq!(rows[2], "");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        let csv = logs_csv(&[entry(8, Some("gym, \"heavy\""))]);
        assert!(csv.contains(",\"gym, \"\"heavy\"\"\",ritual\r\n"));
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape("plain"), "plain");
    }
}
