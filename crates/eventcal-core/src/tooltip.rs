use std::fmt::Write as _;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use tracing::{debug, instrument};

use crate::column::{CellValue, Column, ValueType};
use crate::datetime::coerce_cell_datetime;
use crate::roles::RoleMap;

pub const DATA_UNAVAILABLE: &str = "Data Unavailable";
const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Tooltip text for every row, or `None` when no tooltip field is bound.
#[instrument(skip_all, fields(rows = rows))]
pub fn aggregate(columns: &[Column], roles: &RoleMap, rows: usize) -> Option<Vec<String>> {
    if !roles.has_descriptions() {
        return None;
    }
    let texts: Vec<String> = (0..rows)
        .map(|row| tooltip_for_row(columns, &roles.descriptions, row))
        .collect();
    debug!(fields = roles.descriptions.len(), "aggregated tooltips");
    Some(texts)
}

pub fn tooltip_for_row(columns: &[Column], descriptions: &[usize], row: usize) -> String {
    let mut text = String::from("\n");
    for &idx in descriptions {
        let column = &columns[idx];
        let value = column
            .value(row)
            .map(|value| format_value(column, value))
            .unwrap_or_else(|| DATA_UNAVAILABLE.to_string());
        text.push_str(&column.display_name);
        text.push_str(" : ");
        text.push_str(&value);
        text.push('\n');
    }
    text
}

/// Render a cell with the column's own display format.
pub fn format_value(column: &Column, value: &CellValue) -> String {
    let format = column.format.as_deref().map(str::trim).filter(|f| !f.is_empty());
    match column.value_type {
        ValueType::DateTime => match coerce_cell_datetime(value) {
            Some(dt) => format_datetime(dt, format.unwrap_or(DEFAULT_DATE_FORMAT)),
            None => value.to_string(),
        },
        _ => match (format, value.as_f64()) {
            (Some(pattern), Some(number)) if !matches!(value, CellValue::Bool(_)) => {
                format_number(number, pattern).unwrap_or_else(|| value.to_string())
            }
            _ => value.to_string(),
        },
    }
}

fn format_datetime(dt: NaiveDateTime, pattern: &str) -> String {
    let valid = !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
    let pattern = if valid { pattern } else { DEFAULT_DATE_FORMAT };

    let mut out = String::new();
    if write!(out, "{}", dt.format_with_items(StrftimeItems::new(pattern))).is_err() {
        out.clear();
        let _ = write!(out, "{}", dt.format(DEFAULT_DATE_FORMAT));
    }
    out
}

/// Numeric display patterns: `0`, `0.00`, `#,0.0`, `0%`, `0.0%`.
fn format_number(value: f64, pattern: &str) -> Option<String> {
    if !pattern.chars().all(|c| matches!(c, '0' | '#' | ',' | '.' | '%')) {
        return None;
    }

    let percent = pattern.ends_with('%');
    let body = pattern.trim_end_matches('%');
    let grouped = body.contains(',');
    let decimals = body
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| *c == '0' || *c == '#').count())
        .unwrap_or(0);

    let scaled = if percent { value * 100.0 } else { value };
    let fixed = format!("{:.*}", decimals, scaled.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), Some(frac_part.to_string())),
        None => (fixed.clone(), None),
    };

    let mut out = String::new();
    if scaled < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&if grouped { group_thousands(&int_part) } else { int_part });
    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(&frac_part);
    }
    if percent {
        out.push('%');
    }
    Some(out)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{format_number, format_value, tooltip_for_row};
    use crate::column::{CellValue, Column, Role, ValueType};

    #[test]
    fn joins_labelled_lines_and_marks_nulls() {
        let notes = Column::new("Notes", ValueType::Text, &[Role::Description])
            .with_values(vec![Some("first"), None]);
        let when = Column::new("Due", ValueType::DateTime, &[Role::Tooltip])
            .with_format("%Y/%m/%d")
            .with_values(vec![Some("2024-02-03"), Some("2024-02-04")]);
        let columns = vec![notes, when];

        assert_eq!(
            tooltip_for_row(&columns, &[0, 1], 0),
            "\nNotes : first\nDue : 2024/02/03\n"
        );
        assert_eq!(
            tooltip_for_row(&columns, &[0, 1], 1),
            "\nNotes : Data Unavailable\nDue : 2024/02/04\n"
        );
    }

    #[test]
    fn numeric_patterns() {
        assert_eq!(format_number(1234567.891, "#,0.00").as_deref(), Some("1,234,567.89"));
        assert_eq!(format_number(0.256, "0.0%").as_deref(), Some("25.6%"));
        assert_eq!(format_number(-3.0, "0").as_deref(), Some("-3"));
        assert_eq!(format_number(-0.001, "0.00").as_deref(), Some("0.00"));
        assert_eq!(format_number(5.0, "dd/MM"), None);
    }

    #[test]
    fn invalid_date_pattern_uses_default() {
        let column = Column::new("When", ValueType::DateTime, &[]).with_format("%Q");
        let text = format_value(&column, &CellValue::Text("2024-02-03T04:05:06".to_string()));
        assert_eq!(text, "02/03/2024 04:05:06");
    }

    #[test]
    fn text_without_numeric_value_is_unchanged() {
        let column = Column::new("Owner", ValueType::Text, &[]).with_format("0.00");
        assert_eq!(format_value(&column, &CellValue::Text("Ana".to_string())), "Ana");
        assert_eq!(format_value(&column, &CellValue::Number(2.0)), "2.00");
    }
}
