use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::column::Column;
use crate::datetime::coerce_cell_datetime;
use crate::legend::LegendAssignment;
use crate::roles::RoleMap;
use crate::selection::{SelectionIdentity, SelectionTracker};

/// Group tag for events when no group column is bound.
pub const BLANK_GROUP: &str = "blank";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: usize,
    pub title: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    #[serde(rename = "backgroundColor")]
    pub color: String,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "description", skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "selectionId")]
    pub identity: SelectionIdentity,
}

impl CalendarEvent {
    /// Text shown when hovering the rendered event.
    pub fn hover_text(&self) -> String {
        match &self.tooltip {
            Some(tooltip) => format!("{} : {}", self.title, tooltip),
            None => self.title.clone(),
        }
    }
}

/// Make a label usable as a CSS class: every non-alphanumeric becomes `sp`.
pub fn encode_class_name(label: &str) -> String {
    static NON_ALNUM: OnceLock<Option<Regex>> = OnceLock::new();
    if label.is_empty() {
        return "sp".to_string();
    }
    match NON_ALNUM.get_or_init(|| Regex::new("[^A-Za-z0-9]").ok()) {
        Some(re) => re.replace_all(label, "sp").into_owned(),
        None => label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_string() } else { "sp".to_string() })
            .collect(),
    }
}

#[instrument(skip_all, fields(rows = rows))]
pub fn project_events(
    columns: &[Column],
    roles: &RoleMap,
    rows: usize,
    legend: &LegendAssignment,
    tooltips: Option<&[String]>,
    selection: &SelectionTracker,
) -> Vec<CalendarEvent> {
    let start_column = &columns[roles.start_date];
    let event_column = &columns[roles.events];
    let has_group = roles.event_group.is_some();

    let events: Vec<CalendarEvent> = (0..rows)
        .map(|row| {
            let title = event_column.text(row).unwrap_or_default();
            let start = start_column
                .value(row)
                .filter(|value| !value.is_falsy())
                .and_then(coerce_cell_datetime);
            let end = roles
                .end_date
                .and_then(|idx| columns[idx].value(row))
                .and_then(coerce_cell_datetime);
            let label = legend.row_labels.get(row).cloned().unwrap_or_default();
            let group = if has_group {
                label.clone()
            } else {
                BLANK_GROUP.to_string()
            };
            let url = roles.event_url.and_then(|idx| columns[idx].text(row));
            let tooltip = tooltips.and_then(|texts| texts.get(row).cloned());
            let color = legend.row_colors.get(row).cloned().unwrap_or_default();

            CalendarEvent {
                id: row,
                class_name: encode_class_name(&label),
                title,
                start,
                end,
                color,
                group,
                url,
                tooltip,
                identity: selection.identity(row),
            }
        })
        .collect();

    debug!(
        events = events.len(),
        undated = events.iter().filter(|e| e.start.is_none()).count(),
        "projected calendar events"
    );
    events
}
