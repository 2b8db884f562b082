use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::column::Column;
use crate::palette::ColorPalette;
use crate::roles::RoleMap;
use crate::selection::{SelectionIdentity, SelectionTracker};
use crate::settings::{LegendPosition, LegendSettings};

/// Legend bucket for rows whose group value is null.
pub const OTHERS_LABEL: &str = "Others";

/// Category label to colour, persisted between update cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorAssignment(BTreeMap<String, String>);

impl ColorAssignment {
    /// Restore from the persisted JSON blob; anything unparseable yields an
    /// empty map.
    pub fn restore(blob: Option<&str>) -> Self {
        let Some(raw) = blob.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(raw) {
            Ok(colors) => {
                debug!(count = colors.len(), "restored persisted colours");
                colors
            }
            Err(error) => {
                warn!(%error, "persisted colour map is malformed; starting empty");
                Self::default()
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    pub fn insert(&mut self, label: &str, color: &str) {
        self.0.insert(label.to_string(), color.to_string());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub key_name: String,
    pub color: String,
    pub identity: SelectionIdentity,
}

/// Output of one colour pass: legend entries plus each row's label and colour.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendAssignment {
    pub entries: Vec<LegendEntry>,
    pub row_labels: Vec<String>,
    pub row_colors: Vec<String>,
}

/// What the legend widget draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendData {
    pub title: String,
    pub position: LegendPosition,
    pub font_size: f64,
    pub label_color: String,
    pub font_family: String,
    pub entries: Vec<LegendEntry>,
}

impl LegendData {
    pub fn new(title: &str, settings: &LegendSettings, entries: &[LegendEntry]) -> Self {
        Self {
            title: title.to_string(),
            position: settings.position,
            font_size: settings.font_size,
            label_color: settings.label_color.clone(),
            font_family: settings.font_family.clone(),
            entries: entries.to_vec(),
        }
    }
}

fn row_label(columns: &[Column], roles: &RoleMap, row: usize) -> String {
    match roles.event_group {
        Some(group) => columns[group]
            .text(row)
            .unwrap_or_else(|| OTHERS_LABEL.to_string()),
        None => columns[roles.events].text(row).unwrap_or_default(),
    }
}

/// Assign a colour to every category in first-seen row order.
///
/// Persisted colours win over the palette; an explicit per-row override on
/// the event column wins over both and is written back to `colors`.
#[instrument(skip_all, fields(rows = rows))]
pub fn assign_colors(
    columns: &[Column],
    roles: &RoleMap,
    rows: usize,
    colors: &mut ColorAssignment,
    palette: &mut dyn ColorPalette,
    selection: &SelectionTracker,
) -> LegendAssignment {
    let event_column = &columns[roles.events];
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();
    let mut row_labels = Vec::with_capacity(rows);

    for row in 0..rows {
        let label = row_label(columns, roles, row);
        if seen.insert(label.clone()) {
            let fallback = match colors.get(&label) {
                Some(color) => color.to_string(),
                None => palette.color_for(&label),
            };
            let color = event_column
                .color_override(row)
                .map(ToString::to_string)
                .unwrap_or(fallback);
            colors.insert(&label, &color);
            entries.push(LegendEntry {
                key_name: label.clone(),
                color,
                identity: selection.identity(row),
            });
        }
        row_labels.push(label);
    }

    let by_label: HashMap<&str, &str> = entries
        .iter()
        .map(|entry| (entry.key_name.as_str(), entry.color.as_str()))
        .collect();
    let row_colors = row_labels
        .iter()
        .map(|label| by_label.get(label.as_str()).copied().unwrap_or_default().to_string())
        .collect();

    debug!(legend = entries.len(), "assigned category colours");
    LegendAssignment {
        entries,
        row_labels,
        row_colors,
    }
}
