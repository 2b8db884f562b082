//! Selection identities and the bookkeeping around host selection requests.
//!
//! A click produces a [`SelectionTicket`] that the host forwards to its
//! selection manager. The manager answers on a later turn of the event loop;
//! the answer is applied through [`SelectionTracker::resolve`], which refuses
//! tickets issued before the most recent update cycle or whose target has
//! since disappeared.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

const DIMMED_OPACITY: f64 = 0.5;

/// Opaque token bound to one source row of one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SelectionIdentity {
    pub cycle: Uuid,
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    Event(usize),
    Legend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    cycle: Uuid,
    pub target: SelectionTarget,
    /// Identities to hand to the host's selection manager.
    pub ids: Vec<SelectionIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegendClick {
    Select(SelectionTicket),
    Cleared(Highlight),
}

/// Opacity state to apply once a selection settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub dimmed: bool,
    pub emphasized: Vec<usize>,
}

impl Highlight {
    pub fn none() -> Self {
        Self {
            dimmed: false,
            emphasized: vec![],
        }
    }

    pub fn event_opacity(&self, event_id: usize) -> f64 {
        if !self.dimmed || self.emphasized.contains(&event_id) {
            1.0
        } else {
            DIMMED_OPACITY
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionTracker {
    cycle: Uuid,
    row_labels: Vec<String>,
    legend_labels: Vec<String>,
    highlighted_legend: Option<String>,
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self {
            cycle: Uuid::new_v4(),
            row_labels: vec![],
            legend_labels: vec![],
            highlighted_legend: None,
        }
    }

    /// Start a fresh cycle; every ticket issued so far becomes stale.
    pub fn begin_cycle(&mut self) -> Uuid {
        self.cycle = Uuid::new_v4();
        self.row_labels.clear();
        self.legend_labels.clear();
        self.highlighted_legend = None;
        debug!(cycle = %self.cycle, "began selection cycle");
        self.cycle
    }

    pub fn cycle(&self) -> Uuid {
        self.cycle
    }

    pub fn identity(&self, row: usize) -> SelectionIdentity {
        SelectionIdentity {
            cycle: self.cycle,
            row,
        }
    }

    pub fn bind(&mut self, row_labels: Vec<String>, legend_labels: Vec<String>) {
        self.row_labels = row_labels;
        self.legend_labels = legend_labels;
    }

    pub fn select_event(&self, event_id: usize) -> Option<SelectionTicket> {
        if event_id >= self.row_labels.len() {
            return None;
        }
        Some(SelectionTicket {
            cycle: self.cycle,
            target: SelectionTarget::Event(event_id),
            ids: vec![self.identity(event_id)],
        })
    }

    /// Clicking the highlighted legend entry again clears the highlight.
    pub fn select_legend(&mut self, label: &str) -> Option<LegendClick> {
        if !self.legend_labels.iter().any(|known| known == label) {
            return None;
        }
        if self.highlighted_legend.as_deref() == Some(label) {
            return Some(LegendClick::Cleared(self.clear()));
        }

        self.highlighted_legend = Some(label.to_string());
        let ids = self
            .rows_with_label(label)
            .into_iter()
            .map(|row| self.identity(row))
            .collect();
        Some(LegendClick::Select(SelectionTicket {
            cycle: self.cycle,
            target: SelectionTarget::Legend(label.to_string()),
            ids,
        }))
    }

    /// Apply the host's answer, or `None` when the ticket no longer matches.
    pub fn resolve(
        &self,
        ticket: &SelectionTicket,
        active: &[SelectionIdentity],
    ) -> Option<Highlight> {
        if ticket.cycle != self.cycle {
            debug!(ticket_cycle = %ticket.cycle, cycle = %self.cycle, "discarding stale selection");
            return None;
        }

        let emphasized = match &ticket.target {
            SelectionTarget::Event(id) if *id < self.row_labels.len() => vec![*id],
            SelectionTarget::Legend(label)
                if self.legend_labels.iter().any(|known| known == label) =>
            {
                self.rows_with_label(label)
            }
            _ => {
                debug!(target = ?ticket.target, "selection target vanished");
                return None;
            }
        };

        Some(Highlight {
            dimmed: !active.is_empty(),
            emphasized,
        })
    }

    pub fn clear(&mut self) -> Highlight {
        self.highlighted_legend = None;
        Highlight::none()
    }

    fn rows_with_label(&self, label: &str) -> Vec<usize> {
        self.row_labels
            .iter()
            .enumerate()
            .filter(|(_, row_label)| row_label.as_str() == label)
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{LegendClick, SelectionTracker};

    fn tracker() -> SelectionTracker {
        let mut tracker = SelectionTracker::new();
        tracker.begin_cycle();
        tracker.bind(
            vec!["A".to_string(), "B".to_string(), "A".to_string()],
            vec!["A".to_string(), "B".to_string()],
        );
        tracker
    }

    #[test]
    fn event_selection_dims_other_events() {
        let tracker = tracker();
        let ticket = tracker.select_event(1).expect("ticket");
        let highlight = tracker
            .resolve(&ticket, &ticket.ids)
            .expect("current ticket");

        assert_eq!(highlight.event_opacity(1), 1.0);
        assert_eq!(highlight.event_opacity(0), 0.5);
    }

    #[test]
    fn empty_active_set_restores_opacity() {
        let tracker = tracker();
        let ticket = tracker.select_event(0).expect("ticket");
        let highlight = tracker.resolve(&ticket, &[]).expect("current ticket");

        assert_eq!(highlight.event_opacity(2), 1.0);
    }

    #[test]
    fn legend_selection_targets_all_matching_rows() {
        let mut tracker = tracker();
        let Some(LegendClick::Select(ticket)) = tracker.select_legend("A") else {
            panic!("expected a selection ticket");
        };
        assert_eq!(ticket.ids.len(), 2);

        let highlight = tracker.resolve(&ticket, &ticket.ids).expect("resolve");
        assert_eq!(highlight.emphasized, vec![0, 2]);
        assert_eq!(highlight.event_opacity(1), 0.5);

        assert!(matches!(
            tracker.select_legend("A"),
            Some(LegendClick::Cleared(_))
        ));
    }

    #[test]
    fn tickets_from_previous_cycle_are_discarded() {
        let mut tracker = tracker();
        let ticket = tracker.select_event(0).expect("ticket");

        tracker.begin_cycle();
        tracker.bind(vec!["A".to_string()], vec!["A".to_string()]);

        assert_eq!(tracker.resolve(&ticket, &ticket.ids), None);
        assert_eq!(tracker.select_event(3), None);
        assert_eq!(tracker.select_legend("Z"), None);
    }
}
