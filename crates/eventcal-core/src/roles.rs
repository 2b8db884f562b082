use tracing::{debug, instrument};

use crate::column::{Column, Role, ValueType};
use crate::error::ProjectionError;

/// Column indices for every role bound in one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap {
    pub start_date: usize,
    pub events: usize,
    pub end_date: Option<usize>,
    pub event_group: Option<usize>,
    pub event_url: Option<usize>,
    /// Tooltip field columns in discovery order, unique by display name.
    pub descriptions: Vec<usize>,
}

impl RoleMap {
    /// The column that decides legend categories.
    pub fn grouping_column(&self) -> usize {
        self.event_group.unwrap_or(self.events)
    }

    pub fn has_descriptions(&self) -> bool {
        !self.descriptions.is_empty()
    }
}

#[instrument(skip_all, fields(columns = columns.len()))]
pub fn classify(columns: &[Column]) -> Result<RoleMap, ProjectionError> {
    let first = |role: Role| columns.iter().position(|column| column.has_role(role));

    let start_date = first(Role::StartDate);
    let events = first(Role::Events);

    let (Some(start_date), Some(events)) = (start_date, events) else {
        debug!(
            start_date = start_date.is_some(),
            events = events.is_some(),
            "mandatory roles missing"
        );
        return Err(ProjectionError::MissingRoles {
            start_date: start_date.is_some(),
            events: events.is_some(),
        });
    };

    let start_is_date = columns[start_date].value_type == ValueType::DateTime;
    let events_is_text = columns[events].value_type == ValueType::Text;
    if !start_is_date || !events_is_text {
        debug!(start_is_date, events_is_text, "mandatory roles have wrong types");
        return Err(ProjectionError::WrongTypes {
            start_date: start_is_date,
            events: events_is_text,
        });
    }

    let mut descriptions: Vec<usize> = Vec::new();
    for (idx, column) in columns.iter().enumerate() {
        if !column.has_role(Role::Description) && !column.has_role(Role::Tooltip) {
            continue;
        }
        let duplicate = descriptions
            .iter()
            .any(|&kept| columns[kept].display_name == column.display_name);
        if duplicate {
            debug!(column = %column.display_name, "skipping tooltip column with duplicate label");
            continue;
        }
        descriptions.push(idx);
    }

    let map = RoleMap {
        start_date,
        events,
        end_date: first(Role::EndDate),
        event_group: first(Role::EventGroup),
        event_url: first(Role::EventUrl),
        descriptions,
    };
    debug!(?map, "classified roles");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::column::{Column, Role, ValueType};
    use crate::error::ProjectionError;

    fn start() -> Column {
        Column::new("Start", ValueType::DateTime, &[Role::StartDate])
    }

    fn events() -> Column {
        Column::new("Event", ValueType::Text, &[Role::Events])
    }

    #[test]
    fn missing_events_role_is_reported() {
        let err = classify(&[start()]).expect_err("events missing");
        assert!(matches!(
            err,
            ProjectionError::MissingRoles {
                start_date: true,
                events: false
            }
        ));
    }

    #[test]
    fn missing_wins_over_wrong_type() {
        let bad_start = Column::new("Start", ValueType::Text, &[Role::StartDate]);
        let err = classify(&[bad_start]).expect_err("events missing");
        assert!(matches!(err, ProjectionError::MissingRoles { .. }));
    }

    #[test]
    fn start_date_must_be_datetime() {
        let bad_start = Column::new("Start", ValueType::Text, &[Role::StartDate]);
        let err = classify(&[bad_start, events()]).expect_err("wrong type");
        assert!(matches!(
            err,
            ProjectionError::WrongTypes {
                start_date: false,
                events: true
            }
        ));
    }

    #[test]
    fn first_bound_column_wins_for_primary_roles() {
        let other_group = Column::new("Team", ValueType::Text, &[Role::EventGroup]);
        let group = Column::new("Kind", ValueType::Text, &[Role::EventGroup]);
        let map = classify(&[events(), group, start(), other_group]).expect("classify");

        assert_eq!(map.events, 0);
        assert_eq!(map.start_date, 2);
        assert_eq!(map.event_group, Some(1));
        assert_eq!(map.grouping_column(), 1);
        assert_eq!(map.end_date, None);
    }

    #[test]
    fn duplicate_tooltip_labels_are_suppressed() {
        let notes = Column::new("Notes", ValueType::Text, &[Role::Description]);
        let owner = Column::new("Owner", ValueType::Text, &[Role::Tooltip]);
        let notes_again = Column::new("Notes", ValueType::Text, &[Role::Description]);
        let map = classify(&[start(), events(), notes, owner, notes_again]).expect("classify");

        assert_eq!(map.descriptions, vec![2, 3]);
        assert_eq!(map.grouping_column(), 1);
    }
}
