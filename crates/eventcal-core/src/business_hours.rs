use chrono::NaiveTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::settings::{WorkDays, WorkHours};

const CLOCK_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessHours {
    #[serde(rename = "start")]
    pub start_time: String,
    #[serde(rename = "end")]
    pub end_time: String,
    /// Weekday indices, Sunday = 0.
    #[serde(rename = "dow")]
    pub work_days: Vec<u8>,
}

/// Weekday indices whose toggle is on, Sunday first.
pub fn work_day_indices(days: &WorkDays) -> Vec<u8> {
    [
        days.sunday,
        days.monday,
        days.tuesday,
        days.wednesday,
        days.thursday,
        days.friday,
        days.saturday,
    ]
    .into_iter()
    .zip(0u8..)
    .filter_map(|(on, idx)| on.then_some(idx))
    .collect()
}

/// The single business-hours window handed to the calendar.
///
/// An end before the start collapses to a zero-width window instead of
/// wrapping past midnight; a midnight start is left alone.
pub fn build_business_hours(hours: &WorkHours, days: &WorkDays) -> Vec<BusinessHours> {
    let parsed = (parse_clock(&hours.start_time), parse_clock(&hours.end_time));
    let (start_time, end_time) = match parsed {
        (Some(start), Some(end)) => {
            let end = if end < start && start != NaiveTime::MIN {
                debug!(%start, %end, "work hours inverted; collapsing window");
                start
            } else {
                end
            };
            (
                start.format(CLOCK_FORMAT).to_string(),
                end.format(CLOCK_FORMAT).to_string(),
            )
        }
        _ => {
            warn!(
                start = %hours.start_time,
                end = %hours.end_time,
                "unparseable work hours; passing through"
            );
            (hours.start_time.clone(), hours.end_time.clone())
        }
    };

    vec![BusinessHours {
        start_time,
        end_time,
        work_days: work_day_indices(days),
    }]
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::{build_business_hours, work_day_indices};
    use crate::settings::{WorkDays, WorkHours};

    fn days(flags: [bool; 7]) -> WorkDays {
        WorkDays {
            sunday: flags[0],
            monday: flags[1],
            tuesday: flags[2],
            wednesday: flags[3],
            thursday: flags[4],
            friday: flags[5],
            saturday: flags[6],
        }
    }

    fn hours(start: &str, end: &str) -> WorkHours {
        WorkHours {
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn toggles_are_independent() {
        assert_eq!(
            work_day_indices(&days([true, false, false, true, false, false, true])),
            vec![0, 3, 6]
        );
        assert!(work_day_indices(&days([false; 7])).is_empty());
    }

    #[test]
    fn inverted_window_collapses_to_start() {
        let out = build_business_hours(&hours("09:00", "08:00"), &days([false; 7]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start_time, "09:00");
        assert_eq!(out[0].end_time, "09:00");
    }

    #[test]
    fn midnight_start_is_not_corrected() {
        let out = build_business_hours(&hours("00:00", "00:00"), &days([true; 7]));
        assert_eq!(out[0].end_time, "00:00");
        assert_eq!(out[0].work_days.len(), 7);

        let normal = build_business_hours(&hours("08:00", "17:30"), &days([true; 7]));
        assert_eq!(normal[0].end_time, "17:30");
    }

    #[test]
    fn unpadded_times_compare_as_times() {
        let out = build_business_hours(&hours("9:00", "10:00"), &days([false; 7]));
        assert_eq!(out[0].start_time, "09:00");
        assert_eq!(out[0].end_time, "10:00");

        let inverted = build_business_hours(&hours("10:00", "9:30"), &days([false; 7]));
        assert_eq!(inverted[0].end_time, "10:00");
    }
}
