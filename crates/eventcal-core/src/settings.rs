use chrono::{NaiveTime, Weekday};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;

const LEGEND_MAX_FONT_SIZE: f64 = 18.0;
const DEFAULT_START_TIME: &str = "09:00";
const DEFAULT_END_TIME: &str = "17:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSettings {
    pub month: bool,
    pub week: bool,
    pub day: bool,
    pub list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LegendPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendSettings {
    pub show: bool,
    pub position: LegendPosition,
    pub font_size: f64,
    pub label_color: String,
    pub font_family: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSettings {
    pub font_color: String,
    pub border_color: String,
    pub font_size: f64,
    pub font_family: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSettings {
    /// Title font size.
    pub font_size: f64,
    /// Header button font size.
    pub text_size: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSettings {
    pub starting_week_day: Weekday,
    pub current_time_line: bool,
    pub nav_link: bool,
    pub week_number: bool,
    pub rtl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkHours {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDays {
    pub sunday: bool,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
}

/// Everything the property pane exposes, already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSettings {
    pub buttons: ButtonSettings,
    pub legend: LegendSettings,
    pub url_show: bool,
    pub events: EventSettings,
    pub fonts: FontSettings,
    pub calendar: CalendarSettings,
    pub work_hours: WorkHours,
    pub work_days: WorkDays,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            buttons: ButtonSettings {
                month: true,
                week: true,
                day: true,
                list: true,
            },
            legend: LegendSettings {
                show: true,
                position: LegendPosition::Top,
                font_size: 12.0,
                label_color: "#000000".to_string(),
                font_family: "Segoe UI".to_string(),
            },
            url_show: false,
            events: EventSettings {
                font_color: "#FFFFFF".to_string(),
                border_color: "#FFFFFF".to_string(),
                font_size: 12.0,
                font_family: "Segoe UI".to_string(),
            },
            fonts: FontSettings {
                font_size: 14.0,
                text_size: 12.0,
            },
            calendar: CalendarSettings {
                starting_week_day: Weekday::Mon,
                current_time_line: false,
                nav_link: false,
                week_number: false,
                rtl: false,
            },
            work_hours: WorkHours {
                start_time: DEFAULT_START_TIME.to_string(),
                end_time: DEFAULT_END_TIME.to_string(),
            },
            work_days: WorkDays {
                sunday: false,
                monday: true,
                tuesday: true,
                wednesday: true,
                thursday: true,
                friday: true,
                saturday: false,
            },
        }
    }
}

impl VisualSettings {
    #[tracing::instrument(skip_all)]
    pub fn from_config(cfg: &Config) -> Self {
        let mut s = Self::default();

        let flag = |key: &str, current: &mut bool| {
            if let Some(value) = cfg.get_bool(key) {
                *current = value;
            }
        };
        let number = |key: &str, current: &mut f64| {
            if let Some(value) = cfg.get_f64(key) {
                *current = value;
            }
        };
        let text = |key: &str, current: &mut String| {
            if let Some(value) = cfg.get(key).filter(|v| !v.trim().is_empty()) {
                *current = value.trim().to_string();
            }
        };

        flag("buttons.month", &mut s.buttons.month);
        flag("buttons.week", &mut s.buttons.week);
        flag("buttons.day", &mut s.buttons.day);
        flag("buttons.list", &mut s.buttons.list);

        flag("legend.show", &mut s.legend.show);
        if let Some(position) = cfg.get("legend.position") {
            s.legend.position = match position.trim().to_ascii_lowercase().as_str() {
                "bottom" => LegendPosition::Bottom,
                "top" => LegendPosition::Top,
                other => {
                    warn!(position = other, "unknown legend position; using top");
                    LegendPosition::Top
                }
            };
        }
        number("legend.fontSize", &mut s.legend.font_size);
        text("legend.labelColor", &mut s.legend.label_color);
        text("legend.fontFamily", &mut s.legend.font_family);

        flag("url.show", &mut s.url_show);

        text("events.fontColor", &mut s.events.font_color);
        text("events.borderColor", &mut s.events.border_color);
        number("events.fontSize", &mut s.events.font_size);
        text("events.fontFamily", &mut s.events.font_family);

        number("fonts.fontSize", &mut s.fonts.font_size);
        number("fonts.textSize", &mut s.fonts.text_size);

        if let Some(day) = cfg.get("calendar.startingWeekDay") {
            s.calendar.starting_week_day = parse_start_weekday(&day);
        }
        flag("calendar.currentTimeLine", &mut s.calendar.current_time_line);
        flag("calendar.navLink", &mut s.calendar.nav_link);
        flag("calendar.weekNumber", &mut s.calendar.week_number);
        flag("calendar.rtl", &mut s.calendar.rtl);

        text("workHours.startTime", &mut s.work_hours.start_time);
        text("workHours.endTime", &mut s.work_hours.end_time);

        flag("workDays.sunday", &mut s.work_days.sunday);
        flag("workDays.monday", &mut s.work_days.monday);
        flag("workDays.tuesday", &mut s.work_days.tuesday);
        flag("workDays.wednesday", &mut s.work_days.wednesday);
        flag("workDays.thursday", &mut s.work_days.thursday);
        flag("workDays.friday", &mut s.work_days.friday);
        flag("workDays.saturday", &mut s.work_days.saturday);

        s.sanitize();
        debug!(?s, "resolved visual settings");
        s
    }

    fn sanitize(&mut self) {
        if self.legend.font_size > LEGEND_MAX_FONT_SIZE {
            self.legend.font_size = LEGEND_MAX_FONT_SIZE;
        }

        match normalize_clock_time(&self.work_hours.start_time) {
            Some(time) => self.work_hours.start_time = time,
            None => {
                warn!(value = %self.work_hours.start_time, "invalid work start time; using default");
                self.work_hours.start_time = DEFAULT_START_TIME.to_string();
            }
        }
        match normalize_clock_time(&self.work_hours.end_time) {
            Some(time) => self.work_hours.end_time = time,
            None => {
                warn!(value = %self.work_hours.end_time, "invalid work end time; using default");
                self.work_hours.end_time = DEFAULT_END_TIME.to_string();
            }
        }
    }
}

/// Unknown names fall back to Monday.
pub fn parse_start_weekday(raw: &str) -> Weekday {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sunday" => Weekday::Sun,
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        other => {
            warn!(weekday = other, "unknown starting weekday; using Monday");
            Weekday::Mon
        }
    }
}

/// Zero-padded `HH:MM`, so times compare correctly as strings.
fn normalize_clock_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .ok()
        .map(|time| time.format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::{LegendPosition, VisualSettings};
    use crate::config::Config;

    #[test]
    fn reads_typed_values_from_config() {
        let cfg = Config::from_pairs([
            ("buttons.week", "off"),
            ("legend.position", "Bottom"),
            ("legend.fontSize", "30"),
            ("calendar.startingWeekDay", "Sunday"),
            ("workDays.saturday", "yes"),
            ("workHours.startTime", "08:30"),
        ]);
        let settings = VisualSettings::from_config(&cfg);

        assert!(!settings.buttons.week);
        assert!(settings.buttons.month);
        assert_eq!(settings.legend.position, LegendPosition::Bottom);
        assert_eq!(settings.legend.font_size, 18.0);
        assert_eq!(settings.calendar.starting_week_day, Weekday::Sun);
        assert!(settings.work_days.saturday);
        assert_eq!(settings.work_hours.start_time, "08:30");
    }

    #[test]
    fn unknown_weekday_and_bad_times_fall_back() {
        let cfg = Config::from_pairs([
            ("calendar.startingWeekDay", "Funday"),
            ("workHours.endTime", "late"),
        ]);
        let settings = VisualSettings::from_config(&cfg);

        assert_eq!(settings.calendar.starting_week_day, Weekday::Mon);
        assert_eq!(settings.work_hours.end_time, "17:00");
    }
}
