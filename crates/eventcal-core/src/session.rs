//! One update cycle, from host columns to a renderable calendar.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::business_hours::{BusinessHours, build_business_hours};
use crate::column::DataSet;
use crate::error::{DisplayMessage, ProjectionError};
use crate::events::{CalendarEvent, project_events};
use crate::legend::{ColorAssignment, LegendData, assign_colors};
use crate::locale::{LocaleStrings, resolve_locale};
use crate::palette::ColorPalette;
use crate::roles::classify;
use crate::selection::{Highlight, LegendClick, SelectionIdentity, SelectionTicket, SelectionTracker};
use crate::settings::VisualSettings;
use crate::tooltip;
use crate::view_state::{
    COLOR_OBJECT, COLOR_PROPERTY, PropertyStore, StagedWrites, SupportedView, ViewState,
    retrieve_view_state, write_property,
};

pub const EVENT_LIMIT: u32 = 3;
const LEGEND_GAP: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct RenderInput {
    pub dataset: DataSet,
    pub settings: VisualSettings,
    pub locale: String,
    pub viewport: Viewport,
    /// Height taken by the legend when it is shown.
    pub legend_height: f64,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontSizes {
    pub header: f64,
    pub text: f64,
    pub event: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    pub header_views: Vec<SupportedView>,
    /// Sunday = 0.
    pub first_day: u32,
    pub default_view: SupportedView,
    pub default_date: String,
    pub business_hours: Vec<BusinessHours>,
    pub locale: Option<String>,
    pub strings: LocaleStrings,
    pub is_rtl: bool,
    pub week_numbers: bool,
    pub now_indicator: bool,
    pub nav_links: bool,
    pub event_limit: u32,
    pub event_text_color: String,
    pub event_border_color: String,
    pub fonts: FontSizes,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCalendar {
    pub events: Vec<CalendarEvent>,
    pub legend: Option<LegendData>,
    pub view: ViewState,
    pub config: CalendarConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RenderOutcome {
    Message(DisplayMessage),
    Calendar(Box<RenderedCalendar>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventClick {
    LaunchUrl(String),
    Select(SelectionTicket),
}

/// Clamp range for font sizes at a given viewport width.
pub fn font_bounds(width: f64) -> (f64, f64) {
    if width > 1200.0 {
        (8.0, 19.0)
    } else if width > 500.0 {
        (8.0, 14.0)
    } else {
        (8.0, 10.0)
    }
}

pub fn calendar_height(viewport: Viewport, legend_shown: bool, legend_height: f64) -> f64 {
    if legend_shown {
        (viewport.height - legend_height - LEGEND_GAP).max(0.0)
    } else {
        viewport.height
    }
}

fn build_config(
    input: &RenderInput,
    view: &ViewState,
    business_hours: Vec<BusinessHours>,
) -> CalendarConfig {
    let settings = &input.settings;
    let locale = resolve_locale(&input.locale);
    let mut strings = LocaleStrings::for_tag(&input.locale);
    if !settings.calendar.week_number {
        strings.week_number_title.clear();
    }

    let (lo, hi) = font_bounds(input.viewport.width);
    CalendarConfig {
        header_views: SupportedView::enabled(&settings.buttons),
        first_day: settings.calendar.starting_week_day.num_days_from_sunday(),
        default_view: view.selected_view,
        default_date: view.selected_date.clone(),
        business_hours,
        locale: locale.map(|key| key.as_key().to_string()),
        strings,
        is_rtl: settings.calendar.rtl || locale.is_some_and(|key| key.is_rtl()),
        week_numbers: settings.calendar.week_number,
        now_indicator: settings.calendar.current_time_line,
        nav_links: settings.calendar.nav_link,
        event_limit: EVENT_LIMIT,
        event_text_color: settings.events.font_color.clone(),
        event_border_color: settings.events.border_color.clone(),
        fonts: FontSizes {
            header: settings.fonts.font_size.clamp(lo, hi),
            text: settings.fonts.text_size.clamp(lo, hi),
            event: settings.events.font_size.clamp(lo, hi),
        },
        height: calendar_height(input.viewport, settings.legend.show, input.legend_height),
    }
}

/// Long-lived state across update cycles: the selection tracker and the
/// last projected events.
#[derive(Debug, Default)]
pub struct RenderSession {
    selection: SelectionTracker,
    events: Vec<CalendarEvent>,
    url_show: bool,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one update cycle. Persisted writes land only when the cycle
    /// produces a calendar.
    #[instrument(skip_all, fields(columns = input.dataset.columns.len()))]
    pub fn update(
        &mut self,
        input: &RenderInput,
        palette: &mut dyn ColorPalette,
        store: &mut dyn PropertyStore,
    ) -> Result<RenderOutcome, ProjectionError> {
        self.selection.begin_cycle();
        self.events.clear();
        self.url_show = input.settings.url_show;

        let mut staged = StagedWrites::new(store);
        let mut colors = ColorAssignment::restore(
            staged.get(COLOR_OBJECT, COLOR_PROPERTY).as_deref(),
        );

        let columns = &input.dataset.columns;
        let roles = match classify(columns) {
            Ok(roles) => roles,
            Err(error) => {
                return match error.display_message() {
                    Some(message) => {
                        info!(%error, "showing message instead of calendar");
                        Ok(RenderOutcome::Message(message))
                    }
                    None => Err(error),
                };
            }
        };

        let rows = columns[roles.start_date].len();
        let legend = assign_colors(
            columns,
            &roles,
            rows,
            &mut colors,
            palette,
            &self.selection,
        );
        let tooltips = tooltip::aggregate(columns, &roles, rows);
        let events = project_events(
            columns,
            &roles,
            rows,
            &legend,
            tooltips.as_deref(),
            &self.selection,
        );

        let locale = resolve_locale(&input.locale);
        let view = retrieve_view_state(
            &mut staged,
            &input.settings.buttons,
            input.today,
            locale,
        )
        .map_err(|error| ProjectionError::Unhandled(format!("{error:#}")))?;
        let business_hours =
            build_business_hours(&input.settings.work_hours, &input.settings.work_days);
        let config = build_config(input, &view, business_hours);

        let legend_data = input.settings.legend.show.then(|| {
            let title = columns[roles.grouping_column()].display_name.clone();
            LegendData::new(&title, &input.settings.legend, &legend.entries)
        });

        write_property(&mut staged, COLOR_OBJECT, COLOR_PROPERTY, &colors.to_json())
            .and_then(|()| staged.commit())
            .map_err(|error| {
                warn!(error = %format!("{error:#}"), "persisting update cycle failed");
                ProjectionError::Persisted(format!("{error:#}"))
            })?;

        self.selection.bind(
            legend.row_labels.clone(),
            legend.entries.iter().map(|entry| entry.key_name.clone()).collect(),
        );
        self.events = events.clone();

        debug!(events = events.len(), legend = legend.entries.len(), "update cycle complete");
        Ok(RenderOutcome::Calendar(Box::new(RenderedCalendar {
            events,
            legend: legend_data,
            view,
            config,
        })))
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn click_event(&self, event_id: usize) -> Option<EventClick> {
        let event = self.events.get(event_id)?;
        if self.url_show
            && let Some(url) = event.url.as_deref().filter(|url| !url.trim().is_empty())
        {
            return Some(EventClick::LaunchUrl(url.to_string()));
        }
        self.selection.select_event(event_id).map(EventClick::Select)
    }

    pub fn select_legend(&mut self, label: &str) -> Option<LegendClick> {
        self.selection.select_legend(label)
    }

    pub fn resolve_selection(
        &self,
        ticket: &SelectionTicket,
        active: &[SelectionIdentity],
    ) -> Option<Highlight> {
        self.selection.resolve(ticket, active)
    }

    pub fn clear_selection(&mut self) -> Highlight {
        self.selection.clear()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::column::{Column, Role, ValueType};
    use crate::palette::DefaultPalette;
    use crate::view_state::MemoryStore;

    fn input(columns: Vec<Column>) -> RenderInput {
        RenderInput {
            dataset: DataSet { columns },
            settings: VisualSettings::default(),
            locale: "en-US".to_string(),
            viewport: Viewport {
                width: 800.0,
                height: 600.0,
            },
            legend_height: 40.0,
            today: NaiveDate::from_ymd_opt(2024, 3, 7).expect("date"),
        }
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("Start", ValueType::DateTime, &[Role::StartDate])
                .with_values(vec![Some("2024-03-01"), Some("2024-03-02")]),
            Column::new("Event", ValueType::Text, &[Role::Events])
                .with_values(vec![Some("Standup"), Some("Retro")]),
            Column::new("Link", ValueType::Text, &[Role::EventUrl])
                .with_values(vec![Some("https://example.com/a"), None]),
        ]
    }

    #[test]
    fn font_tiers_follow_width() {
        assert_eq!(font_bounds(1300.0), (8.0, 19.0));
        assert_eq!(font_bounds(1200.0), (8.0, 14.0));
        assert_eq!(font_bounds(500.0), (8.0, 10.0));
    }

    #[test]
    fn builds_config_and_persists() {
        let mut session = RenderSession::new();
        let mut store = MemoryStore::new();
        let outcome = session
            .update(&input(columns()), &mut DefaultPalette::new(), &mut store)
            .expect("update");

        let RenderOutcome::Calendar(calendar) = outcome else {
            panic!("expected a calendar");
        };
        assert_eq!(calendar.events.len(), 2);
        assert_eq!(calendar.config.first_day, 1);
        assert_eq!(calendar.config.default_view, SupportedView::Month);
        assert_eq!(calendar.config.default_date, "march 7, 2024");
        assert_eq!(calendar.config.height, 535.0);
        assert_eq!(calendar.config.fonts.header, 14.0);
        assert_eq!(calendar.config.strings.week_number_title, "");
        assert_eq!(calendar.config.event_limit, 3);
        assert!(store.get(COLOR_OBJECT, COLOR_PROPERTY).is_some());
    }

    #[test]
    fn role_failure_persists_nothing() {
        let mut session = RenderSession::new();
        let mut store = MemoryStore::new();
        let outcome = session
            .update(&input(columns()[1..].to_vec()), &mut DefaultPalette::new(), &mut store)
            .expect("update");

        assert_eq!(
            outcome,
            RenderOutcome::Message(DisplayMessage::RequiredFieldsMissing)
        );
        assert_eq!(store, MemoryStore::new());
        assert!(session.events().is_empty());
    }

    #[test]
    fn clicks_launch_urls_only_when_enabled() {
        let mut session = RenderSession::new();
        let mut store = MemoryStore::new();
        let mut input = input(columns());
        input.settings.url_show = true;
        session
            .update(&input, &mut DefaultPalette::new(), &mut store)
            .expect("update");

        assert_eq!(
            session.click_event(0),
            Some(EventClick::LaunchUrl("https://example.com/a".to_string()))
        );
        assert!(matches!(session.click_event(1), Some(EventClick::Select(_))));
        assert_eq!(session.click_event(9), None);
    }
}
