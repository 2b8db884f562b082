//! Persisted calendar view and displayed date.
//!
//! Both values live in the host's property bags and are always written back
//! through the same [`PropertyStore`] they were read from, replacing the
//! whole bag.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::datetime::{format_display_date, parse_display_date, shift_days, shift_months};
use crate::locale::SupportedLocaleKey;
use crate::settings::ButtonSettings;

pub const VIEW_OBJECT: &str = "persistCalendarView";
pub const VIEW_PROPERTY: &str = "calendarView";
pub const DATE_OBJECT: &str = "persistCalendarDate";
pub const DATE_PROPERTY: &str = "persistedDate";
pub const COLOR_OBJECT: &str = "caption";
pub const COLOR_PROPERTY: &str = "captionValue";
pub const TODAY_SENTINEL: &str = "today";

pub type PropertyBag = BTreeMap<String, String>;

/// The host's persisted-properties mechanism.
pub trait PropertyStore {
    fn get(&self, object: &str, property: &str) -> Option<String>;

    /// Replace every property of `object`; nothing is merged.
    fn replace(&mut self, object: &str, properties: PropertyBag) -> anyhow::Result<()>;

    /// Replace several objects at once. Either every bag lands or none does.
    fn replace_all(&mut self, objects: BTreeMap<String, PropertyBag>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    objects: BTreeMap<String, PropertyBag>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, object: &str, property: &str, value: &str) -> Self {
        self.objects
            .entry(object.to_string())
            .or_default()
            .insert(property.to_string(), value.to_string());
        self
    }
}

impl PropertyStore for MemoryStore {
    fn get(&self, object: &str, property: &str) -> Option<String> {
        self.objects.get(object)?.get(property).cloned()
    }

    fn replace(&mut self, object: &str, properties: PropertyBag) -> anyhow::Result<()> {
        self.objects.insert(object.to_string(), properties);
        Ok(())
    }

    fn replace_all(&mut self, objects: BTreeMap<String, PropertyBag>) -> anyhow::Result<()> {
        self.objects.extend(objects);
        Ok(())
    }
}

/// Buffers writes so an update cycle persists all of them or none.
///
/// Reads see staged values first.
pub struct StagedWrites<'a> {
    inner: &'a mut dyn PropertyStore,
    staged: BTreeMap<String, PropertyBag>,
}

impl<'a> StagedWrites<'a> {
    pub fn new(inner: &'a mut dyn PropertyStore) -> Self {
        Self {
            inner,
            staged: BTreeMap::new(),
        }
    }

    pub fn commit(self) -> anyhow::Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        debug!(objects = self.staged.len(), "committing staged properties");
        self.inner.replace_all(self.staged)
    }
}

impl PropertyStore for StagedWrites<'_> {
    fn get(&self, object: &str, property: &str) -> Option<String> {
        match self.staged.get(object) {
            Some(bag) => bag.get(property).cloned(),
            None => self.inner.get(object, property),
        }
    }

    fn replace(&mut self, object: &str, properties: PropertyBag) -> anyhow::Result<()> {
        self.staged.insert(object.to_string(), properties);
        Ok(())
    }

    fn replace_all(&mut self, objects: BTreeMap<String, PropertyBag>) -> anyhow::Result<()> {
        self.staged.extend(objects);
        Ok(())
    }
}

pub fn write_property(
    store: &mut dyn PropertyStore,
    object: &str,
    property: &str,
    value: &str,
) -> anyhow::Result<()> {
    let mut bag = PropertyBag::new();
    bag.insert(property.to_string(), value.to_string());
    store.replace(object, bag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupportedView {
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "agendaWeek")]
    Week,
    #[serde(rename = "agendaDay")]
    Day,
    #[serde(rename = "listMonth")]
    List,
}

impl SupportedView {
    pub fn all() -> [Self; 4] {
        [Self::Month, Self::Week, Self::Day, Self::List]
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "agendaWeek",
            Self::Day => "agendaDay",
            Self::List => "listMonth",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "month" => Some(Self::Month),
            "agendaWeek" | "week" => Some(Self::Week),
            "agendaDay" | "day" => Some(Self::Day),
            "listMonth" | "list" => Some(Self::List),
            _ => None,
        }
    }

    pub fn is_enabled(self, buttons: &ButtonSettings) -> bool {
        match self {
            Self::Month => buttons.month,
            Self::Week => buttons.week,
            Self::Day => buttons.day,
            Self::List => buttons.list,
        }
    }

    /// Views whose header button is shown, in header order.
    pub fn enabled(buttons: &ButtonSettings) -> Vec<Self> {
        Self::all()
            .into_iter()
            .filter(|view| view.is_enabled(buttons))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Prev,
    Next,
    Today,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub selected_view: SupportedView,
    pub selected_date: String,
}

/// The persisted view, reset to month when unset or its button is disabled.
#[instrument(skip_all)]
pub fn retrieve_view(
    store: &mut dyn PropertyStore,
    buttons: &ButtonSettings,
) -> anyhow::Result<SupportedView> {
    let persisted = store.get(VIEW_OBJECT, VIEW_PROPERTY);
    let view = persisted.as_deref().and_then(SupportedView::from_key);

    match view {
        Some(view) if view.is_enabled(buttons) => Ok(view),
        _ => {
            if persisted.as_deref().is_some_and(|raw| !raw.trim().is_empty()) && view.is_none() {
                warn!(view = ?persisted, "unknown persisted view");
            }
            info!(persisted = ?persisted, "resetting calendar view to month");
            write_property(store, VIEW_OBJECT, VIEW_PROPERTY, SupportedView::Month.as_key())?;
            Ok(SupportedView::Month)
        }
    }
}

/// The persisted displayed date; "today" or unset is resolved to a literal
/// and stored so the next read returns the same text.
#[instrument(skip(store))]
pub fn retrieve_date(
    store: &mut dyn PropertyStore,
    today: NaiveDate,
    locale: Option<SupportedLocaleKey>,
) -> anyhow::Result<String> {
    let persisted = store.get(DATE_OBJECT, DATE_PROPERTY);
    match persisted.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() && raw != TODAY_SENTINEL => Ok(raw.to_string()),
        _ => {
            let literal = format_display_date(today, locale);
            debug!(date = %literal, "resolved today's date");
            write_property(store, DATE_OBJECT, DATE_PROPERTY, &literal)?;
            Ok(literal)
        }
    }
}

pub fn retrieve_view_state(
    store: &mut dyn PropertyStore,
    buttons: &ButtonSettings,
    today: NaiveDate,
    locale: Option<SupportedLocaleKey>,
) -> anyhow::Result<ViewState> {
    Ok(ViewState {
        selected_view: retrieve_view(store, buttons)?,
        selected_date: retrieve_date(store, today, locale)?,
    })
}

pub fn select_view(store: &mut dyn PropertyStore, view: SupportedView) -> anyhow::Result<()> {
    info!(view = view.as_key(), "persisting calendar view");
    write_property(store, VIEW_OBJECT, VIEW_PROPERTY, view.as_key())
}

/// Move the displayed date and persist the result.
///
/// `Today` stores the sentinel so the next cycle follows the real date.
#[instrument(skip(store))]
pub fn navigate(
    store: &mut dyn PropertyStore,
    view: SupportedView,
    action: Navigation,
    today: NaiveDate,
    locale: Option<SupportedLocaleKey>,
) -> anyhow::Result<String> {
    if action == Navigation::Today {
        write_property(store, DATE_OBJECT, DATE_PROPERTY, TODAY_SENTINEL)?;
        return Ok(TODAY_SENTINEL.to_string());
    }

    let current = retrieve_date(store, today, locale)?;
    let anchor = parse_display_date(&current).unwrap_or_else(|| {
        warn!(date = %current, "unparseable persisted date; navigating from today");
        today
    });
    let step: i64 = if action == Navigation::Next { 1 } else { -1 };
    let moved = match view {
        SupportedView::Month | SupportedView::List => shift_months(anchor, step as i32),
        SupportedView::Week => shift_days(anchor, 7 * step),
        SupportedView::Day => shift_days(anchor, step),
    };

    let literal = format_display_date(moved, locale);
    write_property(store, DATE_OBJECT, DATE_PROPERTY, &literal)?;
    Ok(literal)
}
