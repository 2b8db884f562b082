//! Locale resolution and the locale-dependent strings handed to the
//! calendar widget.
//!
//! Host locale tags (`de-DE`, `pt-BR`, `fr-CA-x-foo`) are matched against the
//! closed set of [`SupportedLocaleKey`]s by dropping trailing subtags until a
//! key matches. Anything unmatched renders with the built-in English strings.

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedLocaleKey {
    En,
    EnGb,
    De,
    Fr,
    Gl,
    Es,
    Pt,
    PtBr,
    Ar,
}

impl SupportedLocaleKey {
    pub fn all() -> [Self; 9] {
        [
            Self::En,
            Self::EnGb,
            Self::De,
            Self::Fr,
            Self::Gl,
            Self::Es,
            Self::Pt,
            Self::PtBr,
            Self::Ar,
        ]
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::EnGb => "en-gb",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Gl => "gl",
            Self::Es => "es",
            Self::Pt => "pt",
            Self::PtBr => "pt-br",
            Self::Ar => "ar",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|locale| locale.as_key() == key)
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Ar)
    }

    /// Lowercase month names, January first.
    pub fn month_names(self) -> &'static [&'static str; 12] {
        match self {
            Self::De => &MONTHS_DE,
            Self::Fr => &MONTHS_FR,
            Self::Gl => &MONTHS_GL,
            Self::Pt | Self::PtBr => &MONTHS_PT,
            Self::En | Self::EnGb | Self::Es | Self::Ar => &MONTHS_EN,
        }
    }

    pub fn short_month_names(self) -> &'static [&'static str; 12] {
        match self {
            Self::De => &SHORT_MONTHS_DE,
            Self::Fr => &SHORT_MONTHS_FR,
            Self::Gl => &SHORT_MONTHS_GL,
            Self::Pt | Self::PtBr => &SHORT_MONTHS_PT,
            Self::En | Self::EnGb | Self::Es | Self::Ar => &SHORT_MONTHS_EN,
        }
    }

    fn bundle(self) -> LocaleBundle {
        match self {
            Self::En | Self::EnGb => LocaleBundle::default(),
            Self::De => LocaleBundle {
                buttons: Some(["Heute", "Monat", "Woche", "Tag", "Terminübersicht"]),
                event_limit_text: Some("weitere"),
                week_number_title: Some("KW"),
                all_day_text: Some("Ganztägig"),
                no_events_message: Some("Keine Ereignisse anzuzeigen"),
            },
            Self::Fr => LocaleBundle {
                buttons: Some(["Aujourd'hui", "Mois", "Semaine", "Jour", "Mon planning"]),
                event_limit_text: Some("en plus"),
                week_number_title: Some("Sem."),
                all_day_text: Some("Toute la journée"),
                no_events_message: Some("Aucun événement à afficher"),
            },
            Self::Gl => LocaleBundle {
                buttons: Some(["Hoxe", "Mes", "Semana", "Día", "Axenda"]),
                event_limit_text: Some("máis"),
                week_number_title: Some("Sm"),
                all_day_text: Some("Todo o día"),
                no_events_message: Some("Non hai eventos para amosar"),
            },
            Self::Es => LocaleBundle {
                buttons: Some(["Hoy", "Mes", "Semana", "Día", "Agenda"]),
                event_limit_text: Some("más"),
                week_number_title: Some("Sm"),
                all_day_text: Some("Todo el día"),
                no_events_message: Some("No hay eventos para mostrar"),
            },
            Self::Pt => LocaleBundle {
                buttons: Some(["Hoje", "Mês", "Semana", "Dia", "Agenda"]),
                event_limit_text: Some("mais"),
                week_number_title: Some("Sem"),
                all_day_text: Some("Todo o dia"),
                no_events_message: Some("Não há eventos para mostrar"),
            },
            Self::PtBr => LocaleBundle {
                buttons: Some(["Hoje", "Mês", "Semana", "Dia", "Compromissos"]),
                event_limit_text: Some("mais"),
                week_number_title: Some("Sm"),
                all_day_text: Some("dia inteiro"),
                no_events_message: Some("Não há eventos para mostrar"),
            },
            Self::Ar => LocaleBundle {
                buttons: Some(["اليوم", "شهر", "أسبوع", "يوم", "أجندة"]),
                event_limit_text: Some("أخرى"),
                week_number_title: Some("أسبوع"),
                all_day_text: Some("اليوم كله"),
                no_events_message: Some("أي أحداث لعرض"),
            },
        }
    }
}

const MONTHS_EN: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];
const SHORT_MONTHS_EN: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const MONTHS_DE: [&str; 12] = [
    "januar", "februar", "märz", "april", "mai", "juni", "juli", "august", "september",
    "oktober", "november", "dezember",
];
const SHORT_MONTHS_DE: [&str; 12] = [
    "jan", "feb", "märz", "apr", "mai", "juni", "juli", "aug", "sep", "okt", "nov", "dez",
];
const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];
const SHORT_MONTHS_FR: [&str; 12] = [
    "janv", "févr", "mar", "avril", "mai", "juin", "jul", "août", "sept", "oct", "nov", "déc",
];
const MONTHS_GL: [&str; 12] = [
    "xaneiro", "febreiro", "marzo", "abril", "maio", "xuño", "xullo", "agosto", "setembro",
    "outubro", "novembro", "decembro",
];
const SHORT_MONTHS_GL: [&str; 12] = [
    "xan", "feb", "mar", "abr", "mai", "xuñ", "xul", "ago", "set", "out", "nov", "dec",
];
const MONTHS_PT: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];
const SHORT_MONTHS_PT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Per-locale overrides; `None` falls back to the English literal.
#[derive(Debug, Clone, Copy, Default)]
struct LocaleBundle {
    /// today, month, week, day, list
    buttons: Option<[&'static str; 5]>,
    event_limit_text: Option<&'static str>,
    week_number_title: Option<&'static str>,
    all_day_text: Option<&'static str>,
    no_events_message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonText {
    pub today: String,
    pub month: String,
    pub week: String,
    pub day: String,
    pub list: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleStrings {
    pub button_text: ButtonText,
    pub event_limit_text: String,
    pub week_number_title: String,
    pub all_day_text: String,
    pub no_events_message: String,
}

impl Default for LocaleStrings {
    fn default() -> Self {
        Self::from_bundle(LocaleBundle::default())
    }
}

impl LocaleStrings {
    pub fn for_tag(tag: &str) -> Self {
        match resolve_locale(tag) {
            Some(key) => Self::from_bundle(key.bundle()),
            None => Self::default(),
        }
    }

    fn from_bundle(bundle: LocaleBundle) -> Self {
        let [today, month, week, day, list] =
            bundle.buttons.unwrap_or(["Today", "Month", "Week", "Day", "List"]);
        Self {
            button_text: ButtonText {
                today: today.to_string(),
                month: month.to_string(),
                week: week.to_string(),
                day: day.to_string(),
                list: list.to_string(),
            },
            event_limit_text: bundle.event_limit_text.unwrap_or("more").to_string(),
            week_number_title: bundle.week_number_title.unwrap_or("W").to_string(),
            all_day_text: bundle.all_day_text.unwrap_or_default().to_string(),
            no_events_message: bundle
                .no_events_message
                .unwrap_or("No events to display")
                .to_string(),
        }
    }
}

/// Progressively drop `-subtag`s from `tag` until a supported key matches.
pub fn resolve_locale(tag: &str) -> Option<SupportedLocaleKey> {
    resolve_locale_in(tag, &SupportedLocaleKey::all())
}

pub fn resolve_locale_in(
    tag: &str,
    supported: &[SupportedLocaleKey],
) -> Option<SupportedLocaleKey> {
    let lookup = |candidate: &str| {
        supported
            .iter()
            .copied()
            .find(|key| key.as_key() == candidate)
    };

    let mut candidate = tag.trim().to_ascii_lowercase();
    loop {
        if let Some(key) = lookup(&candidate) {
            debug!(tag, key = key.as_key(), "resolved locale");
            return Some(key);
        }
        let Some(cut) = candidate.rfind('-') else {
            break;
        };
        candidate.truncate(cut);
    }

    debug!(tag, "no supported locale; using defaults");
    None
}

struct Resource {
    key: &'static str,
    default_value: &'static str,
    localization: &'static [(&'static str, &'static str)],
}

const RESOURCES: &[Resource] = &[Resource {
    key: "LanguageKey",
    default_value: "English(English)",
    localization: &[
        ("de-DE", "Deutsche (German)"),
        ("fr-FR", "français (French)"),
        ("gl-ES", "galego (Galician)"),
        ("pt-BR", "português (Portuguese)"),
        ("pt-PT", "português (Portuguese)"),
    ],
}];

/// Resource lookup by exact tag, then the default value, then the key itself.
pub fn localized_string(tag: &str, key: &str) -> String {
    let Some(resource) = RESOURCES.iter().find(|resource| resource.key == key) else {
        return key.to_string();
    };
    resource
        .localization
        .iter()
        .find(|(locale, _)| *locale == tag)
        .map(|(_, text)| *text)
        .unwrap_or(resource.default_value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{LocaleStrings, SupportedLocaleKey, localized_string, resolve_locale, resolve_locale_in};

    #[test]
    fn strips_subtags_until_match() {
        assert_eq!(resolve_locale("de-DE"), Some(SupportedLocaleKey::De));
        assert_eq!(resolve_locale("pt-BR"), Some(SupportedLocaleKey::PtBr));
        assert_eq!(resolve_locale("pt-PT"), Some(SupportedLocaleKey::Pt));
        assert_eq!(resolve_locale("en-GB-oxendict"), Some(SupportedLocaleKey::EnGb));
    }

    #[test]
    fn unmatched_tag_resolves_to_none() {
        assert_eq!(resolve_locale("ja-JP"), None);
        assert_eq!(resolve_locale_in("de-DE", &[SupportedLocaleKey::Fr]), None);
    }

    #[test]
    fn unmatched_tag_uses_default_literals() {
        let strings = LocaleStrings::for_tag("xx-YY");
        assert_eq!(strings.button_text.today, "Today");
        assert_eq!(strings.button_text.list, "List");
        assert_eq!(strings.event_limit_text, "more");
        assert_eq!(strings.week_number_title, "W");
        assert_eq!(strings.no_events_message, "No events to display");
    }

    #[test]
    fn german_bundle_overrides_buttons() {
        let strings = LocaleStrings::for_tag("de-AT");
        assert_eq!(strings.button_text.month, "Monat");
        assert_eq!(strings.week_number_title, "KW");
    }

    #[test]
    fn resource_lookup_falls_back_to_default_then_key() {
        assert_eq!(localized_string("fr-FR", "LanguageKey"), "français (French)");
        assert_eq!(localized_string("fr-CA", "LanguageKey"), "English(English)");
        assert_eq!(localized_string("fr-FR", "Missing"), "Missing");
    }
}
