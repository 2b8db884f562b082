use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{
  DateTime,
  Datelike,
  Duration,
  Months,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::column::CellValue;
use crate::locale::SupportedLocaleKey;

const TIMEZONE_CONFIG_FILE: &str =
  "eventcal-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "EVENTCAL_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "EVENTCAL_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Timezone used to decide what "today" is.
pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

#[must_use]
pub fn today() -> NaiveDate {
  Utc::now()
    .with_timezone(project_timezone())
    .date_naive()
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no timezone configured; using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "resolved timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %err,
        "invalid timezone"
      );
      None
    }
  }
}

/// Coerce a bound cell into a date-time the calendar can place.
///
/// Text is tried as RFC 3339, then the common ISO shapes; numbers are epoch
/// milliseconds.
pub fn coerce_cell_datetime(
  value: &CellValue
) -> Option<NaiveDateTime> {
  match value {
    | CellValue::Number(millis) => {
      DateTime::<Utc>::from_timestamp_millis(
        *millis as i64
      )
      .map(|dt| dt.naive_utc())
    }
    | CellValue::Text(raw) => {
      parse_datetime_text(raw.trim())
    }
    | CellValue::Bool(_) => None
  }
}

fn parse_datetime_text(
  raw: &str
) -> Option<NaiveDateTime> {
  if raw.is_empty() {
    return None;
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(raw)
  {
    return Some(dt.naive_utc());
  }

  for pattern in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M"
  ] {
    if let Ok(dt) =
      NaiveDateTime::parse_from_str(
        raw, pattern
      )
    {
      return Some(dt);
    }
  }

  NaiveDate::parse_from_str(
    raw, "%Y-%m-%d"
  )
  .ok()
  .and_then(|date| {
    date.and_hms_opt(0, 0, 0)
  })
  .or_else(|| {
    parse_display_date(raw).and_then(
      |date| date.and_hms_opt(0, 0, 0)
    )
  })
}

/// `"<month> <day>, <year>"` using the locale's month names.
#[must_use]
pub fn format_display_date(
  date: NaiveDate,
  locale: Option<SupportedLocaleKey>
) -> String {
  let names = locale
    .unwrap_or(SupportedLocaleKey::En)
    .month_names();
  format!(
    "{} {}, {}",
    names[date.month0() as usize],
    date.day(),
    date.year()
  )
}

/// Read back a literal written by [`format_display_date`] in any
/// supported locale; full and abbreviated month names are accepted.
pub fn parse_display_date(
  raw: &str
) -> Option<NaiveDate> {
  let cleaned = raw.replace(',', " ");
  let mut parts =
    cleaned.split_whitespace();
  let month_word = parts
    .next()?
    .trim_end_matches('.')
    .to_lowercase();
  let day: u32 = parts.next()?.parse().ok()?;
  let year: i32 = parts.next()?.parse().ok()?;
  if parts.next().is_some() {
    return None;
  }

  let month = month_number(&month_word)?;
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

fn month_number(
  word: &str
) -> Option<u32> {
  SupportedLocaleKey::all()
    .into_iter()
    .find_map(|locale| {
      locale
        .month_names()
        .iter()
        .position(|name| *name == word)
        .or_else(|| {
          locale
            .short_month_names()
            .iter()
            .position(|name| *name == word)
        })
    })
    .map(|idx| idx as u32 + 1)
}

pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let shifted = if months >= 0 {
    date.checked_add_months(Months::new(
      months.unsigned_abs()
    ))
  } else {
    date.checked_sub_months(Months::new(
      months.unsigned_abs()
    ))
  };
  shifted.unwrap_or(date)
}

pub fn shift_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    Timelike
  };

  use super::{
    coerce_cell_datetime,
    format_display_date,
    parse_display_date,
    shift_months
  };
  use crate::column::CellValue;
  use crate::locale::SupportedLocaleKey;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn formats_month_day_year() {
    assert_eq!(
      format_display_date(
        date(2024, 3, 7),
        None
      ),
      "march 7, 2024"
    );
    assert_eq!(
      format_display_date(
        date(2024, 3, 7),
        Some(SupportedLocaleKey::De)
      ),
      "märz 7, 2024"
    );
  }

  #[test]
  fn parses_localized_literals() {
    assert_eq!(
      parse_display_date(
        "märz 7, 2024"
      ),
      Some(date(2024, 3, 7))
    );
    assert_eq!(
      parse_display_date(
        "Déc 24, 2023"
      ),
      Some(date(2023, 12, 24))
    );
    assert_eq!(
      parse_display_date("today"),
      None
    );
  }

  #[test]
  fn coerces_text_and_epoch_cells() {
    let iso = coerce_cell_datetime(
      &CellValue::Text(
        "2024-01-02T10:30:00Z"
          .to_string()
      )
    )
    .expect("rfc3339");
    assert_eq!(iso.hour(), 10);

    let plain = coerce_cell_datetime(
      &CellValue::Text(
        "2024-01-02".to_string()
      )
    )
    .expect("plain date");
    assert_eq!(
      plain.date(),
      date(2024, 1, 2)
    );

    let epoch = coerce_cell_datetime(
      &CellValue::Number(0.0)
    )
    .expect("epoch");
    assert_eq!(
      epoch.date(),
      date(1970, 1, 1)
    );
  }

  #[test]
  fn month_shift_clamps_to_month_end() {
    assert_eq!(
      shift_months(date(2024, 1, 31), 1),
      date(2024, 2, 29)
    );
    assert_eq!(
      shift_months(date(2024, 1, 15), -1),
      date(2023, 12, 15)
    );
  }
}
