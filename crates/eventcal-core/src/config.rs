//! The `.eventcalrc` settings file.
//!
//! Lines are `key = value`, `include <path>`, blank, or `#` comments. A
//! comment may also trail a value when the `#` follows whitespace, so hex
//! colours such as `legend.labelColor = #445566` survive intact.

use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

const RC_ENV_VAR: &str = "EVENTCALRC";
const RC_FILE_NAME: &str =
  ".eventcalrc";
const DISABLED_RC: &str = "/dev/null";

/// Flat settings read from an rc file plus command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RcLine<'a> {
  Blank,
  Include(&'a str),
  Setting { key: &'a str, value: &'a str }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match locate_rc_file(rc_override) {
      | Some(path) => {
        info!(rc = %path.display(), "loading settings file");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!("no settings file; using defaults");
      }
    }

    Ok(cfg)
  }

  pub fn from_pairs<I, K, V>(
    pairs: I
  ) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>
  {
    let mut cfg = Config::default();
    cfg.apply_overrides(
      pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
    );
    cfg
  }

  /// Later values win; a leading `rc.` on the key is ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      let key = key
        .strip_prefix("rc.")
        .unwrap_or(&key)
        .to_string();
      debug!(key = %key, value = %value, "applying override");
      self.map.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  /// `on/yes/true/1/y` and `off/no/false/0/n`; anything else is ignored.
  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    let raw = self.map.get(key)?;
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "1" | "y" | "yes" | "on"
      | "true" => Some(true),
      | "0" | "n" | "no" | "off"
      | "false" => Some(false),
      | _ => {
        warn!(key, value = %raw, "ignoring non-boolean setting");
        None
      }
    }
  }

  pub fn get_f64(
    &self,
    key: &str
  ) -> Option<f64> {
    let raw = self.map.get(key)?;
    match raw.trim().parse::<f64>() {
      | Ok(value) if value.is_finite() => {
        Some(value)
      }
      | _ => {
        warn!(key, value = %raw, "ignoring non-numeric setting");
        None
      }
    }
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let identity = fs::canonicalize(&path)
      .unwrap_or_else(|_| path.clone());
    if self.loaded_files.contains(&identity)
    {
      warn!(file = %path.display(), "settings file already loaded; skipping include cycle");
      return Ok(());
    }

    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    self.loaded_files.push(identity);

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line = parse_line(raw_line)
        .with_context(|| {
          format!(
            "invalid settings line \
             {}:{}: {}",
            path.display(),
            idx + 1,
            raw_line
          )
        })?;

      match line {
        | RcLine::Blank => {}
        | RcLine::Include(target) => {
          let include =
            resolve_include(
              &base_dir, target
            );
          if include.exists() {
            self.load_file(&include)?;
          } else {
            warn!(include = %include.display(), "included file does not exist; skipping");
          }
        }
        | RcLine::Setting {
          key,
          value
        } => {
          trace!(key, value, "loaded setting");
          self.map.insert(
            key.to_string(),
            value.to_string()
          );
        }
      }
    }

    Ok(())
  }
}

fn parse_line(
  raw: &str
) -> anyhow::Result<RcLine<'_>> {
  let line = strip_comment(raw.trim());
  if line.is_empty() {
    return Ok(RcLine::Blank);
  }

  if let Some(target) =
    line.strip_prefix("include ")
  {
    let target = target.trim();
    if target.is_empty() {
      return Err(anyhow!(
        "include path cannot be empty"
      ));
    }
    return Ok(RcLine::Include(target));
  }

  let (key, value) = line
    .split_once('=')
    .ok_or_else(|| {
      anyhow!("expected KEY = VALUE")
    })?;
  let key = key.trim();
  if key.is_empty() {
    return Err(anyhow!(
      "setting has an empty key"
    ));
  }
  Ok(RcLine::Setting {
    key,
    value: value.trim()
  })
}

/// A `#` starts a comment at the beginning of the line or after whitespace.
fn strip_comment(line: &str) -> &str {
  if line.starts_with('#') {
    return "";
  }
  let cut = line
    .char_indices()
    .zip(line.chars().skip(1))
    .find(|((_, ch), next)| {
      ch.is_whitespace() && *next == '#'
    })
    .map(|((idx, _), _)| idx);
  match cut {
    | Some(idx) => line[..idx].trim_end(),
    | None => line
  }
}

#[tracing::instrument]
fn locate_rc_file(
  explicit: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(path.to_path_buf());
  }

  if let Ok(from_env) =
    std::env::var(RC_ENV_VAR)
  {
    return (from_env != DISABLED_RC)
      .then(|| PathBuf::from(from_env));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping settings \
       file"
    );
    return None;
  };
  let candidate = home.join(RC_FILE_NAME);
  candidate.exists().then_some(candidate)
}

fn resolve_include(
  base_dir: &Path,
  target: &str
) -> PathBuf {
  let expanded =
    expand_tilde(Path::new(target));
  if expanded.is_absolute() {
    expanded
  } else {
    base_dir.join(expanded)
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
