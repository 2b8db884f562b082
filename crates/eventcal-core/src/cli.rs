use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::view_state::{Navigation, SupportedView};

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "eventcal",
    version,
    about = "Project tabular event data onto a calendar",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file", global = true)]
    pub rc_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run one update cycle and print the calendar.
    Render {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        state: PathBuf,
        #[arg(long, default_value = "en-US")]
        locale: String,
        #[arg(long, default_value_t = 1024.0)]
        width: f64,
        #[arg(long, default_value_t = 768.0)]
        height: f64,
        #[arg(long = "legend-height", default_value_t = 40.0)]
        legend_height: f64,
        #[arg(long)]
        json: bool,
    },
    /// Persist the selected calendar view.
    View {
        #[arg(long)]
        state: PathBuf,
        view: ViewArg,
    },
    /// Move the persisted date.
    Navigate {
        #[arg(long)]
        state: PathBuf,
        action: NavigateArg,
        #[arg(long, default_value = "en-US")]
        locale: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Month,
    Week,
    Day,
    List,
}

impl From<ViewArg> for SupportedView {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Month => Self::Month,
            ViewArg::Week => Self::Week,
            ViewArg::Day => Self::Day,
            ViewArg::List => Self::List,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateArg {
    Prev,
    Next,
    Today,
}

impl From<NavigateArg> for Navigation {
    fn from(value: NavigateArg) -> Self {
        match value {
            NavigateArg::Prev => Self::Prev,
            NavigateArg::Next => Self::Next,
            NavigateArg::Today => Self::Today,
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pull positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{Command, GlobalCli, NavigateArg, ViewArg, preprocess_args};

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_removed() {
        let pre = preprocess_args(&args(&[
            "eventcal",
            "rc.legend.show=off",
            "view",
            "rc.buttons.week:no",
            "--state",
            "s.json",
            "week",
        ]))
        .expect("preprocess");

        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.legend.show".to_string(), "off".to_string()),
                ("rc.buttons.week".to_string(), "no".to_string()),
            ]
        );
        let cli = GlobalCli::parse_from(pre.cleaned_args);
        assert!(matches!(
            cli.command,
            Command::View {
                view: ViewArg::Week,
                ..
            }
        ));
    }

    #[test]
    fn parses_render_and_navigate() {
        let cli = GlobalCli::parse_from(args(&[
            "eventcal", "-vv", "render", "--data", "d.json", "--state", "s.json", "--json",
            "--rc", "color=off",
        ]));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert!(matches!(cli.command, Command::Render { json: true, .. }));

        let cli = GlobalCli::parse_from(args(&["eventcal", "navigate", "--state", "s", "prev"]));
        assert!(matches!(
            cli.command,
            Command::Navigate {
                action: NavigateArg::Prev,
                ..
            }
        ));
    }
}
