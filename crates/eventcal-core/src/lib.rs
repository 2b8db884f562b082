pub mod business_hours;
pub mod cli;
pub mod column;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod events;
pub mod legend;
pub mod locale;
pub mod palette;
pub mod render;
pub mod roles;
pub mod selection;
pub mod session;
pub mod settings;
pub mod statestore;
pub mod tooltip;
pub mod view_state;

use std::ffi::OsString;

use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting eventcal"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let mut renderer =
    render::Renderer::new(&cfg)?;
  commands::dispatch(
    &cfg,
    &mut renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
