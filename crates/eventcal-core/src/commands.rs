use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::datetime;
use crate::locale::resolve_locale;
use crate::palette::DefaultPalette;
use crate::render::Renderer;
use crate::session::{RenderInput, RenderSession, Viewport};
use crate::settings::VisualSettings;
use crate::statestore::{StateFile, load_dataset};
use crate::view_state::{self, SupportedView};

#[instrument(skip_all)]
pub fn dispatch(cfg: &Config, renderer: &mut Renderer, command: Command) -> anyhow::Result<()> {
    let settings = VisualSettings::from_config(cfg);
    debug!(?command, "dispatching command");

    match command {
        Command::Render {
            data,
            state,
            locale,
            width,
            height,
            legend_height,
            json,
        } => {
            let input = RenderInput {
                dataset: load_dataset(&data)?,
                settings,
                locale,
                viewport: Viewport { width, height },
                legend_height,
                today: datetime::today(),
            };
            cmd_render(&state, renderer, &input, json)
        }
        Command::View { state, view } => cmd_view(&state, &settings, view.into()),
        Command::Navigate {
            state,
            action,
            locale,
        } => {
            let mut store = StateFile::open(&state)?;
            let view = view_state::retrieve_view(&mut store, &settings.buttons)?;
            let date = view_state::navigate(
                &mut store,
                view,
                action.into(),
                datetime::today(),
                resolve_locale(&locale),
            )?;
            println!("{date}");
            Ok(())
        }
    }
}

fn cmd_render(
    state: &Path,
    renderer: &mut Renderer,
    input: &RenderInput,
    json: bool,
) -> anyhow::Result<()> {
    let mut store = StateFile::open(state)?;
    let mut session = RenderSession::new();
    let outcome = session
        .update(input, &mut DefaultPalette::new(), &mut store)
        .context("update cycle failed")?;

    info!(state = %state.display(), "rendered calendar");
    if json {
        renderer.print_json(&outcome)
    } else {
        renderer.print_outcome(&outcome)
    }
}

fn cmd_view(state: &Path, settings: &VisualSettings, view: SupportedView) -> anyhow::Result<()> {
    if !view.is_enabled(&settings.buttons) {
        warn!(
            view = view.as_key(),
            "view button is disabled; the next render falls back to month"
        );
    }
    let mut store = StateFile::open(state)?;
    view_state::select_view(&mut store, view)?;
    println!("{}", view.as_key());
    Ok(())
}
