pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod error;
pub mod index;
pub mod lanes;
pub mod model;
pub mod projection;
pub mod render;
pub mod window;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::LayoutError;
pub use index::{
  DateIndex,
  DateRanged,
  index_by_date
};
pub use lanes::{
  LaneAssignment,
  assign_lanes,
  max_rows
};
pub use model::{
  CampaignInterval,
  CampaignStatus,
  ContextEvent,
  DailyWeather,
  EventCategory
};
pub use projection::{
  CalendarInputs,
  MonthProjection,
  Projection,
  WeekProjection,
  project
};
pub use window::{
  CalendarWindow,
  WindowRequest,
  month_window,
  week_window
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting promocal"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  info!(
    files = ?cfg.loaded_files,
    "loaded config"
  );
  debug!(?cfg, "effective config");

  let today = match cli.today {
    | Some(date) => date,
    | None => {
      datetime::today_for(
        datetime::resolve_timezone(
          cfg.timezone.as_deref()
        )
      )
    }
  };

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::CalendarStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open calendar store \
         at {}",
        data_dir.display()
      )
    })?;

  let renderer =
    render::Renderer::new(&cfg);
  let command = cli.command.unwrap_or(
    cli::Command::Week(cli::WeekArgs {
      year:  None,
      month: None,
      day:   None
    })
  );

  commands::dispatch(
    &store,
    &renderer,
    command,
    today,
    cli.json
  )?;

  info!("done");
  Ok(())
}
