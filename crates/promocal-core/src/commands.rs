use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::datastore::{CalendarStore, write_json_atomic};
use crate::model::{CampaignInterval, ContextEvent, DailyWeather};
use crate::projection::{CalendarInputs, Projection, project};
use crate::render::Renderer;
use crate::window::WindowRequest;

/// Everything loaded from the store for one invocation.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub campaigns: Vec<CampaignInterval>,
    pub events: Vec<ContextEvent>,
    pub weather: Vec<DailyWeather>,
}

impl Snapshot {
    #[instrument(skip(store))]
    pub fn load(store: &CalendarStore) -> anyhow::Result<Self> {
        let snapshot = Self {
            campaigns: store.load_campaigns()?,
            events: store.load_events()?,
            weather: store.load_weather()?,
        };
        debug!(
            campaigns = snapshot.campaigns.len(),
            events = snapshot.events.len(),
            weather = snapshot.weather.len(),
            "loaded calendar snapshot"
        );
        Ok(snapshot)
    }

    pub fn inputs(&self, today: NaiveDate) -> CalendarInputs<'_> {
        CalendarInputs::new(today, &self.campaigns, &self.events).with_weather(&self.weather)
    }
}

#[instrument(skip(store, renderer, command))]
pub fn dispatch(
    store: &CalendarStore,
    renderer: &Renderer,
    command: Command,
    today: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(store)?;

    match command {
        Command::Month(args) => cmd_show(&snapshot, renderer, args.to_request(today), today, json),
        Command::Week(args) => cmd_show(&snapshot, renderer, args.to_request(today), today, json),
        Command::Export(args) => {
            cmd_export(&snapshot, args.view.to_request(today), today, &args.output)
        }
    }
}

#[instrument(skip(snapshot, renderer))]
fn cmd_show(
    snapshot: &Snapshot,
    renderer: &Renderer,
    request: WindowRequest,
    today: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    info!(kind = ?request.kind(), "command show");

    let projection = project(request, snapshot.inputs(today))
        .with_context(|| format!("failed to lay out {request:?}"))?;

    if json {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &projection)?;
        writeln!(out)?;
        return Ok(());
    }

    match &projection {
        Projection::Month(month) => renderer.print_month(month),
        Projection::Week(week) => renderer.print_week(week),
    }
}

#[instrument(skip(snapshot))]
fn cmd_export(
    snapshot: &Snapshot,
    request: WindowRequest,
    today: NaiveDate,
    output: &Path,
) -> anyhow::Result<()> {
    info!(kind = ?request.kind(), output = %output.display(), "command export");

    let projection = project(request, snapshot.inputs(today))
        .with_context(|| format!("failed to lay out {request:?}"))?;
    write_json_atomic(output, &projection)
        .with_context(|| format!("failed to export to {}", output.display()))?;

    println!("Wrote {}.", output.display());
    Ok(())
}
