use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::datetime::parse_iso_date;
use crate::window::WindowRequest;

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

fn parse_today(raw: &str) -> Result<NaiveDate, String> {
    parse_iso_date(raw).map_err(|err| err.to_string())
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "promocal",
    version,
    about = "Lays out promotional campaigns and events on month and week calendars"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Treat this date as today instead of the clock in the configured timezone.
    #[arg(long = "today", value_parser = parse_today, global = true)]
    pub today: Option<NaiveDate>,

    /// Print the projection as JSON instead of text.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Six-week grid for a month (defaults to the current month).
    Month(MonthArgs),
    /// Monday-to-Sunday strip with campaign lanes (defaults to the current week).
    Week(WeekArgs),
    /// Write a projection to a JSON file.
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MonthArgs {
    pub year: Option<i32>,
    pub month: Option<i32>,
}

#[derive(Args, Debug, Clone)]
pub struct WeekArgs {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    #[command(subcommand)]
    pub view: ExportView,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExportView {
    Month(MonthArgs),
    Week(WeekArgs),
}

impl MonthArgs {
    pub fn to_request(&self, today: NaiveDate) -> WindowRequest {
        WindowRequest::Month {
            year: self.year.unwrap_or(today.year()),
            month: self.month.unwrap_or(today.month() as i32),
        }
    }
}

impl WeekArgs {
    pub fn to_request(&self, today: NaiveDate) -> WindowRequest {
        WindowRequest::Week {
            year: self.year.unwrap_or(today.year()),
            month: self.month.unwrap_or(today.month() as i32),
            day: self.day.unwrap_or(today.day() as i32),
        }
    }
}

impl ExportView {
    pub fn to_request(&self, today: NaiveDate) -> WindowRequest {
        match self {
            ExportView::Month(args) => args.to_request(today),
            ExportView::Week(args) => args.to_request(today),
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
