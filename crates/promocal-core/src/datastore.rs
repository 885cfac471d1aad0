use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::model::{CampaignInterval, ContextEvent, DailyWeather};

/// Read-only JSONL files standing in for the data-access layer.
#[derive(Debug)]
pub struct CalendarStore {
    pub data_dir: PathBuf,
    pub campaigns_path: PathBuf,
    pub events_path: PathBuf,
    pub weather_path: PathBuf,
}

impl CalendarStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        if !data_dir.is_dir() {
            return Err(anyhow!("{} is not a directory", data_dir.display()));
        }

        let data_dir = data_dir.to_path_buf();
        let campaigns_path = data_dir.join("campaigns.jsonl");
        let events_path = data_dir.join("events.jsonl");
        let weather_path = data_dir.join("weather.jsonl");

        info!(
            data_dir = %data_dir.display(),
            campaigns = %campaigns_path.display(),
            events = %events_path.display(),
            weather = %weather_path.display(),
            "opened calendar store"
        );

        Ok(Self {
            data_dir,
            campaigns_path,
            events_path,
            weather_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_campaigns(&self) -> anyhow::Result<Vec<CampaignInterval>> {
        load_jsonl(&self.campaigns_path).context("failed to load campaigns.jsonl")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_events(&self) -> anyhow::Result<Vec<ContextEvent>> {
        load_jsonl(&self.events_path).context("failed to load events.jsonl")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_weather(&self) -> anyhow::Result<Vec<DailyWeather>> {
        load_jsonl(&self.weather_path).context("failed to load weather.jsonl")
    }
}

/// One record per non-blank line. A missing file reads as empty.
#[tracing::instrument]
pub fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.exists() {
        debug!(file = %path.display(), "jsonl file absent; treating as empty");
        return Ok(vec![]);
    }

    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

/// Writes `value` as pretty JSON, replacing `path` atomically.
#[tracing::instrument(skip(value))]
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    debug!(file = %path.display(), "writing json atomically");

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, value)?;
    writeln!(temp)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::model::CampaignStatus;

    #[test]
    fn loads_records_and_skips_blank_lines() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("campaigns.jsonl"),
            concat!(
                r#"{"id":"a","startDate":"2024-03-01","endDate":"2024-03-06","status":"active"}"#,
                "\n\n",
                r#"{"id":"b","startDate":"2024-03-05","endDate":"2024-03-05","status":"scheduled"}"#,
                "\n"
            ),
        )
        .expect("write campaigns");

        let store = CalendarStore::open(temp.path()).expect("open store");
        let campaigns = store.load_campaigns().expect("load campaigns");

        assert_eq!(campaigns.len(), 2);
        assert_eq!(campaigns[1].status(), CampaignStatus::Scheduled);
        assert!(store.load_events().expect("load events").is_empty());
    }

    #[test]
    fn reports_offending_line() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("events.jsonl"),
            concat!(
                r#"{"id":"e","eventDate":"2024-03-01","category":"holiday"}"#,
                "\n",
                r#"{"id":"bad","eventDate":"2024-03-09","endDate":"2024-03-01","category":"holiday"}"#,
                "\n"
            ),
        )
        .expect("write events");

        let store = CalendarStore::open(temp.path()).expect("open store");
        let err = store.load_events().expect_err("inverted event must fail");

        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn open_rejects_missing_directory() {
        let temp = tempdir().expect("tempdir");
        assert!(CalendarStore::open(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn writes_json_atomically() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("out.json");

        write_json_atomic(&path, &serde_json::json!({"maxRows": 2})).expect("write json");

        let raw = fs::read_to_string(&path).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse back");
        assert_eq!(value["maxRows"], 2);
    }
}
