use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datetime::iso_date_serde;
use crate::error::{LayoutError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

/// A promotional campaign running over an inclusive range of calendar days.
///
/// Construction validates `start_date <= end_date`, both through [`CampaignInterval::new`]
/// and when deserializing, so layout code can rely on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawCampaign", rename_all = "camelCase")]
pub struct CampaignInterval {
    id: String,

    #[serde(with = "iso_date_serde")]
    start_date: NaiveDate,

    #[serde(with = "iso_date_serde")]
    end_date: NaiveDate,

    status: CampaignStatus,

    /// Fields owned by the data-access layer, passed through untouched.
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCampaign {
    id: String,
    #[serde(with = "iso_date_serde")]
    start_date: NaiveDate,
    #[serde(with = "iso_date_serde")]
    end_date: NaiveDate,
    status: CampaignStatus,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawCampaign> for CampaignInterval {
    type Error = LayoutError;

    fn try_from(raw: RawCampaign) -> Result<Self> {
        let mut campaign = Self::new(raw.id, raw.start_date, raw.end_date, raw.status)?;
        campaign.extra = raw.extra;
        Ok(campaign)
    }
}

impl CampaignInterval {
    pub fn new(
        id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: CampaignStatus,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LayoutError::EmptyId { kind: "campaign" });
        }
        if end_date < start_date {
            return Err(LayoutError::InvertedRange {
                kind: "campaign",
                id,
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            id,
            start_date,
            end_date,
            status,
            extra: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn status(&self) -> CampaignStatus {
        self.status
    }

    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }

    /// Number of calendar days covered, counting both ends.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Holiday,
    Sports,
    Festival,
    Conference,
    School,
    #[serde(other)]
    Other,
}

/// A contextual event: listed on the days it covers, never given a lane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawEvent", rename_all = "camelCase")]
pub struct ContextEvent {
    id: String,

    #[serde(with = "iso_date_serde")]
    event_date: NaiveDate,

    #[serde(
        default,
        with = "iso_date_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    end_date: Option<NaiveDate>,

    category: EventCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    id: String,
    #[serde(with = "iso_date_serde")]
    event_date: NaiveDate,
    #[serde(default, with = "iso_date_serde::option")]
    end_date: Option<NaiveDate>,
    category: EventCategory,
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawEvent> for ContextEvent {
    type Error = LayoutError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let mut event = Self::new(raw.id, raw.event_date, raw.end_date, raw.category)?;
        event.name = raw.name;
        event.extra = raw.extra;
        Ok(event)
    }
}

impl ContextEvent {
    pub fn new(
        id: impl Into<String>,
        event_date: NaiveDate,
        end_date: Option<NaiveDate>,
        category: EventCategory,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LayoutError::EmptyId { kind: "event" });
        }
        if let Some(end) = end_date
            && end < event_date
        {
            return Err(LayoutError::InvertedRange {
                kind: "event",
                id,
                start: event_date,
                end,
            });
        }

        Ok(Self {
            id,
            event_date,
            end_date,
            category,
            name: None,
            extra: BTreeMap::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_date(&self) -> NaiveDate {
        self.event_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Last day covered; the event date itself for single-day events.
    pub fn last_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.event_date)
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
    Fog,
    #[serde(other)]
    Unknown,
}

/// Per-day weather summary a caller may attach to month cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    #[serde(with = "iso_date_serde")]
    pub date: NaiveDate,

    pub condition: WeatherCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_c: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_c: Option<f32>,
}
