//! Assembles windows, date buckets and lanes into the shapes a renderer draws.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::datetime::iso_date_serde;
use crate::error::Result;
use crate::index::index_by_date;
use crate::lanes::{ClipEdges, LaneAssignment, clip_edges, max_rows, place_campaigns};
use crate::model::{CampaignInterval, ContextEvent, DailyWeather};
use crate::window::{CalendarWindow, WindowKind, WindowRequest};

/// Everything the data-access layer hands over for one recomputation.
#[derive(Debug, Clone, Copy)]
pub struct CalendarInputs<'a> {
    pub today: NaiveDate,
    pub campaigns: &'a [CampaignInterval],
    pub events: &'a [ContextEvent],
    pub weather: &'a [DailyWeather],
}

impl<'a> CalendarInputs<'a> {
    pub fn new(
        today: NaiveDate,
        campaigns: &'a [CampaignInterval],
        events: &'a [ContextEvent],
    ) -> Self {
        Self {
            today,
            campaigns,
            events,
            weather: &[],
        }
    }

    pub fn with_weather(mut self, weather: &'a [DailyWeather]) -> Self {
        self.weather = weather;
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthCell {
    #[serde(with = "iso_date_serde")]
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub campaigns: Vec<CampaignInterval>,
    pub events: Vec<ContextEvent>,
    pub weather: Option<DailyWeather>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthProjection {
    #[serde(with = "iso_date_serde")]
    pub month: NaiveDate,
    pub cells: Vec<MonthCell>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    #[serde(with = "iso_date_serde")]
    pub date: NaiveDate,
    pub is_today: bool,
    pub campaigns: Vec<CampaignInterval>,
    pub events: Vec<ContextEvent>,
}

/// A lane assignment joined with its campaign and clipping flags.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaneBlock {
    pub assignment: LaneAssignment,
    pub campaign: CampaignInterval,
    pub edges: ClipEdges,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekProjection {
    pub week_days: Vec<WeekDay>,
    pub lane_assignments: Vec<LaneAssignment>,
    pub max_rows: usize,
    pub blocks: Vec<LaneBlock>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Projection {
    Month(MonthProjection),
    Week(WeekProjection),
}

/// Builds the projection a [`WindowRequest`] asks for.
#[tracing::instrument(skip(inputs))]
pub fn project(request: WindowRequest, inputs: CalendarInputs<'_>) -> Result<Projection> {
    let window = request.resolve()?;
    Ok(match window.kind() {
        WindowKind::Month => Projection::Month(project_month(&window, inputs)),
        WindowKind::Week => Projection::Week(project_week(&window, inputs)),
    })
}

/// One cell per boundary date of `window`, in order.
#[tracing::instrument(skip_all, fields(first = %window.first(), last = %window.last()))]
pub fn project_month(window: &CalendarWindow, inputs: CalendarInputs<'_>) -> MonthProjection {
    let dates = window.boundary_dates();
    let campaigns = index_by_date(dates, inputs.campaigns);
    let events = index_by_date(dates, inputs.events);
    let weather: BTreeMap<NaiveDate, &DailyWeather> = inputs
        .weather
        .iter()
        .filter(|entry| window.contains(entry.date))
        .map(|entry| (entry.date, entry))
        .collect();

    let cells = dates
        .iter()
        .map(|date| MonthCell {
            date: *date,
            is_current_month: window.is_current_month(*date),
            is_today: *date == inputs.today,
            campaigns: campaigns.get(*date).iter().map(|c| (*c).clone()).collect(),
            events: events.get(*date).iter().map(|e| (*e).clone()).collect(),
            weather: weather.get(date).map(|w| (*w).clone()),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        cells = cells.len(),
        busiest_day = campaigns.peak(),
        weather_days = weather.len(),
        "projected month"
    );

    MonthProjection {
        month: window.anchor(),
        cells,
    }
}

/// Per-day buckets plus lane placement for the week strip.
#[tracing::instrument(skip_all, fields(first = %window.first(), last = %window.last()))]
pub fn project_week(window: &CalendarWindow, inputs: CalendarInputs<'_>) -> WeekProjection {
    let dates = window.boundary_dates();
    let campaigns = index_by_date(dates, inputs.campaigns);
    let events = index_by_date(dates, inputs.events);

    let week_days = dates
        .iter()
        .map(|date| WeekDay {
            date: *date,
            is_today: *date == inputs.today,
            campaigns: campaigns.get(*date).iter().map(|c| (*c).clone()).collect(),
            events: events.get(*date).iter().map(|e| (*e).clone()).collect(),
        })
        .collect::<Vec<_>>();

    let placements = place_campaigns(window, inputs.campaigns);
    let blocks = placements
        .iter()
        .map(|placement| LaneBlock {
            assignment: placement.assignment.clone(),
            campaign: placement.campaign.clone(),
            edges: clip_edges(window, placement.campaign),
        })
        .collect::<Vec<_>>();
    let lane_assignments = placements
        .into_iter()
        .map(|placement| placement.assignment)
        .collect::<Vec<_>>();
    let max_rows = max_rows(&lane_assignments);

    tracing::debug!(
        lanes = lane_assignments.len(),
        max_rows,
        "projected week"
    );

    WeekProjection {
        week_days,
        lane_assignments,
        max_rows,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{CampaignStatus, EventCategory, WeatherCondition};
    use crate::window::{month_window, week_window};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn campaign(id: &str, start: NaiveDate, end: NaiveDate) -> CampaignInterval {
        CampaignInterval::new(id, start, end, CampaignStatus::Active).expect("valid campaign")
    }

    #[test]
    fn month_projection_fills_all_cells() {
        let campaigns = vec![campaign("sale", date(2024, 2, 28), date(2024, 3, 2))];
        let events = vec![
            ContextEvent::new("leap", date(2024, 2, 29), None, EventCategory::Other)
                .expect("valid event"),
        ];
        let weather = vec![DailyWeather {
            date: date(2024, 3, 1),
            condition: WeatherCondition::Rain,
            high_c: Some(12.5),
            low_c: None,
        }];
        let inputs =
            CalendarInputs::new(date(2024, 3, 1), &campaigns, &events).with_weather(&weather);

        let projection = project_month(&month_window(2024, 3).expect("window"), inputs);

        assert_eq!(projection.cells.len(), 42);
        assert_eq!(projection.month, date(2024, 3, 1));

        let feb_29 = &projection.cells[3];
        assert_eq!(feb_29.date, date(2024, 2, 29));
        assert!(!feb_29.is_current_month);
        assert_eq!(feb_29.campaigns.len(), 1);
        assert_eq!(feb_29.events.len(), 1);

        let mar_1 = &projection.cells[4];
        assert!(mar_1.is_current_month);
        assert!(mar_1.is_today);
        assert_eq!(
            mar_1.weather.as_ref().map(|w| w.condition),
            Some(WeatherCondition::Rain)
        );
        assert_eq!(projection.cells.iter().filter(|c| c.is_today).count(), 1);
    }

    #[test]
    fn week_projection_reports_lanes_and_rows() {
        let campaigns = vec![
            campaign("A", date(2024, 3, 1), date(2024, 3, 6)),
            campaign("B", date(2024, 3, 5), date(2024, 3, 5)),
        ];
        let inputs = CalendarInputs::new(date(2024, 3, 5), &campaigns, &[]);

        let projection = project(
            WindowRequest::Week {
                year: 2024,
                month: 3,
                day: 4,
            },
            inputs,
        )
        .expect("project week");

        let Projection::Week(week) = projection else {
            panic!("expected week projection");
        };
        assert_eq!(week.week_days.len(), 7);
        assert!(week.week_days[1].is_today);
        assert_eq!(week.week_days[1].campaigns.len(), 2);
        assert_eq!(week.max_rows, 2);
        assert_eq!(week.blocks.len(), 2);
        assert!(week.blocks[0].edges.continues_before);
        assert!(!week.blocks[0].edges.continues_after);
    }

    #[test]
    fn empty_week_still_has_one_row() {
        let inputs = CalendarInputs::new(date(2024, 3, 5), &[], &[]);

        let week = project_week(&week_window(2024, 3, 5).expect("window"), inputs);

        assert!(week.lane_assignments.is_empty());
        assert_eq!(week.max_rows, 1);
    }

    #[test]
    fn projection_serializes_with_kind_tag() {
        let inputs = CalendarInputs::new(date(2024, 3, 5), &[], &[]);

        let projection = project(WindowRequest::Month { year: 2024, month: 3 }, inputs)
            .expect("project month");
        let json = serde_json::to_value(&projection).expect("serialize");

        assert_eq!(json["kind"], "month");
        assert_eq!(json["month"], "2024-03-01");
        assert_eq!(json["cells"][0]["date"], "2024-02-26");
        assert_eq!(json["cells"][0]["isCurrentMonth"], false);
    }

    #[test]
    fn project_rolls_requested_month_over() {
        let inputs = CalendarInputs::new(date(2024, 12, 31), &[], &[]);

        let projection = project(WindowRequest::Month { year: 2024, month: 13 }, inputs)
            .expect("project month");

        let Projection::Month(month) = projection else {
            panic!("expected month projection");
        };
        assert_eq!(month.month, date(2025, 1, 1));
        assert_eq!(month.cells.len(), 42);
        assert_eq!(month.cells[0].date, date(2024, 12, 30));
        assert!(month.cells[1].is_today);
    }
}
