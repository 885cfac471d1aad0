use std::cmp::Ordering;

use serde::{
  Deserialize,
  Serialize
};

use crate::model::CampaignInterval;
use crate::window::CalendarWindow;

/// Where one campaign sits in the week
/// strip. Columns are inclusive and
/// already clipped to the window.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "camelCase")]
pub struct LaneAssignment {
  pub campaign_id:  String,
  pub start_column: usize,
  pub end_column:   usize,
  pub row:          usize
}

impl LaneAssignment {
  pub fn span(&self) -> usize {
    self.end_column - self.start_column
      + 1
  }

  /// True when both assignments cover at
  /// least one common column.
  pub fn overlaps(
    &self,
    other: &Self
  ) -> bool {
    self.start_column
      <= other.end_column
      && other.start_column
        <= self.end_column
  }
}

/// Whether a campaign really starts and
/// ends inside the window, or was cut at
/// its edges. Presentation only.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct ClipEdges {
  pub continues_before: bool,
  pub continues_after:  bool
}

pub fn clip_edges(
  window: &CalendarWindow,
  campaign: &CampaignInterval
) -> ClipEdges {
  ClipEdges {
    continues_before: campaign
      .start_date()
      < window.first(),
    continues_after:  campaign.end_date()
      > window.last()
  }
}

/// Per-row column occupancy.
struct Occupancy {
  width: usize,
  rows:  Vec<Vec<bool>>
}

impl Occupancy {
  fn new(width: usize) -> Self {
    Self {
      width,
      rows: Vec::new()
    }
  }

  fn is_free(
    &self,
    row: usize,
    start: usize,
    end: usize
  ) -> bool {
    self.rows[row][start..=end]
      .iter()
      .all(|taken| !taken)
  }

  /// Claims `[start, end]` on the first
  /// row where all those columns are
  /// free, opening a new row if needed.
  fn claim(
    &mut self,
    start: usize,
    end: usize
  ) -> usize {
    let row = (0..self.rows.len())
      .find(|row| {
        self.is_free(*row, start, end)
      })
      .unwrap_or_else(|| {
        self
          .rows
          .push(vec![false; self.width]);
        self.rows.len() - 1
      });

    for cell in
      &mut self.rows[row][start..=end]
    {
      *cell = true;
    }
    row
  }
}

/// Longer campaigns first among those
/// starting the same day; id last so the
/// result never depends on input order.
fn placement_order(
  a: &CampaignInterval,
  b: &CampaignInterval
) -> Ordering {
  a.start_date()
    .cmp(&b.start_date())
    .then_with(|| {
      b.duration_days()
        .cmp(&a.duration_days())
    })
    .then_with(|| a.id().cmp(b.id()))
}

/// A lane assignment still tied to the
/// campaign it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<'a> {
  pub assignment: LaneAssignment,
  pub campaign:   &'a CampaignInterval
}

/// Places every campaign visible in
/// `window` on a lane.
///
/// Campaigns are sorted by start date,
/// then by duration descending, then by
/// id (stable), and each takes the
/// lowest row whose clipped columns are
/// all free. Campaigns outside the
/// window are left out of the result.
pub fn assign_lanes(
  window: &CalendarWindow,
  campaigns: &[CampaignInterval]
) -> Vec<LaneAssignment> {
  place_campaigns(window, campaigns)
    .into_iter()
    .map(|placement| {
      placement.assignment
    })
    .collect()
}

/// Same placement as [`assign_lanes`],
/// keeping a borrow of each campaign.
#[tracing::instrument(
  skip_all,
  fields(
    window_len = window.len(),
    campaigns = campaigns.len()
  )
)]
pub fn place_campaigns<'a>(
  window: &CalendarWindow,
  campaigns: &'a [CampaignInterval]
) -> Vec<Placement<'a>> {
  let mut visible = campaigns
    .iter()
    .filter(|campaign| {
      window.intersects(
        campaign.start_date(),
        campaign.end_date()
      )
    })
    .collect::<Vec<_>>();
  visible.sort_by(|a, b| {
    placement_order(a, b)
  });

  let mut occupancy =
    Occupancy::new(window.len());
  let placements = visible
    .into_iter()
    .map(|campaign| {
      let start_column = window
        .clamped_column(
          campaign.start_date()
        );
      let end_column = window
        .clamped_column(
          campaign.end_date()
        );
      let row = occupancy
        .claim(start_column, end_column);
      Placement {
        assignment: LaneAssignment {
          campaign_id: campaign
            .id()
            .to_string(),
          start_column,
          end_column,
          row
        },
        campaign
      }
    })
    .collect::<Vec<_>>();

  tracing::debug!(
    placed = placements.len(),
    rows = occupancy.rows.len(),
    "assigned campaign lanes"
  );
  placements
}

/// Rows a renderer must reserve: one
/// more than the highest row, and never
/// less than one.
pub fn max_rows(
  assignments: &[LaneAssignment]
) -> usize {
  assignments
    .iter()
    .map(|assignment| assignment.row + 1)
    .max()
    .unwrap_or(1)
}
