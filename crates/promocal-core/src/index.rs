use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{CampaignInterval, ContextEvent};

/// Anything that covers an inclusive range of calendar days.
pub trait DateRanged {
    fn first_day(&self) -> NaiveDate;

    fn last_day(&self) -> NaiveDate;

    fn is_active_on(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }
}

impl DateRanged for CampaignInterval {
    fn first_day(&self) -> NaiveDate {
        self.start_date()
    }

    fn last_day(&self) -> NaiveDate {
        self.end_date()
    }
}

impl DateRanged for ContextEvent {
    fn first_day(&self) -> NaiveDate {
        self.event_date()
    }

    fn last_day(&self) -> NaiveDate {
        self.last_date()
    }
}

/// Items active on each boundary date of a window.
///
/// Every boundary date has a bucket, possibly empty. Buckets borrow from the
/// caller's slice and keep its order.
#[derive(Debug, Clone)]
pub struct DateIndex<'a, T> {
    buckets: BTreeMap<NaiveDate, Vec<&'a T>>,
}

impl<'a, T> DateIndex<'a, T> {
    /// Items active on `date`; empty for dates outside the window.
    pub fn get(&self, date: NaiveDate) -> &[&'a T] {
        self.buckets.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.buckets.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[&'a T])> {
        self.buckets.iter().map(|(date, items)| (*date, items.as_slice()))
    }

    /// Number of items active on `date`.
    pub fn count_on(&self, date: NaiveDate) -> usize {
        self.get(date).len()
    }

    /// Largest bucket size across the window.
    pub fn peak(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// Buckets `items` by the boundary dates they are active on.
#[tracing::instrument(skip_all, fields(dates = boundary_dates.len(), items = items.len()))]
pub fn index_by_date<'a, T: DateRanged>(
    boundary_dates: &[NaiveDate],
    items: &'a [T],
) -> DateIndex<'a, T> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&'a T>> = boundary_dates
        .iter()
        .map(|date| (*date, Vec::new()))
        .collect();

    for item in items {
        for date in boundary_dates {
            if item.is_active_on(*date)
                && let Some(bucket) = buckets.get_mut(date)
            {
                bucket.push(item);
            }
        }
    }

    let placed: usize = buckets.values().map(Vec::len).sum();
    tracing::debug!(buckets = buckets.len(), placed, "indexed items by date");

    DateIndex { buckets }
}
