//! Commit activity histograms with busiest-bucket tracking

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

/// Counter map that remembers its largest bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusiestCounter<K: Ord> {
    pub counts: BTreeMap<K, u64>,
    pub busiest: u64,
}

impl<K: Ord> Default for BusiestCounter<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            busiest: 0,
        }
    }
}

impl<K: Ord> BusiestCounter<K> {
    /// Add one to `key`, returning the new bucket count
    pub fn increment(&mut self, key: K) -> u64 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        self.busiest = self.busiest.max(*count);
        *count
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Commits per weekday (0 = Monday) and hour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HourOfWeek {
    pub counts: BTreeMap<u32, BTreeMap<u32, u64>>,
    pub busiest: u64,
}

impl HourOfWeek {
    pub fn increment(&mut self, weekday: u32, hour: u32) -> u64 {
        let count = self
            .counts
            .entry(weekday)
            .or_default()
            .entry(hour)
            .or_insert(0);
        *count += 1;
        self.busiest = self.busiest.max(*count);
        *count
    }

    pub fn get(&self, weekday: u32, hour: u32) -> u64 {
        self.counts
            .get(&weekday)
            .and_then(|hours| hours.get(&hour))
            .copied()
            .unwrap_or(0)
    }
}

/// Calendar histograms of commit times, all in UTC
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    pub hour_of_day: BusiestCounter<u32>,
    /// 0 = Monday
    pub day_of_week: BTreeMap<u32, u64>,
    pub hour_of_week: HourOfWeek,
    /// 1 = January
    pub month_of_year: BTreeMap<u32, u64>,
    /// `%Y-%W` week buckets, the busiest being the peak
    pub year_week: BusiestCounter<String>,
}

impl ActivityStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one commit made at `date`
    pub fn record(&mut self, date: &DateTime<Utc>) {
        let hour = date.hour();
        let weekday = date.weekday().num_days_from_monday();

        self.hour_of_day.increment(hour);
        *self.day_of_week.entry(weekday).or_insert(0) += 1;
        self.hour_of_week.increment(weekday, hour);
        *self.month_of_year.entry(date.month()).or_insert(0) += 1;
        self.year_week.increment(date.format("%Y-%W").to_string());
    }
}
