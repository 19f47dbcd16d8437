//! Which dates have data.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

/// Global dates plus, once a region is selected, that region's dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateAvailability {
    global: BTreeSet<NaiveDate>,
    region: Option<(String, BTreeSet<NaiveDate>)>,
}

impl DateAvailability {
    pub fn new(global: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            global: global.into_iter().collect(),
            region: None,
        }
    }

    pub fn set_global(&mut self, dates: impl IntoIterator<Item = NaiveDate>) {
        self.global = dates.into_iter().collect();
    }

    /// Restrict availability to the dates of one region.
    pub fn set_region(&mut self, region_id: impl Into<String>, dates: impl IntoIterator<Item = NaiveDate>) {
        self.region = Some((region_id.into(), dates.into_iter().collect()));
    }

    pub fn clear_region(&mut self) {
        self.region = None;
    }

    pub fn region_id(&self) -> Option<&str> {
        self.region.as_ref().map(|(id, _)| id.as_str())
    }

    /// The dates that count right now.
    fn active(&self) -> &BTreeSet<NaiveDate> {
        match &self.region {
            Some((_, dates)) => dates,
            None => &self.global,
        }
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.active().contains(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.active().iter().copied()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.active().iter().next().copied()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.active().iter().next_back().copied()
    }

    /// Months with data as `YYYY-MM`, ascending.
    pub fn months(&self) -> Vec<String> {
        let months: BTreeSet<(i32, u32)> =
            self.active().iter().map(|d| (d.year(), d.month())).collect();
        months
            .into_iter()
            .map(|(y, m)| format!("{:04}-{:02}", y, m))
            .collect()
    }

    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.active().iter().map(|d| d.year()).collect();
        years.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample() -> DateAvailability {
        DateAvailability::new([d("2023-01-01"), d("2023-01-05"), d("2023-02-10"), d("2022-12-31")])
    }

    #[test]
    fn test_global_dates() {
        let a = sample();
        assert!(a.is_available(d("2023-01-05")));
        assert!(!a.is_available(d("2023-01-10")));
        assert_eq!(a.min_date(), Some(d("2022-12-31")));
        assert_eq!(a.max_date(), Some(d("2023-02-10")));
        assert_eq!(a.months(), vec!["2022-12", "2023-01", "2023-02"]);
        assert_eq!(a.years(), vec![2022, 2023]);
    }

    #[test]
    fn test_region_restricts() {
        let mut a = sample();
        a.set_region("CHE", [d("2023-01-05")]);
        assert_eq!(a.region_id(), Some("CHE"));
        assert!(a.is_available(d("2023-01-05")));
        assert!(!a.is_available(d("2023-01-01")));
        assert_eq!(a.months(), vec!["2023-01"]);

        a.clear_region();
        assert!(a.is_available(d("2023-01-01")));
    }

    #[test]
    fn test_empty() {
        let a = DateAvailability::default();
        assert_eq!(a.min_date(), None);
        assert!(a.months().is_empty());
    }
}
