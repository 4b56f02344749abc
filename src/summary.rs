use std::collections::{btree_map, BTreeMap};

use log::debug;
use miette::Diagnostic;
use thiserror::Error;
use time::Date;

use crate::observation::{Observation, ObservationTable};

#[derive(Debug, Error, Diagnostic)]
pub enum AggregationError {
    #[error("No observation left to summarise, the {column} series is empty")]
    #[diagnostic(
        code(meteo_report::aggregation::empty_series),
        help("every row was either missing or had no precipitation value")
    )]
    EmptySeries { column: &'static str },
}

/// Precipitation summed per month number, ascending. Only months that appear
/// in the data have an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyPrecipitation(BTreeMap<u8, f64>);

impl MonthlyPrecipitation {
    pub fn from_table(table: &ObservationTable) -> Self {
        let mut months = BTreeMap::new();
        for row in table {
            *months.entry(row.month()).or_insert(0.0) += row.precipitation_mm;
        }
        Self(months)
    }

    pub fn get(&self, month: u8) -> Option<f64> {
        self.0.get(&month).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0.iter().map(|(month, total)| (*month, *total))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// The `n` wettest months, wettest first. Equal totals keep calendar order.
    pub fn wettest_months(&self, n: usize) -> Vec<u8> {
        let mut months: Vec<(u8, f64)> = self.iter().collect();
        // stable sort, ties stay in month order
        months.sort_by(|(_, left), (_, right)| right.total_cmp(left));
        months.into_iter().take(n).map(|(month, _)| month).collect()
    }
}

impl<'a> IntoIterator for &'a MonthlyPrecipitation {
    type Item = (&'a u8, &'a f64);
    type IntoIter = btree_map::Iter<'a, u8, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub period_start: Date,
    pub period_end: Date,
    pub observed_days: usize,
    pub total_precipitation: f64,
    /// Missing snowfall values are skipped, not counted as zero.
    pub total_snowfall: f64,
    /// First row holding the maximum precipitation.
    pub wettest_day: Observation,
    pub monthly_precipitation: MonthlyPrecipitation,
}

impl Summary {
    pub fn compute(table: &ObservationTable) -> Result<Self, AggregationError> {
        let first = table
            .iter()
            .next()
            .ok_or(AggregationError::EmptySeries { column: "time" })?;

        let mut period_start = first.time;
        let mut period_end = first.time;
        let mut wettest_day = *first;
        let mut total_precipitation = 0.0;
        let mut total_snowfall = 0.0;

        for row in table {
            period_start = period_start.min(row.time);
            period_end = period_end.max(row.time);
            if row.precipitation_mm > wettest_day.precipitation_mm {
                wettest_day = *row;
            }
            total_precipitation += row.precipitation_mm;
            if let Some(snowfall) = row.snowfall_cm {
                total_snowfall += snowfall;
            }
        }

        let monthly_precipitation = MonthlyPrecipitation::from_table(table);
        debug!(
            "{} days summarised over {} months",
            table.len(),
            monthly_precipitation.len()
        );

        Ok(Self {
            period_start,
            period_end,
            observed_days: table.len(),
            total_precipitation,
            total_snowfall,
            wettest_day,
            monthly_precipitation,
        })
    }

    /// `2024` or `2023-2024`, for chart captions.
    pub fn years(&self) -> String {
        let (start, end) = (self.period_start.year(), self.period_end.year());
        if start == end {
            start.to_string()
        } else {
            format!("{start}-{end}")
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use time::Month;

    use super::*;

    fn day(year: i32, month: u8, day: u8, precipitation_mm: f64) -> Observation {
        Observation {
            time: Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap(),
            precipitation_mm,
            snowfall_cm: None,
        }
    }

    #[test]
    fn march_and_april() {
        let table = ObservationTable::new(vec![day(2024, 3, 1, 2.0), day(2024, 4, 1, 5.0)]);
        let summary = Summary::compute(&table).unwrap();

        assert_eq!(summary.observed_days, 2);
        assert_relative_eq!(summary.total_precipitation, 7.0);
        assert_eq!(summary.monthly_precipitation.get(3), Some(2.0));
        assert_eq!(summary.monthly_precipitation.get(4), Some(5.0));
        assert_eq!(summary.monthly_precipitation.len(), 2);
        assert_eq!(summary.wettest_day.time, table.as_slice()[1].time);
        assert_eq!(summary.years(), "2024");
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = Summary::compute(&ObservationTable::default()).unwrap_err();
        assert!(matches!(err, AggregationError::EmptySeries { column: "time" }));
    }

    #[test]
    fn period_ignores_row_order() {
        let table = ObservationTable::new(vec![
            day(2024, 6, 10, 0.0),
            day(2023, 12, 31, 1.0),
            day(2024, 1, 5, 0.5),
        ]);
        let summary = Summary::compute(&table).unwrap();
        assert_eq!(summary.period_start, table.as_slice()[1].time);
        assert_eq!(summary.period_end, table.as_slice()[0].time);
        assert_eq!(summary.years(), "2023-2024");
    }

    #[test]
    fn ties_pick_the_first_row() {
        let table = ObservationTable::new(vec![
            day(2024, 3, 1, 1.0),
            day(2024, 3, 2, 4.0),
            day(2024, 3, 3, 4.0),
            day(2024, 3, 4, 3.9),
        ]);
        let summary = Summary::compute(&table).unwrap();
        assert_eq!(summary.wettest_day, table.as_slice()[1]);
        assert!(table
            .iter()
            .all(|row| summary.wettest_day.precipitation_mm >= row.precipitation_mm));
    }

    #[test]
    fn monthly_sums_add_up_to_the_total() {
        let table: ObservationTable = (1..=28)
            .flat_map(|d| {
                [
                    day(2024, 1, d, f64::from(d) * 0.1),
                    day(2024, 2, d, f64::from(d) * 0.3),
                    day(2024, 7, d, 1.7),
                ]
            })
            .collect();
        let summary = Summary::compute(&table).unwrap();
        let sum: f64 = table.iter().map(|row| row.precipitation_mm).sum();

        assert_relative_eq!(summary.total_precipitation, sum, epsilon = 1e-9);
        assert_relative_eq!(
            summary.monthly_precipitation.total(),
            summary.total_precipitation,
            epsilon = 1e-9
        );
        let months: Vec<u8> = summary.monthly_precipitation.iter().map(|(m, _)| m).collect();
        assert_eq!(months, vec![1, 2, 7]);
    }

    #[test]
    fn snowfall_skips_missing_values() {
        let mut rows = vec![day(2024, 1, 1, 0.0), day(2024, 1, 2, 0.0), day(2024, 1, 3, 0.0)];
        rows[0].snowfall_cm = Some(2.5);
        rows[2].snowfall_cm = Some(1.0);
        let summary = Summary::compute(&ObservationTable::new(rows)).unwrap();
        assert_relative_eq!(summary.total_snowfall, 3.5);
    }

    #[test]
    fn wettest_months() {
        let table = ObservationTable::new(vec![
            day(2024, 3, 1, 2.0),
            day(2024, 5, 1, 9.0),
            day(2024, 6, 1, 2.0),
            day(2024, 4, 1, 5.0),
        ]);
        let monthly = MonthlyPrecipitation::from_table(&table);
        assert_eq!(monthly.wettest_months(2), vec![5, 4]);
        assert_eq!(monthly.wettest_months(4), vec![5, 4, 3, 6]);
        assert_eq!(monthly.wettest_months(10).len(), 4);
    }
}
