//! Month timeline shared by every time-based sheet
//!
//! Month offset `k` (0-based) lives in spreadsheet column `k + 2` (1-based),
//! so offset 0 is column B and offset 59 is column BI.

use crate::error::{PatchError, PatchResult};
use crate::excel::column_letter;
use chrono::{Datelike, Months, NaiveDate};

/// First column (0-based) holding month data
pub const FIRST_MONTH_COL: u16 = 1;

/// Format used for month labels: `Jan '25`
pub const LABEL_FORMAT: &str = "%b '%y";

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    start: NaiveDate,
    months: u16,
}

impl Timeline {
    /// Build a timeline; `start` is normalized to the first of its month
    pub fn new(start: NaiveDate, months: u16) -> PatchResult<Self> {
        if months == 0 {
            return Err(PatchError::Timeline(
                "timeline needs at least one month".to_string(),
            ));
        }
        let start = start
            .with_day(1)
            .ok_or_else(|| PatchError::Timeline(format!("invalid start date {}", start)))?;
        let timeline = Self { start, months };
        // Every month must be representable
        timeline.date(months - 1)?;
        Ok(timeline)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn months(&self) -> u16 {
        self.months
    }

    pub fn offsets(&self) -> impl Iterator<Item = u16> {
        0..self.months
    }

    /// First day of the month at `offset`
    pub fn date(&self, offset: u16) -> PatchResult<NaiveDate> {
        self.start
            .checked_add_months(Months::new(offset as u32))
            .ok_or_else(|| PatchError::Timeline(format!("month offset {} out of range", offset)))
    }

    /// Label such as `Dec '25`
    pub fn label(&self, offset: u16) -> PatchResult<String> {
        Ok(format_label(self.date(offset)?))
    }

    pub fn labels(&self) -> PatchResult<Vec<String>> {
        self.offsets().map(|k| self.label(k)).collect()
    }

    /// Column letter holding `offset`
    pub fn column(&self, offset: u16) -> String {
        column_letter(FIRST_MONTH_COL + offset)
    }

    pub fn first_column(&self) -> String {
        self.column(0)
    }

    pub fn last_column(&self) -> String {
        self.column(self.months - 1)
    }

    /// Offset for a label, if it falls inside the timeline
    pub fn offset_of(&self, label: &str) -> Option<u16> {
        self.offsets()
            .find(|&k| self.label(k).map(|l| l == label).unwrap_or(false))
    }

    /// Calendar years fully covered by the timeline with their first/last offsets
    pub fn full_years(&self) -> Vec<(i32, u16, u16)> {
        let mut years = Vec::new();
        for k in self.offsets() {
            let Ok(date) = self.date(k) else { break };
            if date.month() == 1 && k + 11 < self.months {
                years.push((date.year(), k, k + 11));
            }
        }
        years
    }

    /// Full years that get an annual summary column. The first twelve month
    /// columns share rows 42-54 with the input block, so years starting
    /// there are left out unless `include_first` is set.
    pub fn summary_years(&self, include_first: bool) -> Vec<(i32, u16, u16)> {
        self.full_years()
            .into_iter()
            .filter(|&(_, first, _)| include_first || first >= 12)
            .collect()
    }
}

pub fn format_label(date: NaiveDate) -> String {
    date.format(LABEL_FORMAT).to_string()
}

/// Parse a `Jan '25` label back to the first day of that month
pub fn parse_label(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01 {}", label.trim()), "%d %b '%y").ok()
}

/// Gold price curve compounding an annual growth rate monthly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldPriceCurve {
    pub initial: f64,
    pub annual_growth: f64,
}

impl GoldPriceCurve {
    pub fn monthly_rate(&self) -> f64 {
        (1.0 + self.annual_growth).powf(1.0 / 12.0) - 1.0
    }

    pub fn price(&self, offset: u16) -> f64 {
        self.initial * (1.0 + self.monthly_rate()).powi(offset as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_2025() -> Timeline {
        Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 60).unwrap()
    }

    #[test]
    fn test_labels_and_columns() {
        let t = jan_2025();
        assert_eq!(t.label(0).unwrap(), "Jan '25");
        assert_eq!(t.label(11).unwrap(), "Dec '25");
        assert_eq!(t.label(59).unwrap(), "Dec '29");
        assert_eq!(t.first_column(), "B");
        assert_eq!(t.column(11), "M");
        assert_eq!(t.last_column(), "BI");
    }

    #[test]
    fn test_dec_2025_start_spans_into_2030() {
        let t = Timeline::new(NaiveDate::from_ymd_opt(2025, 12, 15).unwrap(), 60).unwrap();
        assert_eq!(t.start(), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(t.label(0).unwrap(), "Dec '25");
        assert_eq!(t.label(1).unwrap(), "Jan '26");
        assert_eq!(t.label(59).unwrap(), "Nov '30");
    }

    #[test]
    fn test_offset_of() {
        let t = jan_2025();
        assert_eq!(t.offset_of("Jan '25"), Some(0));
        assert_eq!(t.offset_of("Dec '25"), Some(11));
        assert_eq!(t.offset_of("Jan '26"), Some(12));
        assert_eq!(t.offset_of("Jan '31"), None);
    }

    #[test]
    fn test_full_years() {
        let years = jan_2025().full_years();
        assert_eq!(years.len(), 5);
        assert_eq!(years[0], (2025, 0, 11));
        assert_eq!(years[1], (2026, 12, 23));
        assert_eq!(years[4], (2029, 48, 59));

        let dec = Timeline::new(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(), 60).unwrap();
        let years = dec.full_years();
        assert_eq!(years.first(), Some(&(2026, 1, 12)));
        assert_eq!(years.last(), Some(&(2029, 37, 48)));
    }

    #[test]
    fn test_summary_years_skip_first_block() {
        let t = jan_2025();
        let years: Vec<i32> = t.summary_years(false).iter().map(|y| y.0).collect();
        assert_eq!(years, vec![2026, 2027, 2028, 2029]);
        assert_eq!(t.summary_years(true).len(), 5);

        let dec = Timeline::new(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(), 60).unwrap();
        assert_eq!(dec.summary_years(false).first(), Some(&(2027, 13, 24)));
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(
            parse_label("Sep '25"),
            Some(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        );
        assert_eq!(parse_label("Sept 2025"), None);
    }

    #[test]
    fn test_zero_months_rejected() {
        assert!(Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 0).is_err());
    }

    #[test]
    fn test_gold_price_compounds_to_annual_rate() {
        let curve = GoldPriceCurve {
            initial: 2892.6,
            annual_growth: 0.03,
        };
        assert_eq!(curve.price(0), 2892.6);
        assert!((curve.price(12) - 2892.6 * 1.03).abs() < 1e-6);
        assert!((curve.monthly_rate() - 0.002466).abs() < 1e-5);
    }
}
