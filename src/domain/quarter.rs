use chrono::{DateTime, Datelike, Months, Utc};
use serde::Serialize;

/// Calendar quarter of a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DateQuarter {
    pub year: i32,
    pub quarter: u8,
}

impl DateQuarter {
    pub fn from_date(date: DateTime<Utc>) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    /// Years a "recent" chart covers: this one and the one before.
    pub fn chart_years(&self) -> [i32; 2] {
        [self.year, self.year - 1]
    }
}

/// `date` moved back by whole months, clamped to the start of the calendar
/// if the subtraction underflows.
pub fn months_before(date: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_quarter_boundaries() {
        let at = |m, d| Utc.with_ymd_and_hms(2024, m, d, 12, 0, 0).unwrap();
        assert_eq!(DateQuarter::from_date(at(1, 1)).quarter, 1);
        assert_eq!(DateQuarter::from_date(at(3, 31)).quarter, 1);
        assert_eq!(DateQuarter::from_date(at(4, 1)).quarter, 2);
        assert_eq!(DateQuarter::from_date(at(9, 30)).quarter, 3);
        assert_eq!(DateQuarter::from_date(at(12, 31)).quarter, 4);
        assert_eq!(DateQuarter::from_date(at(12, 31)).chart_years(), [2024, 2023]);
    }

    #[test]
    fn test_months_before_clamps_month_end() {
        let end_of_august = Utc.with_ymd_and_hms(2024, 8, 31, 0, 0, 0).unwrap();
        let edge = months_before(end_of_august, 6);
        assert_eq!(edge, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }
}
