use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;

use crate::core::error::{AppError, AppResult};
use crate::domain::enums::parse_enum;
use crate::domain::{CompanyType, DeveloperGrade, KazakhstanCity};

/// Filters for a salary chart. Empty lists and `None` leave a dimension
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartFilterCriteria {
    pub grade: Option<DeveloperGrade>,
    pub professions_to_include: Vec<i64>,
    pub cities: Vec<KazakhstanCity>,
    pub company_type: Option<CompanyType>,
    pub date_range: DateRange,
}

/// Optional creation-time bounds, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

impl ChartFilterCriteria {
    pub fn has_any_filter(&self) -> bool {
        self.grade.is_some()
            || !self.professions_to_include.is_empty()
            || !self.cities.is_empty()
            || self.company_type.is_some()
            || !self.date_range.is_empty()
    }

    /// Reads criteria from raw query pairs.
    ///
    /// List parameters (`profsInclude`, `cities`) may repeat and may hold
    /// comma-separated values. Enum values are names or numeric ids.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for unparsable values, a repeated
    /// single-valued parameter, or `from` later than `to`.
    pub fn from_query_pairs(pairs: &[(String, String)]) -> AppResult<Self> {
        let grade = single_value(pairs, "grade")?
            .map(|raw| parse_enum("grade", raw, DeveloperGrade::from_repr))
            .transpose()?;

        let company_type = single_value(pairs, "companyType")?
            .map(|raw| parse_enum("companyType", raw, CompanyType::from_repr))
            .transpose()?;

        let professions_to_include = list_values(pairs, "profsInclude")
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| AppError::Validation(format!("Invalid value '{}' for 'profsInclude'", raw)))
            })
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .unique()
            .collect();

        let cities = list_values(pairs, "cities")
            .map(|raw| parse_enum("cities", raw, KazakhstanCity::from_repr))
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .unique()
            .collect();

        let date_range = DateRange {
            from: single_value(pairs, "from")?.map(|raw| parse_date("from", raw)).transpose()?,
            to: single_value(pairs, "to")?.map(|raw| parse_date("to", raw)).transpose()?,
        };
        if let (Some(from), Some(to)) = (date_range.from, date_range.to) {
            if from > to {
                return Err(AppError::Validation("'from' must not be later than 'to'".to_string()));
            }
        }

        Ok(Self {
            grade,
            professions_to_include,
            cities,
            company_type,
            date_range,
        })
    }
}

/// Every non-empty value for `key`, splitting comma-separated lists.
pub fn list_values<'a>(pairs: &'a [(String, String)], key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    pairs
        .iter()
        .filter(move |(k, _)| k == key)
        .flat_map(|(_, v)| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The value of a parameter that may appear at most once.
pub fn single_value<'a>(pairs: &'a [(String, String)], key: &str) -> AppResult<Option<&'a str>> {
    let mut values = pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty());

    let first = values.next();
    if values.next().is_some() {
        return Err(AppError::Validation(format!("'{}' must be given once", key)));
    }
    Ok(first)
}

/// RFC 3339 timestamps, or plain dates taken as midnight UTC.
fn parse_date(field: &str, raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Ok(value.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::Validation(format!("Invalid date '{}' for '{}'", raw, field)))
}
