//! Chart aggregation over filtered salaries.

use std::collections::BTreeMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

use crate::domain::{CompanyType, DeveloperGrade, SalaryRecord, UserSalaryAdminDto, UserSalaryDto};

/// Record count per key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartAggregate<K> {
    pub total_count: usize,
    pub buckets: Vec<ChartBucket<K>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBucket<K> {
    pub key: K,
    pub count: usize,
}

/// Groups `salaries` by one dimension. Buckets come out sorted by key.
pub fn aggregate_by<K, F>(salaries: &[UserSalaryDto], key: F) -> ChartAggregate<K>
where
    K: Eq + Hash + Ord,
    F: Fn(&UserSalaryDto) -> K,
{
    let buckets = salaries
        .iter()
        .map(key)
        .counts()
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(key, count)| ChartBucket { key, count })
        .collect();

    ChartAggregate {
        total_count: salaries.len(),
        buckets,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleByGradesChartData {
    pub all_count: usize,
    pub data: Vec<PeopleByGradesChartDataItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeopleByGradesChartDataItem {
    pub grade: DeveloperGrade,
    pub count: usize,
}

impl PeopleByGradesChartData {
    /// Records without a grade are counted under [`DeveloperGrade::Unknown`].
    pub fn new(salaries: &[UserSalaryDto]) -> Self {
        let aggregate = aggregate_by(salaries, |s| s.grade.unwrap_or(DeveloperGrade::Unknown));
        Self {
            all_count: aggregate.total_count,
            data: aggregate
                .buckets
                .into_iter()
                .map(|b| PeopleByGradesChartDataItem {
                    grade: b.key,
                    count: b.count,
                })
                .collect(),
        }
    }
}

/// What an anonymous or salary-less caller sees: values without context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryValue {
    pub company: CompanyType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartSalaries {
    Full(Vec<UserSalaryDto>),
    ValuesOnly(Vec<SalaryValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalariesChartResponse {
    pub salaries: ChartSalaries,
    pub total_count: usize,
    pub require_own_salary: bool,
    pub has_authentication: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_salary: Option<UserSalaryAdminDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_survey_reply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_by_grades: Option<PeopleByGradesChartData>,
    pub salary_added_edge: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

impl SalariesChartResponse {
    /// Aggregate-only answer for callers who have not shared their own salary.
    pub fn require_own_salary(
        salaries: &[UserSalaryDto],
        has_authentication: bool,
        salary_added_edge: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let values = salaries
            .iter()
            .map(|s| SalaryValue {
                company: s.company,
                value: s.value,
            })
            .collect();

        Self {
            salaries: ChartSalaries::ValuesOnly(values),
            total_count: salaries.len(),
            require_own_salary: true,
            has_authentication,
            own_salary: None,
            has_survey_reply: None,
            people_by_grades: None,
            salary_added_edge,
            generated_at: now,
        }
    }

    /// Full answer for a caller with a recent submission of their own.
    pub fn full(
        salaries: Vec<UserSalaryDto>,
        own_salary: &SalaryRecord,
        has_survey_reply: bool,
        salary_added_edge: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            total_count: salaries.len(),
            people_by_grades: Some(PeopleByGradesChartData::new(&salaries)),
            salaries: ChartSalaries::Full(salaries),
            require_own_salary: false,
            has_authentication: true,
            own_salary: Some(UserSalaryAdminDto::from(own_salary)),
            has_survey_reply: Some(has_survey_reply),
            salary_added_edge,
            generated_at: now,
        }
    }
}

/// Salary statistics for one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalBucket {
    pub year: i32,
    pub quarter: u8,
    pub count: usize,
    pub median: f64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalariesHistoricalChartResponse {
    pub total_count: usize,
    pub buckets: Vec<HistoricalBucket>,
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl SalariesHistoricalChartResponse {
    pub fn new(salaries: &[UserSalaryDto], from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> Self {
        let mut by_quarter: BTreeMap<(i32, u8), Vec<f64>> = BTreeMap::new();
        for salary in salaries {
            by_quarter
                .entry((salary.year, salary.quarter))
                .or_default()
                .push(salary.value);
        }

        let buckets = by_quarter
            .into_iter()
            .filter_map(|((year, quarter), mut values)| {
                Some(HistoricalBucket {
                    year,
                    quarter,
                    count: values.len(),
                    average: average(&values)?,
                    median: median(&mut values)?,
                })
            })
            .collect();

        Self {
            total_count: salaries.len(),
            buckets,
            from,
            to,
        }
    }
}

/// Middle value; the mean of the two middle values for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
