//! Fixed filter chain for chart queries.
//!
//! A query is an ordered list of predicates. Stages whose criterion is absent
//! are left out, so an empty [`ChartFilterCriteria`] keeps only the always-on
//! stages. The survivors are projected to [`UserSalaryDto`] and sorted by value.

use chrono::{DateTime, Datelike, Utc};

use crate::core::config;
use crate::domain::quarter::months_before;
use crate::domain::{
    expand_developer_professions, CompanyType, DateQuarter, DeveloperGrade, KazakhstanCity, SalaryRecord,
    UserProfession, UserSalaryDto,
};
use crate::salaries::criteria::ChartFilterCriteria;

pub type SalaryPredicate = Box<dyn Fn(&SalaryRecord) -> bool + Send + Sync>;

/// Chart query resolved against a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SalariesForChartQuery {
    pub current_quarter: DateQuarter,
    /// Oldest submission year kept; the chart window is this year and the prior one
    pub first_year: i32,
    /// Oldest creation time that still counts
    pub salary_added_edge: DateTime<Utc>,
    pub added_until: Option<DateTime<Utc>>,
    pub grade: Option<DeveloperGrade>,
    /// Requested professions with developer subtypes already folded in
    pub professions_to_include: Vec<i64>,
    pub cities: Vec<KazakhstanCity>,
    pub company_type: Option<CompanyType>,
}

impl SalariesForChartQuery {
    pub fn new(criteria: &ChartFilterCriteria, now: DateTime<Utc>) -> Self {
        let salary_added_edge = criteria
            .date_range
            .from
            .unwrap_or_else(|| months_before(now, config::salaries::RECENCY_WINDOW_MONTHS));

        let current_quarter = DateQuarter::from_date(now);
        let [_, prior_year] = current_quarter.chart_years();

        Self {
            current_quarter,
            first_year: prior_year,
            salary_added_edge,
            added_until: criteria.date_range.to,
            grade: criteria.grade,
            professions_to_include: expand_developer_professions(&criteria.professions_to_include),
            cities: criteria.cities.clone(),
            company_type: criteria.company_type,
        }
    }

    /// Query for the historical chart: the year window reaches back to the
    /// year of an explicit `from` when that is older than the prior year.
    pub fn historical(criteria: &ChartFilterCriteria, now: DateTime<Utc>) -> Self {
        let mut query = Self::new(criteria, now);
        if let Some(from) = criteria.date_range.from {
            query.first_year = query.first_year.min(from.year());
        }
        query
    }

    /// The ordered predicate chain.
    pub fn predicates(&self) -> Vec<SalaryPredicate> {
        let mut chain = vec![
            used_in_stats(),
            not_hr_non_it(),
            within_years(self.first_year, self.current_quarter.year),
            added_since(self.salary_added_edge),
        ];

        if let Some(until) = self.added_until {
            chain.push(added_until(until));
        }
        if let Some(company) = self.company_type {
            chain.push(company_is(company));
        }
        if !self.cities.is_empty() {
            chain.push(city_in(self.cities.clone()));
        }
        if let Some(grade) = self.grade {
            chain.push(grade_is(grade));
        }
        if !self.professions_to_include.is_empty() {
            chain.push(profession_in(self.professions_to_include.clone()));
        }

        chain
    }

    /// Runs the chain over `records` and returns the survivors, cheapest first.
    pub fn apply(&self, records: Vec<SalaryRecord>) -> Vec<UserSalaryDto> {
        let filtered = self.filter(records);
        let mut salaries: Vec<UserSalaryDto> = filtered.iter().map(UserSalaryDto::from).collect();
        salaries.sort_by(|a, b| a.value.total_cmp(&b.value));
        salaries
    }

    /// Runs the chain and keeps the full records.
    pub fn filter(&self, records: Vec<SalaryRecord>) -> Vec<SalaryRecord> {
        self.predicates().iter().fold(records, |remaining, predicate| {
            remaining.into_iter().filter(|record| predicate(record)).collect()
        })
    }
}

pub fn used_in_stats() -> SalaryPredicate {
    Box::new(|record| record.use_in_stats)
}

pub fn not_hr_non_it() -> SalaryPredicate {
    Box::new(|record| record.profession_id != Some(UserProfession::HrNonIt.id()))
}

pub fn within_years(first: i32, last: i32) -> SalaryPredicate {
    Box::new(move |record| (first..=last).contains(&record.year))
}

pub fn added_since(edge: DateTime<Utc>) -> SalaryPredicate {
    Box::new(move |record| record.created_at >= edge)
}

pub fn added_until(until: DateTime<Utc>) -> SalaryPredicate {
    Box::new(move |record| record.created_at <= until)
}

pub fn company_is(company: CompanyType) -> SalaryPredicate {
    Box::new(move |record| record.company == company)
}

pub fn city_in(cities: Vec<KazakhstanCity>) -> SalaryPredicate {
    Box::new(move |record| record.city.is_some_and(|city| cities.contains(&city)))
}

pub fn grade_is(grade: DeveloperGrade) -> SalaryPredicate {
    Box::new(move |record| record.grade == Some(grade))
}

/// Records without a profession never match a profession filter.
pub fn profession_in(ids: Vec<i64>) -> SalaryPredicate {
    Box::new(move |record| record.profession_id.is_some_and(|id| ids.contains(&id)))
}
