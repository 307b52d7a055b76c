use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{AppError, AppResult};
use crate::domain::enums::{CompanyType, Currency, DeveloperGrade, Gender, KazakhstanCity, SalaryApproval};
use crate::domain::quarter::DateQuarter;

/// A submitted salary: one person, one quarter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalaryRecord {
    pub id: Uuid,
    pub user_id: Option<i64>,
    pub value: f64,
    pub currency: Currency,
    pub quarter: u8,
    pub year: i32,
    pub company: CompanyType,
    pub grade: Option<DeveloperGrade>,
    pub profession_id: Option<i64>,
    pub city: Option<KazakhstanCity>,
    pub age: Option<i32>,
    pub year_of_starting_work: Option<i32>,
    pub gender: Option<Gender>,
    pub skill_id: Option<i64>,
    pub work_industry_id: Option<i64>,
    pub use_in_stats: bool,
    pub approval: SalaryApproval,
    pub created_at: DateTime<Utc>,
}

impl SalaryRecord {
    /// Builds a pending record owned by `user_id` from a validated request.
    pub fn submitted(user_id: i64, request: &AddSalaryRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            value: request.value,
            currency: request.currency,
            quarter: request.quarter,
            year: request.year,
            company: request.company,
            grade: request.grade,
            profession_id: request.profession_id,
            city: request.city,
            age: request.age,
            year_of_starting_work: request.year_of_starting_work,
            gender: request.gender,
            skill_id: request.skill_id,
            work_industry_id: request.work_industry_id,
            use_in_stats: true,
            approval: SalaryApproval::Pending,
            created_at: now,
        }
    }

    pub fn approve(&mut self) {
        self.approval = SalaryApproval::Approved;
        self.use_in_stats = true;
    }

    pub fn exclude_from_stats(&mut self) {
        self.approval = SalaryApproval::Excluded;
        self.use_in_stats = false;
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }

    pub fn apply_edit(&mut self, edit: &EditSalaryRequest) {
        self.grade = edit.grade;
        self.city = edit.city;
        self.company = edit.company;
        self.profession_id = edit.profession_id;
        self.skill_id = edit.skill_id;
        self.work_industry_id = edit.work_industry_id;
        self.age = edit.age;
        self.year_of_starting_work = edit.year_of_starting_work;
        self.gender = edit.gender;
    }
}

/// Reporting projection of a salary. Carries no identity of the submitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSalaryDto {
    pub value: f64,
    pub quarter: u8,
    pub year: i32,
    pub currency: Currency,
    pub company: CompanyType,
    pub grade: Option<DeveloperGrade>,
    pub city: Option<KazakhstanCity>,
    pub age: Option<i32>,
    pub year_of_starting_work: Option<i32>,
    pub gender: Option<Gender>,
    pub skill_id: Option<i64>,
    pub work_industry_id: Option<i64>,
    pub profession_id: Option<i64>,
}

impl From<&SalaryRecord> for UserSalaryDto {
    fn from(record: &SalaryRecord) -> Self {
        Self {
            value: record.value,
            quarter: record.quarter,
            year: record.year,
            currency: record.currency,
            company: record.company,
            grade: record.grade,
            city: record.city,
            age: record.age,
            year_of_starting_work: record.year_of_starting_work,
            gender: record.gender,
            skill_id: record.skill_id,
            work_industry_id: record.work_industry_id,
            profession_id: record.profession_id,
        }
    }
}

/// Full projection for the record owner and admins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSalaryAdminDto {
    pub id: Uuid,
    #[serde(flatten)]
    pub salary: UserSalaryDto,
    pub use_in_stats: bool,
    pub approval: SalaryApproval,
}

impl From<&SalaryRecord> for UserSalaryAdminDto {
    fn from(record: &SalaryRecord) -> Self {
        Self {
            id: record.id,
            salary: UserSalaryDto::from(record),
            use_in_stats: record.use_in_stats,
            approval: record.approval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSalaryRequest {
    pub value: f64,
    pub quarter: u8,
    pub year: i32,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub company: CompanyType,
    pub grade: Option<DeveloperGrade>,
    pub profession_id: Option<i64>,
    pub city: Option<KazakhstanCity>,
    pub age: Option<i32>,
    pub year_of_starting_work: Option<i32>,
    pub gender: Option<Gender>,
    pub skill_id: Option<i64>,
    pub work_industry_id: Option<i64>,
}

impl AddSalaryRequest {
    /// Checks the request shape against the current quarter.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a non-positive value, a quarter
    /// outside 1..=4, or a year outside the last two years.
    pub fn validate(&self, current: DateQuarter) -> AppResult<()> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(AppError::Validation("value must be greater than zero".to_string()));
        }
        if !(1..=4).contains(&self.quarter) {
            return Err(AppError::Validation("quarter must be between 1 and 4".to_string()));
        }
        if !current.chart_years().contains(&self.year) {
            return Err(AppError::Validation(format!(
                "year must be {} or {}",
                current.year - 1,
                current.year
            )));
        }
        if self.year == current.year && self.quarter > current.quarter {
            return Err(AppError::Validation("quarter is in the future".to_string()));
        }
        Ok(())
    }
}

/// Fields an owner may change after submission. Value and period are fixed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSalaryRequest {
    pub grade: Option<DeveloperGrade>,
    pub city: Option<KazakhstanCity>,
    #[serde(default)]
    pub company: CompanyType,
    pub profession_id: Option<i64>,
    pub skill_id: Option<i64>,
    pub work_industry_id: Option<i64>,
    pub age: Option<i32>,
    pub year_of_starting_work: Option<i32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrEditSalaryRecordResponse {
    pub is_success: bool,
    pub error_message: Option<String>,
    pub created_salary: Option<UserSalaryAdminDto>,
}

impl CreateOrEditSalaryRecordResponse {
    pub fn success(record: &SalaryRecord) -> Self {
        Self {
            is_success: true,
            error_message: None,
            created_salary: Some(UserSalaryAdminDto::from(record)),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            error_message: Some(message.into()),
            created_salary: None,
        }
    }
}
