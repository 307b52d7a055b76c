use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::core::error::{AppError, AppResult};
use crate::domain::enums::from_stored;
use crate::domain::{
    CompanyType, Currency, DeveloperGrade, Gender, KazakhstanCity, PageRequest, Pageable, SalaryApproval,
    SalaryRecord,
};
use crate::storage::db::{get_connection, DbPool};

/// Salary persistence used by the chart, list and admin operations.
#[async_trait]
pub trait SalaryRepository: Send + Sync {
    /// Records flagged for stats from `min_year` on. The chart filter chain
    /// still runs over the result.
    async fn stats_candidates(&self, min_year: i32) -> AppResult<Vec<SalaryRecord>>;

    /// A user's records for the given years, newest year then newest quarter
    /// first.
    async fn user_salaries_for_years(&self, user_id: i64, years: &[i32]) -> AppResult<Vec<SalaryRecord>>;

    async fn find(&self, id: Uuid) -> AppResult<Option<SalaryRecord>>;

    async fn exists_for_period(&self, user_id: i64, year: i32, quarter: u8) -> AppResult<bool>;

    /// # Errors
    /// [`AppError::Conflict`] when the owner already has a record for the
    /// same year and quarter.
    async fn insert(&self, record: &SalaryRecord) -> AppResult<()>;

    /// Writes every mutable column. Returns false when the id is unknown.
    async fn update(&self, record: &SalaryRecord) -> AppResult<bool>;

    /// Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Newest first.
    async fn list_by_stats_flag(&self, use_in_stats: bool, page: PageRequest) -> AppResult<Pageable<SalaryRecord>>;

    async fn has_survey_reply_since(&self, user_id: i64, since: DateTime<Utc>) -> AppResult<bool>;

    async fn add_survey_reply(&self, user_id: i64, usefulness_rating: Option<i32>, now: DateTime<Utc>)
        -> AppResult<()>;
}

const SALARY_COLUMNS: &str = "id, user_id, value, currency, quarter, year, company, grade, profession_id, city, \
     age, year_of_starting_work, gender, skill_id, work_industry_id, use_in_stats, approval, created_at";

fn salary_from_row(row: &Row<'_>) -> rusqlite::Result<SalaryRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(SalaryRecord {
        id,
        user_id: row.get(1)?,
        value: row.get(2)?,
        currency: from_stored("currency", row.get(3)?, Currency::from_repr)?,
        quarter: row.get(4)?,
        year: row.get(5)?,
        company: from_stored("company", row.get(6)?, CompanyType::from_repr)?,
        grade: row
            .get::<_, Option<i64>>(7)?
            .map(|raw| from_stored("grade", raw, DeveloperGrade::from_repr))
            .transpose()?,
        profession_id: row.get(8)?,
        city: row
            .get::<_, Option<i64>>(9)?
            .map(|raw| from_stored("city", raw, KazakhstanCity::from_repr))
            .transpose()?,
        age: row.get(10)?,
        year_of_starting_work: row.get(11)?,
        gender: row
            .get::<_, Option<i64>>(12)?
            .map(|raw| from_stored("gender", raw, Gender::from_repr))
            .transpose()?,
        skill_id: row.get(13)?,
        work_industry_id: row.get(14)?,
        use_in_stats: row.get(15)?,
        approval: from_stored("approval", row.get(16)?, SalaryApproval::from_repr)?,
        created_at: row.get(17)?,
    })
}

/// [`SalaryRepository`] over the SQLite pool.
#[derive(Clone)]
pub struct SqliteSalaryRepository {
    pool: DbPool,
}

impl SqliteSalaryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalaryRepository for SqliteSalaryRepository {
    async fn stats_candidates(&self, min_year: i32) -> AppResult<Vec<SalaryRecord>> {
        let conn = get_connection(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM salaries WHERE use_in_stats = 1 AND year >= ?1",
            SALARY_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![min_year], salary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn user_salaries_for_years(&self, user_id: i64, years: &[i32]) -> AppResult<Vec<SalaryRecord>> {
        let conn = get_connection(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM salaries WHERE user_id = ?1 ORDER BY year DESC, quarter DESC",
            SALARY_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![user_id], salary_from_row)?
            .filter(|record| record.as_ref().map_or(true, |r| years.contains(&r.year)))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<SalaryRecord>> {
        let conn = get_connection(&self.pool)?;
        let record = conn
            .query_row(
                &format!("SELECT {} FROM salaries WHERE id = ?1", SALARY_COLUMNS),
                params![id.to_string()],
                salary_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn exists_for_period(&self, user_id: i64, year: i32, quarter: u8) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM salaries WHERE user_id = ?1 AND year = ?2 AND quarter = ?3)",
            params![user_id, year, quarter],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn insert(&self, record: &SalaryRecord) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            &format!(
                "INSERT INTO salaries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                SALARY_COLUMNS
            ),
            params![
                record.id.to_string(),
                record.user_id,
                record.value,
                record.currency as i64,
                record.quarter,
                record.year,
                record.company as i64,
                record.grade.map(|g| g as i64),
                record.profession_id,
                record.city.map(|c| c as i64),
                record.age,
                record.year_of_starting_work,
                record.gender.map(|g| g as i64),
                record.skill_id,
                record.work_industry_id,
                record.use_in_stats,
                record.approval as i64,
                record.created_at,
            ],
        )
        .map_err(|err| match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => AppError::Conflict(format!(
                "Salary record for Q{} {} already exists",
                record.quarter, record.year
            )),
            _ => AppError::Database(err),
        })?;
        Ok(())
    }

    async fn update(&self, record: &SalaryRecord) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute(
            "UPDATE salaries SET company = ?2, grade = ?3, profession_id = ?4, city = ?5, age = ?6,
                 year_of_starting_work = ?7, gender = ?8, skill_id = ?9, work_industry_id = ?10,
                 use_in_stats = ?11, approval = ?12
             WHERE id = ?1",
            params![
                record.id.to_string(),
                record.company as i64,
                record.grade.map(|g| g as i64),
                record.profession_id,
                record.city.map(|c| c as i64),
                record.age,
                record.year_of_starting_work,
                record.gender.map(|g| g as i64),
                record.skill_id,
                record.work_industry_id,
                record.use_in_stats,
                record.approval as i64,
            ],
        )?;
        Ok(changed > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute("DELETE FROM salaries WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    async fn list_by_stats_flag(&self, use_in_stats: bool, page: PageRequest) -> AppResult<Pageable<SalaryRecord>> {
        let conn = get_connection(&self.pool)?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM salaries WHERE use_in_stats = ?1",
            params![use_in_stats],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM salaries WHERE use_in_stats = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            SALARY_COLUMNS
        ))?;
        let records = stmt
            .query_map(
                params![use_in_stats, page.page_size, page.offset() as i64],
                salary_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Pageable::new(page, total.max(0) as u64, records))
    }

    async fn has_survey_reply_since(&self, user_id: i64, since: DateTime<Utc>) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM salaries_survey_replies WHERE user_id = ?1 AND created_at >= ?2)",
            params![user_id, since],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn add_survey_reply(
        &self,
        user_id: i64,
        usefulness_rating: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            "INSERT INTO salaries_survey_replies (user_id, usefulness_rating, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, usefulness_rating, now],
        )?;
        Ok(())
    }
}
