//! Chart, list and single-record operations over the salary repository.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::domain::quarter::months_before;
use crate::domain::{
    AddSalaryRequest, CreateOrEditSalaryRecordResponse, CurrentUser, DateQuarter, EditSalaryRequest, PageRequest,
    Pageable, SalaryRecord, UserSalaryAdminDto, UserSalaryDto,
};
use crate::salaries::chart::{SalariesChartResponse, SalariesHistoricalChartResponse};
use crate::salaries::criteria::ChartFilterCriteria;
use crate::salaries::query::SalariesForChartQuery;
use crate::storage::SalaryRepository;

#[derive(Clone)]
pub struct SalariesService {
    repo: Arc<dyn SalaryRepository>,
}

impl SalariesService {
    pub fn new(repo: Arc<dyn SalaryRepository>) -> Self {
        Self { repo }
    }

    /// Filtered salaries for the query's window, cheapest first.
    ///
    /// # Errors
    /// [`AppError::Cancelled`] when `cancel` fires before the records are loaded.
    pub async fn filtered_salaries(
        &self,
        query: &SalariesForChartQuery,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<UserSalaryDto>> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let candidates = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            candidates = self.repo.stats_candidates(query.first_year) => candidates?,
        };
        Ok(query.apply(candidates))
    }

    /// Salary chart, personalized for the caller.
    ///
    /// Anonymous callers and callers without a submission in the current or
    /// prior year only get company/value pairs.
    pub async fn chart(
        &self,
        criteria: &ChartFilterCriteria,
        user: Option<&CurrentUser>,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AppResult<SalariesChartResponse> {
        let query = SalariesForChartQuery::new(criteria, now);
        let salaries = self.filtered_salaries(&query, cancel).await?;

        let Some(user) = user else {
            metrics::CHART_REQUESTS_TOTAL
                .with_label_values(&["require_own_salary"])
                .inc();
            return Ok(SalariesChartResponse::require_own_salary(
                &salaries,
                false,
                query.salary_added_edge,
                now,
            ));
        };

        let own_salaries = self
            .repo
            .user_salaries_for_years(user.id, &query.current_quarter.chart_years())
            .await?;
        let Some(own_salary) = own_salaries.first() else {
            metrics::CHART_REQUESTS_TOTAL
                .with_label_values(&["require_own_salary"])
                .inc();
            return Ok(SalariesChartResponse::require_own_salary(
                &salaries,
                true,
                query.salary_added_edge,
                now,
            ));
        };

        let survey_edge = months_before(now, config::salaries::SURVEY_REPLY_WINDOW_MONTHS);
        let has_survey_reply = self.repo.has_survey_reply_since(user.id, survey_edge).await?;

        metrics::CHART_REQUESTS_TOTAL.with_label_values(&["full"]).inc();
        Ok(SalariesChartResponse::full(
            salaries,
            own_salary,
            has_survey_reply,
            query.salary_added_edge,
            now,
        ))
    }

    /// Per-quarter statistics. Without an explicit `from` the window starts
    /// at the beginning of the prior year; an older `from` widens the year
    /// window to reach it.
    pub async fn historical_chart(
        &self,
        criteria: &ChartFilterCriteria,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AppResult<SalariesHistoricalChartResponse> {
        let mut criteria = criteria.clone();
        let from = match criteria.date_range.from {
            Some(from) => from,
            None => {
                let [_, prior_year] = DateQuarter::from_date(now).chart_years();
                Utc.with_ymd_and_hms(prior_year, 1, 1, 0, 0, 0)
                    .single()
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
            }
        };
        criteria.date_range.from = Some(from);

        let query = SalariesForChartQuery::historical(&criteria, now);
        let salaries = self.filtered_salaries(&query, cancel).await?;

        metrics::CHART_REQUESTS_TOTAL.with_label_values(&["historical"]).inc();
        Ok(SalariesHistoricalChartResponse::new(
            &salaries,
            from,
            criteria.date_range.to,
        ))
    }

    /// Public paginated list over the same filter chain as the chart.
    pub async fn list(
        &self,
        criteria: &ChartFilterCriteria,
        page: PageRequest,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> AppResult<Pageable<UserSalaryDto>> {
        let query = SalariesForChartQuery::new(criteria, now);
        let salaries = self.filtered_salaries(&query, cancel).await?;
        Ok(page.apply(salaries))
    }

    pub async fn add(
        &self,
        actor: &CurrentUser,
        request: &AddSalaryRequest,
        now: DateTime<Utc>,
    ) -> AppResult<CreateOrEditSalaryRecordResponse> {
        request.validate(DateQuarter::from_date(now))?;

        if self
            .repo
            .exists_for_period(actor.id, request.year, request.quarter)
            .await?
        {
            return Ok(CreateOrEditSalaryRecordResponse::failure(DUPLICATE_PERIOD));
        }

        // A concurrent submission for the same period can still win the
        // race after the check; the unique index rejects this one then.
        let record = SalaryRecord::submitted(actor.id, request, now);
        match self.repo.insert(&record).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                return Ok(CreateOrEditSalaryRecordResponse::failure(DUPLICATE_PERIOD));
            }
            Err(err) => return Err(err),
        }
        log::info!(
            "User {} added salary {} for Q{} {}",
            actor.id,
            record.id,
            record.quarter,
            record.year
        );

        Ok(CreateOrEditSalaryRecordResponse::success(&record))
    }

    /// Owner-only edit of the descriptive fields.
    pub async fn update(
        &self,
        id: Uuid,
        actor: &CurrentUser,
        edit: &EditSalaryRequest,
    ) -> AppResult<CreateOrEditSalaryRecordResponse> {
        let mut record = self.find_existing(id).await?;
        if !record.is_owned_by(actor.id) {
            return Err(AppError::Permission(
                "You can edit only your own salary records".to_string(),
            ));
        }

        record.apply_edit(edit);
        self.save_existing(&record).await?;
        Ok(CreateOrEditSalaryRecordResponse::success(&record))
    }

    pub async fn approve(&self, id: Uuid, actor: &CurrentUser) -> AppResult<UserSalaryAdminDto> {
        actor.require_admin()?;
        let mut record = self.find_existing(id).await?;
        record.approve();
        self.save_existing(&record).await?;
        log::info!("Admin {} approved salary {}", actor.id, id);
        Ok(UserSalaryAdminDto::from(&record))
    }

    pub async fn exclude_from_stats(&self, id: Uuid, actor: &CurrentUser) -> AppResult<UserSalaryAdminDto> {
        actor.require_admin()?;
        let mut record = self.find_existing(id).await?;
        record.exclude_from_stats();
        self.save_existing(&record).await?;
        log::info!("Admin {} excluded salary {} from stats", actor.id, id);
        Ok(UserSalaryAdminDto::from(&record))
    }

    pub async fn delete(&self, id: Uuid, actor: &CurrentUser) -> AppResult<()> {
        actor.require_admin()?;
        if !self.repo.delete(id).await? {
            return Err(not_found());
        }
        log::info!("Admin {} deleted salary {}", actor.id, id);
        Ok(())
    }

    /// Admin listing of records counted in stats.
    pub async fn all(&self, actor: &CurrentUser, page: PageRequest) -> AppResult<Pageable<UserSalaryAdminDto>> {
        actor.require_admin()?;
        let records = self.repo.list_by_stats_flag(true, page).await?;
        Ok(records.map(|r| UserSalaryAdminDto::from(&r)))
    }

    /// Admin listing of records excluded from stats.
    pub async fn not_in_stats(
        &self,
        actor: &CurrentUser,
        page: PageRequest,
    ) -> AppResult<Pageable<UserSalaryAdminDto>> {
        actor.require_admin()?;
        let records = self.repo.list_by_stats_flag(false, page).await?;
        Ok(records.map(|r| UserSalaryAdminDto::from(&r)))
    }

    pub async fn add_survey_reply(
        &self,
        actor: &CurrentUser,
        usefulness_rating: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(rating) = usefulness_rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::Validation(
                    "usefulnessRating must be between 1 and 5".to_string(),
                ));
            }
        }
        self.repo.add_survey_reply(actor.id, usefulness_rating, now).await
    }

    async fn find_existing(&self, id: Uuid) -> AppResult<SalaryRecord> {
        self.repo.find(id).await?.ok_or_else(not_found)
    }

    async fn save_existing(&self, record: &SalaryRecord) -> AppResult<()> {
        if self.repo.update(record).await? {
            Ok(())
        } else {
            Err(not_found())
        }
    }
}

const DUPLICATE_PERIOD: &str = "You already have a salary record for this quarter";

fn not_found() -> AppError {
    AppError::NotFound("Salary record not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeveloperGrade, KazakhstanCity, Role, SalaryApproval};
    use crate::salaries::chart::ChartSalaries;
    use crate::storage::{create_in_memory_pool, SqliteSalaryRepository};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn service() -> (SalariesService, Arc<SqliteSalaryRepository>) {
        let repo = Arc::new(SqliteSalaryRepository::new(create_in_memory_pool().unwrap()));
        (SalariesService::new(repo.clone()), repo)
    }

    fn record(user_id: Option<i64>, value: f64, days_ago: i64) -> SalaryRecord {
        SalaryRecord {
            id: Uuid::new_v4(),
            user_id,
            value,
            quarter: 1,
            year: 2024,
            grade: Some(DeveloperGrade::Middle),
            city: Some(KazakhstanCity::Almaty),
            profession_id: Some(30),
            use_in_stats: true,
            created_at: now() - Duration::days(days_ago),
            ..SalaryRecord::default()
        }
    }

    fn admin() -> CurrentUser {
        CurrentUser::new(100, Role::Admin)
    }

    #[tokio::test]
    async fn test_chart_for_user_with_salary_is_full() {
        let (service, repo) = service();
        repo.insert(&record(Some(1), 900_000.0, 3)).await.unwrap();
        repo.insert(&record(None, 500_000.0, 10)).await.unwrap();
        repo.add_survey_reply(1, Some(4), now() - Duration::days(20)).await.unwrap();

        let user = CurrentUser::new(1, Role::Member);
        let chart = service
            .chart(&ChartFilterCriteria::default(), Some(&user), &CancellationToken::new(), now())
            .await
            .unwrap();

        assert!(!chart.require_own_salary);
        assert_eq!(chart.total_count, 2);
        assert_eq!(chart.has_survey_reply, Some(true));
        assert_eq!(chart.own_salary.unwrap().salary.value, 900_000.0);
        assert!(matches!(chart.salaries, ChartSalaries::Full(ref s) if s[0].value == 500_000.0));
    }

    #[tokio::test]
    async fn test_anonymous_chart_requires_own_salary() {
        let (service, repo) = service();
        repo.insert(&record(Some(1), 900_000.0, 3)).await.unwrap();

        let chart = service
            .chart(&ChartFilterCriteria::default(), None, &CancellationToken::new(), now())
            .await
            .unwrap();

        assert!(chart.require_own_salary);
        assert!(!chart.has_authentication);
        assert_eq!(chart.own_salary, None);
        assert_eq!(chart.people_by_grades, None);
    }

    #[tokio::test]
    async fn test_add_rejects_second_record_for_same_quarter() {
        let (service, _) = service();
        let user = CurrentUser::new(7, Role::Member);
        let request = AddSalaryRequest {
            value: 800_000.0,
            quarter: 2,
            year: 2024,
            currency: Default::default(),
            company: Default::default(),
            grade: Some(DeveloperGrade::Senior),
            profession_id: Some(30),
            city: None,
            age: None,
            year_of_starting_work: None,
            gender: None,
            skill_id: None,
            work_industry_id: None,
        };

        let first = service.add(&user, &request, now()).await.unwrap();
        assert!(first.is_success);
        assert_eq!(
            first.created_salary.unwrap().approval,
            SalaryApproval::Pending
        );

        let second = service.add(&user, &request, now()).await.unwrap();
        assert!(!second.is_success);
        assert!(second.error_message.is_some());
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let (service, repo) = service();
        let stored = record(Some(1), 700_000.0, 1);
        repo.insert(&stored).await.unwrap();

        let edit = EditSalaryRequest {
            grade: Some(DeveloperGrade::Senior),
            city: None,
            company: Default::default(),
            profession_id: None,
            skill_id: None,
            work_industry_id: None,
            age: None,
            year_of_starting_work: None,
            gender: None,
        };
        let err = service
            .update(stored.id, &CurrentUser::new(2, Role::Member), &edit)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));

        let ok = service
            .update(stored.id, &CurrentUser::new(1, Role::Member), &edit)
            .await
            .unwrap();
        assert_eq!(
            ok.created_salary.unwrap().salary.grade,
            Some(DeveloperGrade::Senior)
        );
    }

    #[tokio::test]
    async fn test_admin_mutations() {
        let (service, repo) = service();
        let stored = record(None, 700_000.0, 1);
        repo.insert(&stored).await.unwrap();

        let excluded = service.exclude_from_stats(stored.id, &admin()).await.unwrap();
        assert!(!excluded.use_in_stats);
        assert_eq!(excluded.approval, SalaryApproval::Excluded);

        let approved = service.approve(stored.id, &admin()).await.unwrap();
        assert!(approved.use_in_stats);
        assert_eq!(approved.approval, SalaryApproval::Approved);

        let member = CurrentUser::new(5, Role::Member);
        assert!(matches!(
            service.delete(stored.id, &member).await.unwrap_err(),
            AppError::Permission(_)
        ));

        service.delete(stored.id, &admin()).await.unwrap();
        assert!(matches!(
            service.approve(stored.id, &admin()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.delete(stored.id, &admin()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_historical_chart_buckets_by_quarter() {
        let (service, repo) = service();
        let mut older = record(None, 400_000.0, 200);
        older.year = 2023;
        older.quarter = 4;
        repo.insert(&older).await.unwrap();
        repo.insert(&record(None, 600_000.0, 5)).await.unwrap();
        repo.insert(&record(None, 800_000.0, 6)).await.unwrap();

        let chart = service
            .historical_chart(&ChartFilterCriteria::default(), &CancellationToken::new(), now())
            .await
            .unwrap();

        assert_eq!(chart.total_count, 3);
        let periods: Vec<(i32, u8, usize)> = chart
            .buckets
            .iter()
            .map(|b| (b.year, b.quarter, b.count))
            .collect();
        assert_eq!(periods, vec![(2023, 4, 1), (2024, 1, 2)]);
        assert_eq!(chart.buckets[1].median, 700_000.0);
    }

    #[tokio::test]
    async fn test_list_pages_filtered_salaries() {
        let (service, repo) = service();
        for i in 0..5 {
            repo.insert(&record(None, 100_000.0 * (i + 1) as f64, i)).await.unwrap();
        }

        let page = service
            .list(
                &ChartFilterCriteria::default(),
                PageRequest::new(2, 2).unwrap(),
                &CancellationToken::new(),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_items, 5);
        let values: Vec<f64> = page.results.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![300_000.0, 400_000.0]);
    }

    #[tokio::test]
    async fn test_cancelled_request_loads_nothing() {
        let (service, repo) = service();
        repo.insert(&record(None, 500_000.0, 1)).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service
            .chart(&ChartFilterCriteria::default(), None, &cancel, now())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());

        let err = service
            .list(&ChartFilterCriteria::default(), PageRequest::default(), &cancel, now())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_historical_chart_honors_older_from() {
        let (service, repo) = service();
        let mut old = record(None, 300_000.0, 0);
        old.year = 2021;
        old.quarter = 2;
        old.created_at = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        repo.insert(&old).await.unwrap();
        repo.insert(&record(None, 600_000.0, 5)).await.unwrap();

        let mut criteria = ChartFilterCriteria::default();
        criteria.date_range.from = Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        let chart = service
            .historical_chart(&criteria, &CancellationToken::new(), now())
            .await
            .unwrap();

        assert_eq!(chart.total_count, 2);
        assert_eq!((chart.buckets[0].year, chart.buckets[0].quarter), (2021, 2));
    }
}
