use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::cache::TtlCache;
use crate::core::config;
use crate::core::error::AppResult;
use crate::domain::{LabelEntity, Profession};
use crate::storage::{LabelKind, LabelRepository};

/// Dropdown contents for the salary form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectBoxItems {
    pub professions: Vec<LabelEntity>,
    pub skills: Vec<LabelEntity>,
    pub industries: Vec<LabelEntity>,
}

/// Profession list shared by the bot parser and the salary form, cached for
/// two hours.
#[derive(Clone)]
pub struct ProfessionsProvider {
    labels: Arc<dyn LabelRepository>,
    cache: TtlCache<Arc<Vec<Profession>>>,
}

impl ProfessionsProvider {
    pub fn new(labels: Arc<dyn LabelRepository>, cache: TtlCache<Arc<Vec<Profession>>>) -> Self {
        Self { labels, cache }
    }

    pub async fn professions(&self, cancel: &CancellationToken) -> AppResult<Arc<Vec<Profession>>> {
        let labels = Arc::clone(&self.labels);
        self.cache
            .get_or_try_populate(&config::cache::professions_key(), cancel, async move {
                let professions = labels.all(LabelKind::Profession).await?;
                log::debug!("Loaded {} professions", professions.len());
                Ok(Arc::new(professions))
            })
            .await
    }

    pub async fn select_box_items(&self, cancel: &CancellationToken) -> AppResult<SelectBoxItems> {
        let professions = self.professions(cancel).await?;
        Ok(SelectBoxItems {
            professions: professions.as_ref().clone(),
            skills: self.labels.all(LabelKind::Skill).await?,
            industries: self.labels.all(LabelKind::WorkIndustry).await?,
        })
    }
}
