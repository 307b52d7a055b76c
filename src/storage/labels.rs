use async_trait::async_trait;
use rusqlite::params;
use strum::{Display, EnumIter};

use crate::core::error::AppResult;
use crate::domain::LabelEntity;
use crate::storage::db::{get_connection, DbPool};

/// Lookup tables sharing the `id, title, hex_color` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LabelKind {
    Profession,
    Skill,
    WorkIndustry,
}

impl LabelKind {
    fn table(self) -> &'static str {
        match self {
            LabelKind::Profession => "professions",
            LabelKind::Skill => "skills",
            LabelKind::WorkIndustry => "work_industries",
        }
    }
}

#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// Every row of the table, ordered by id.
    async fn all(&self, kind: LabelKind) -> AppResult<Vec<LabelEntity>>;

    /// Inserts or renames a label.
    async fn upsert(&self, kind: LabelKind, label: &LabelEntity) -> AppResult<()>;
}

#[derive(Clone)]
pub struct SqliteLabelRepository {
    pool: DbPool,
}

impl SqliteLabelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelRepository for SqliteLabelRepository {
    async fn all(&self, kind: LabelKind) -> AppResult<Vec<LabelEntity>> {
        let conn = get_connection(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, title, hex_color FROM {} ORDER BY id",
            kind.table()
        ))?;
        let labels = stmt
            .query_map([], |row| {
                Ok(LabelEntity {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    hex_color: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(labels)
    }

    async fn upsert(&self, kind: LabelKind, label: &LabelEntity) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, title, hex_color) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, hex_color = excluded.hex_color",
                kind.table()
            ),
            params![label.id, label.title, label.hex_color],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserProfession;
    use crate::storage::db::create_in_memory_pool;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[tokio::test]
    async fn test_seeded_professions_match_known_titles() {
        let repo = SqliteLabelRepository::new(create_in_memory_pool().unwrap());
        let professions = repo.all(LabelKind::Profession).await.unwrap();

        let expected: Vec<LabelEntity> = UserProfession::iter()
            .map(|p| LabelEntity::new(p.id(), p.title()))
            .collect();
        assert_eq!(professions, expected);
    }

    #[tokio::test]
    async fn test_upsert_renames_existing_label() {
        let repo = SqliteLabelRepository::new(create_in_memory_pool().unwrap());
        assert!(repo.all(LabelKind::Skill).await.unwrap().is_empty());

        repo.upsert(LabelKind::Skill, &LabelEntity::new(1, "Rust")).await.unwrap();
        let mut renamed = LabelEntity::new(1, "Rust + Tokio");
        renamed.hex_color = Some("#dea584".to_string());
        repo.upsert(LabelKind::Skill, &renamed).await.unwrap();

        assert_eq!(repo.all(LabelKind::Skill).await.unwrap(), vec![renamed]);
        assert!(repo.all(LabelKind::WorkIndustry).await.unwrap().is_empty());
    }
}
