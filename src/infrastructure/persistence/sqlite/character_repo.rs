//! SQLite Character Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::columns::{db_error, from_json_text, parse_uuid, to_json_text};
use super::DbPool;
use crate::application::ports::{CharacterRecord, CharacterRepositoryPort, RepositoryError};

/// SQLite Character Repository
pub struct SqliteCharacterRepository {
    pool: DbPool,
}

impl SqliteCharacterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CharacterRow {
    id: String,
    novel_id: String,
    name: String,
    description: Option<String>,
    character_type: Option<String>,
    first_appearance_chapter: Option<i64>,
    last_appearance_chapter: Option<i64>,
    relationships: String,
    key_traits: String,
    mentions_count: i64,
    chapters_appeared: String,
}

impl TryFrom<CharacterRow> for CharacterRecord {
    type Error = RepositoryError;

    fn try_from(row: CharacterRow) -> Result<Self, Self::Error> {
        Ok(CharacterRecord {
            id: parse_uuid(&row.id)?,
            novel_id: parse_uuid(&row.novel_id)?,
            name: row.name,
            description: row.description,
            character_type: row.character_type,
            first_appearance_chapter: row.first_appearance_chapter.map(|n| n.max(0) as u32),
            last_appearance_chapter: row.last_appearance_chapter.map(|n| n.max(0) as u32),
            relationships: from_json_text(&row.relationships, "characters.relationships"),
            key_traits: from_json_text(&row.key_traits, "characters.key_traits"),
            mentions_count: row.mentions_count.max(0) as u32,
            chapters_appeared: from_json_text(&row.chapters_appeared, "characters.chapters_appeared"),
        })
    }
}

#[async_trait]
impl CharacterRepositoryPort for SqliteCharacterRepository {
    async fn replace_for_novel(
        &self,
        novel_id: Uuid,
        characters: &[CharacterRecord],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM characters WHERE novel_id = ?")
            .bind(novel_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for character in characters {
            sqlx::query(
                r#"
                INSERT INTO characters (id, novel_id, name, description, character_type,
                    first_appearance_chapter, last_appearance_chapter, relationships,
                    key_traits, mentions_count, chapters_appeared)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(character.id.to_string())
            .bind(novel_id.to_string())
            .bind(&character.name)
            .bind(&character.description)
            .bind(&character.character_type)
            .bind(character.first_appearance_chapter.map(i64::from))
            .bind(character.last_appearance_chapter.map(i64::from))
            .bind(to_json_text(&character.relationships)?)
            .bind(to_json_text(&character.key_traits)?)
            .bind(i64::from(character.mentions_count))
            .bind(to_json_text(&character.chapters_appeared)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    RepositoryError::Duplicate(format!("Character {}", character.name))
                }
                other => db_error(other),
            })?;
        }

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(
            novel_id = %novel_id,
            characters = characters.len(),
            "Characters replaced"
        );

        Ok(())
    }

    async fn find_by_novel(&self, novel_id: Uuid) -> Result<Vec<CharacterRecord>, RepositoryError> {
        let rows: Vec<CharacterRow> = sqlx::query_as(
            r#"
            SELECT id, novel_id, name, description, character_type, first_appearance_chapter,
                last_appearance_chapter, relationships, key_traits, mentions_count,
                chapters_appeared
            FROM characters
            WHERE novel_id = ?
            ORDER BY mentions_count DESC, name
            "#,
        )
        .bind(novel_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(CharacterRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::novel::CharacterLink;
    use crate::infrastructure::persistence::sqlite::test_support::{memory_pool, save_novel};

    async fn repo() -> (SqliteCharacterRepository, Uuid) {
        let pool = memory_pool().await;
        let novel_id = save_novel(&pool, "Omniscient Reader").await;
        (SqliteCharacterRepository::new(pool), novel_id)
    }

    fn character(novel_id: Uuid, name: &str, mentions: u32) -> CharacterRecord {
        CharacterRecord {
            id: Uuid::new_v4(),
            novel_id,
            name: name.to_string(),
            description: None,
            character_type: None,
            first_appearance_chapter: Some(1),
            last_appearance_chapter: Some(3),
            relationships: Vec::new(),
            key_traits: Vec::new(),
            mentions_count: mentions,
            chapters_appeared: vec![1, 3],
        }
    }

    #[tokio::test]
    async fn test_replace_and_order_by_mentions() {
        let (repo, novel_id) = repo().await;

        let mut kim = character(novel_id, "Kim Dokja", 12);
        kim.relationships = vec![CharacterLink {
            character: "Yoo Joonghyuk".into(),
            relationship: "acquainted".into(),
            strength: 4,
        }];
        repo.replace_for_novel(novel_id, &[character(novel_id, "Yoo Joonghyuk", 30), kim])
            .await
            .unwrap();

        let found = repo.find_by_novel(novel_id).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Yoo Joonghyuk", "Kim Dokja"]);
        assert_eq!(found[1].relationships[0].relationship, "acquainted");
        assert_eq!(found[1].chapters_appeared, vec![1, 3]);

        repo.replace_for_novel(novel_id, &[character(novel_id, "Han Sooyoung", 2)])
            .await
            .unwrap();
        let found = repo.find_by_novel(novel_id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Han Sooyoung");
    }

    #[tokio::test]
    async fn test_duplicate_name_rolls_back() {
        let (repo, novel_id) = repo().await;
        repo.replace_for_novel(novel_id, &[character(novel_id, "Kim Dokja", 1)])
            .await
            .unwrap();

        let result = repo
            .replace_for_novel(
                novel_id,
                &[character(novel_id, "Dup", 1), character(novel_id, "Dup", 2)],
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Duplicate(_))));

        let found = repo.find_by_novel(novel_id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Kim Dokja");
    }
}
