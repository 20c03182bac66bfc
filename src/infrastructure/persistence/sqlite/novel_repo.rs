//! SQLite Novel Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

use super::columns::{db_error, from_json_text, like_pattern, parse_time, parse_uuid, to_json_text};
use super::DbPool;
use crate::application::ports::{
    NovelRecord, NovelRepositoryPort, NovelSearch, NovelStatus, RepositoryError,
};

const NOVEL_COLUMNS: &str = "id, title, author, description, genres, tags, average_rating, \
     vote_count, year, status_in_coo, status, total_chapters, created_at, last_updated";

/// SQLite Novel Repository
pub struct SqliteNovelRepository {
    pool: DbPool,
}

impl SqliteNovelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct NovelRow {
    id: String,
    title: String,
    author: Option<String>,
    description: Option<String>,
    genres: String,
    tags: String,
    average_rating: Option<f64>,
    vote_count: Option<i64>,
    year: Option<i64>,
    status_in_coo: Option<String>,
    status: String,
    total_chapters: i64,
    created_at: String,
    last_updated: String,
}

impl TryFrom<NovelRow> for NovelRecord {
    type Error = RepositoryError;

    fn try_from(row: NovelRow) -> Result<Self, Self::Error> {
        Ok(NovelRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            author: row.author,
            description: row.description,
            genres: from_json_text(&row.genres, "novels.genres"),
            tags: from_json_text(&row.tags, "novels.tags"),
            average_rating: row.average_rating,
            vote_count: row.vote_count,
            year: row.year.map(|y| y as i32),
            status_in_coo: row.status_in_coo,
            status: NovelStatus::from_str(&row.status).unwrap_or_default(),
            total_chapters: row.total_chapters.max(0) as u32,
            created_at: parse_time(&row.created_at)?,
            last_updated: parse_time(&row.last_updated)?,
        })
    }
}

/// 追加 `EXISTS (json_each(column) IN (...))` 条件
fn push_any_of(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[String]) {
    builder.push(format!(
        " AND EXISTS (SELECT 1 FROM json_each(novels.{}) WHERE json_each.value IN (",
        column
    ));
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated("))");
}

#[async_trait]
impl NovelRepositoryPort for SqliteNovelRepository {
    async fn save(&self, novel: &NovelRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO novels (id, title, author, description, genres, tags, average_rating,
                vote_count, year, status_in_coo, status, total_chapters, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                description = excluded.description,
                genres = excluded.genres,
                tags = excluded.tags,
                average_rating = excluded.average_rating,
                vote_count = excluded.vote_count,
                year = excluded.year,
                status_in_coo = excluded.status_in_coo,
                status = excluded.status,
                total_chapters = excluded.total_chapters,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(novel.id.to_string())
        .bind(&novel.title)
        .bind(&novel.author)
        .bind(&novel.description)
        .bind(to_json_text(&novel.genres)?)
        .bind(to_json_text(&novel.tags)?)
        .bind(novel.average_rating)
        .bind(novel.vote_count)
        .bind(novel.year.map(i64::from))
        .bind(&novel.status_in_coo)
        .bind(novel.status.as_str())
        .bind(i64::from(novel.total_chapters))
        .bind(novel.created_at.to_rfc3339())
        .bind(novel.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<NovelRecord>, RepositoryError> {
        let row: Option<NovelRow> =
            sqlx::query_as(&format!("SELECT {} FROM novels WHERE id = ?", NOVEL_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(NovelRecord::try_from).transpose()
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<NovelRecord>, RepositoryError> {
        let row: Option<NovelRow> = sqlx::query_as(&format!(
            "SELECT {} FROM novels WHERE title = ? ORDER BY created_at LIMIT 1",
            NOVEL_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(NovelRecord::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<NovelRecord>, RepositoryError> {
        let rows: Vec<NovelRow> = sqlx::query_as(&format!(
            "SELECT {} FROM novels ORDER BY created_at DESC",
            NOVEL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(NovelRecord::try_from).collect()
    }

    async fn search(&self, criteria: &NovelSearch) -> Result<Vec<NovelRecord>, RepositoryError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM novels WHERE 1 = 1", NOVEL_COLUMNS));

        if let Some(search) = &criteria.search {
            let pattern = like_pattern(search.trim());
            builder
                .push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(COALESCE(description, '')) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(author) = &criteria.author {
            builder
                .push(" AND LOWER(COALESCE(author, '')) LIKE ")
                .push_bind(like_pattern(author.trim()))
                .push(" ESCAPE '\\'");
        }

        if !criteria.genres.is_empty() {
            push_any_of(&mut builder, "genres", &criteria.genres);
        }

        if !criteria.tags.is_empty() {
            push_any_of(&mut builder, "tags", &criteria.tags);
        }

        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(criteria.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(criteria.skip));

        let rows: Vec<NovelRow> = builder
            .build_query_as::<NovelRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(NovelRecord::try_from).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: NovelStatus,
        total_chapters: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE novels
            SET status = ?, total_chapters = ?, last_updated = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(i64::from(total_chapters))
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Novel {}", id)));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        // 使用事务确保原子性
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for statement in [
            "DELETE FROM chat_history WHERE novel_id = ?",
            "DELETE FROM characters WHERE novel_id = ?",
            "DELETE FROM chapters WHERE novel_id = ?",
            "DELETE FROM novels WHERE id = ?",
        ] {
            sqlx::query(statement)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteNovelRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteNovelRepository::new(pool)
    }

    fn novel(title: &str, author: &str, genres: &[&str], tags: &[&str]) -> NovelRecord {
        let mut record = NovelRecord::new(title);
        record.author = Some(author.to_string());
        record.genres = genres.iter().map(|g| g.to_string()).collect();
        record.tags = tags.iter().map(|t| t.to_string()).collect();
        record.status = NovelStatus::Ready;
        record
    }

    fn search() -> NovelSearch {
        NovelSearch {
            limit: 100,
            ..Default::default()
        }
    }

    fn titles(records: &[NovelRecord]) -> Vec<&str> {
        let mut titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        titles.sort();
        titles
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = repo().await;
        let mut record = novel("Lord of the Mysteries", "Cuttlefish", &["Mystery"], &[]);
        record.average_rating = Some(4.6);
        record.year = Some(2018);
        repo.save(&record).await.unwrap();

        let found = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Lord of the Mysteries");
        assert_eq!(found.genres, vec!["Mystery"]);
        assert_eq!(found.year, Some(2018));
        assert_eq!(found.average_rating, Some(4.6));

        let by_title = repo.find_by_title("Lord of the Mysteries").await.unwrap();
        assert_eq!(by_title.map(|r| r.id), Some(record.id));
        assert!(repo.find_by_title("lord of the mysteries").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_filters() {
        let repo = repo().await;
        let mut orv = novel("Omniscient Reader", "singNsong", &["Action", "Fantasy"], &["Apocalypse"]);
        orv.description = Some("A reader of a web novel".into());
        repo.save(&orv).await.unwrap();
        repo.save(&novel("Solo Leveling", "Chugong", &["Action"], &["Dungeons"]))
            .await
            .unwrap();
        repo.save(&novel("Mushoku Tensei", "Rifujin", &["Isekai"], &[]))
            .await
            .unwrap();

        let all = repo.search(&search()).await.unwrap();
        assert_eq!(all.len(), 3);

        let by_text = repo
            .search(&NovelSearch {
                search: Some("WEB NOVEL".into()),
                ..search()
            })
            .await
            .unwrap();
        assert_eq!(titles(&by_text), vec!["Omniscient Reader"]);

        let by_author = repo
            .search(&NovelSearch {
                author: Some("chu".into()),
                ..search()
            })
            .await
            .unwrap();
        assert_eq!(titles(&by_author), vec!["Solo Leveling"]);

        let by_genre = repo
            .search(&NovelSearch {
                genres: vec!["Isekai".into(), "Fantasy".into()],
                ..search()
            })
            .await
            .unwrap();
        assert_eq!(titles(&by_genre), vec!["Mushoku Tensei", "Omniscient Reader"]);

        let by_tag = repo
            .search(&NovelSearch {
                genres: vec!["Action".into()],
                tags: vec!["Dungeons".into()],
                ..search()
            })
            .await
            .unwrap();
        assert_eq!(titles(&by_tag), vec!["Solo Leveling"]);
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let repo = repo().await;
        for i in 0..5 {
            repo.save(&novel(&format!("Novel {}", i), "A", &[], &[]))
                .await
                .unwrap();
        }

        let page = repo
            .search(&NovelSearch {
                skip: 3,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let page = repo
            .search(&NovelSearch {
                skip: 0,
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = repo().await;
        repo.save(&novel("100% Perfect", "A", &[], &[])).await.unwrap();
        repo.save(&novel("Perfect World", "B", &[], &[])).await.unwrap();

        let found = repo
            .search(&NovelSearch {
                search: Some("100%".into()),
                ..search()
            })
            .await
            .unwrap();
        assert_eq!(titles(&found), vec!["100% Perfect"]);
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = repo().await;
        let record = NovelRecord::new("Processing Novel");
        repo.save(&record).await.unwrap();

        repo.update_status(record.id, NovelStatus::Ready, 42)
            .await
            .unwrap();
        let found = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(found.status, NovelStatus::Ready);
        assert_eq!(found.total_chapters, 42);

        assert!(matches!(
            repo.update_status(Uuid::new_v4(), NovelStatus::Failed, 0).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let record = NovelRecord::new("Doomed");
        repo.save(&record).await.unwrap();

        repo.delete(record.id).await.unwrap();
        assert!(repo.find_by_id(record.id).await.unwrap().is_none());
    }
}
