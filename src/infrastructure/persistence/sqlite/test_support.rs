//! 仓储测试共用的数据库准备

use uuid::Uuid;

use super::{create_pool, run_migrations, DatabaseConfig, DbPool, SqliteNovelRepository};
use crate::application::{NovelRecord, NovelRepositoryPort};

/// 迁移后的内存库
pub(super) async fn memory_pool() -> DbPool {
    let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

/// 保存一本小说作为外键父记录，返回其 ID
pub(super) async fn save_novel(pool: &DbPool, title: &str) -> Uuid {
    let novel = NovelRecord::new(title);
    SqliteNovelRepository::new(pool.clone())
        .save(&novel)
        .await
        .unwrap();
    novel.id
}
