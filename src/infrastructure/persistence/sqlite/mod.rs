//! SQLite Persistence - SQLite 数据库持久化实现

mod chapter_repo;
mod character_repo;
mod chat_repo;
mod columns;
mod database;
mod novel_repo;
#[cfg(test)]
mod test_support;

pub use chapter_repo::*;
pub use character_repo::*;
pub use chat_repo::*;
pub use database::*;
pub use novel_repo::*;
