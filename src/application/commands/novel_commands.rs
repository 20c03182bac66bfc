//! Novel Commands

use std::path::PathBuf;
use uuid::Uuid;

/// 创建小说命令（第一步：创建 processing 状态记录）
#[derive(Debug, Clone)]
pub struct CreateNovel {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub content: String,
}

/// 处理小说分章命令（第二步：后台分章与人物统计）
#[derive(Debug, Clone)]
pub struct ProcessNovelChapters {
    pub novel_id: Uuid,
    pub content: String,
}

/// 删除小说命令
#[derive(Debug, Clone)]
pub struct DeleteNovel {
    pub novel_id: Uuid,
}

/// 导入小说元数据命令
#[derive(Debug, Clone)]
pub struct ImportNovelMetadata {
    pub path: PathBuf,
}
