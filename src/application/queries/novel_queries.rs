//! Novel Queries

use uuid::Uuid;

/// 默认分页大小
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// 获取小说详情查询
#[derive(Debug, Clone)]
pub struct GetNovel {
    pub novel_id: Uuid,
}

/// 检索小说列表查询
#[derive(Debug, Clone)]
pub struct ListNovels {
    pub search: Option<String>,
    pub author: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for ListNovels {
    fn default() -> Self {
        Self {
            search: None,
            author: None,
            genres: Vec::new(),
            tags: Vec::new(),
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// 获取小说章节列表查询
#[derive(Debug, Clone)]
pub struct GetNovelChapters {
    pub novel_id: Uuid,
    pub skip: u32,
    pub limit: u32,
    pub include_content: bool,
}

/// 获取单个章节查询
#[derive(Debug, Clone)]
pub struct GetChapter {
    pub chapter_id: Uuid,
    pub include_content: bool,
}

/// 获取小说人物查询
#[derive(Debug, Clone)]
pub struct GetCharacters {
    pub novel_id: Uuid,
}

/// 导出全部小说元数据查询
#[derive(Debug, Clone, Default)]
pub struct ExportNovels;
