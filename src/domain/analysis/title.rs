//! 章节标题提取

/// 只检查正文开头的行数
const TITLE_SCAN_LINES: usize = 5;
/// 标题最大字符数（不含）
const MAX_TITLE_CHARS: usize = 100;
/// 标题最多词数
const MAX_TITLE_WORDS: usize = 8;

/// 从章节正文提取标题
///
/// 在前 5 行中取第一个满足条件的行：非空、少于 100 字符、
/// 不以 "chapter" 开头（忽略大小写）、不超过 8 个词。
/// 都不满足时返回 `Chapter {ordinal}`。
pub fn extract_title(body: &str, ordinal: u32) -> String {
    body.split('\n')
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .find(|line| is_title_like(line))
        .map(str::to_string)
        .unwrap_or_else(|| default_title(ordinal))
}

fn is_title_like(line: &str) -> bool {
    !line.is_empty()
        && line.chars().count() < MAX_TITLE_CHARS
        && !line.to_lowercase().starts_with("chapter")
        && line.split_whitespace().count() <= MAX_TITLE_WORDS
}

pub fn default_title(ordinal: u32) -> String {
    format!("Chapter {}", ordinal)
}
