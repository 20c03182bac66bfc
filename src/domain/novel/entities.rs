//! Novel Context - Entities

use serde::{Deserialize, Serialize};

/// 每分钟阅读词数
pub const WORDS_PER_MINUTE: usize = 200;

/// 章节阅读统计
///
/// 不变量:
/// - reading_time_minutes >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingStats {
    pub word_count: usize,
    pub reading_time_minutes: usize,
}

impl ReadingStats {
    pub fn of(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            word_count,
            reading_time_minutes: (word_count / WORDS_PER_MINUTE).max(1),
        }
    }
}

/// 从章节文件名（不含扩展名）解析章节号
///
/// 去掉 `_` 和 `-` 并转小写后，必须是 `ch` 紧跟纯数字：
/// `ch1`、`ch_01`、`Ch-7` 可以解析，`chapter_01`、`ch1a` 不行。
pub fn chapter_number_from_file_stem(stem: &str) -> Option<u32> {
    let normalized: String = stem
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();

    let digits = normalized.strip_prefix("ch")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_stats() {
        let stats = ReadingStats::of("one two three");
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.reading_time_minutes, 1);

        let long = vec!["w"; 1000].join(" ");
        assert_eq!(ReadingStats::of(&long).reading_time_minutes, 5);
        assert_eq!(ReadingStats::of("").reading_time_minutes, 1);
    }

    #[test]
    fn test_chapter_number_from_file_stem() {
        assert_eq!(chapter_number_from_file_stem("ch1"), Some(1));
        assert_eq!(chapter_number_from_file_stem("ch_01"), Some(1));
        assert_eq!(chapter_number_from_file_stem("Ch-7"), Some(7));
        assert_eq!(chapter_number_from_file_stem("CH__120"), Some(120));
        assert_eq!(chapter_number_from_file_stem("chapter_01"), None);
        assert_eq!(chapter_number_from_file_stem("ch"), None);
        assert_eq!(chapter_number_from_file_stem("ch1a"), None);
        assert_eq!(chapter_number_from_file_stem("notes"), None);
    }
}
