//! 章节分割器
//!
//! 按固定优先级尝试章节标记正则，第一个命中至少两处标记的模式胜出；
//! 都不命中（或命中后没有可用正文）时按词数切块。

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::title::extract_title;

/// 正文最少字符数（不含），不足的片段直接丢弃
pub const DEFAULT_MIN_BODY_CHARS: usize = 100;
/// 按长度切块时每块的最少词数
pub const DEFAULT_MIN_WORDS_PER_CHUNK: usize = 2000;
/// 按长度切块时的目标块数
pub const DEFAULT_TARGET_CHUNKS: usize = 10;

// "Chapter 12" / "Chapter XII"
static RE_CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\bChapter\s+(\d+|[IVXLCDM]+)\b").expect("valid chapter heading regex")
});

// "Ch. 12"
static RE_CH_ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\bCh\.\s+(\d+)\b").expect("valid ch. regex"));

// 单独一行的数字
static RE_BARE_NUMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*(\d+)\s*$").expect("valid number line regex"));

// 行首 "12. "
static RE_NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*(\d+)\.\s").expect("valid numbered line regex"));

/// 章节分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 正文最少字符数（不含）
    pub min_body_chars: usize,
    /// 切块时每块最少词数
    pub min_words_per_chunk: usize,
    /// 切块时的目标块数
    pub target_chunks: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_body_chars: DEFAULT_MIN_BODY_CHARS,
            min_words_per_chunk: DEFAULT_MIN_WORDS_PER_CHUNK,
            target_chunks: DEFAULT_TARGET_CHUNKS,
        }
    }
}

/// 分割得到的章节候选
///
/// 不变量:
/// - ordinal 从 1 开始，在被接受的候选上严格递增
/// - body 已 trim，字符数超过 `min_body_chars`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterCandidate {
    pub ordinal: u32,
    pub title: String,
    pub body: String,
}

/// 章节边界模式，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPattern {
    ChapterHeading,
    ChAbbreviation,
    BareNumberLine,
    NumberedLine,
}

impl BoundaryPattern {
    pub const PRIORITY: [BoundaryPattern; 4] = [
        BoundaryPattern::ChapterHeading,
        BoundaryPattern::ChAbbreviation,
        BoundaryPattern::BareNumberLine,
        BoundaryPattern::NumberedLine,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            BoundaryPattern::ChapterHeading => &RE_CHAPTER_HEADING,
            BoundaryPattern::ChAbbreviation => &RE_CH_ABBREVIATION,
            BoundaryPattern::BareNumberLine => &RE_BARE_NUMBER_LINE,
            BoundaryPattern::NumberedLine => &RE_NUMBERED_LINE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryPattern::ChapterHeading => "chapter_heading",
            BoundaryPattern::ChAbbreviation => "ch_abbreviation",
            BoundaryPattern::BareNumberLine => "bare_number_line",
            BoundaryPattern::NumberedLine => "numbered_line",
        }
    }

    /// 标记之间的正文（不含标记前的前言）
    fn bodies<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let spans: Vec<(usize, usize)> = self
            .regex()
            .find_iter(content)
            .map(|m| (m.start(), m.end()))
            .collect();

        spans
            .iter()
            .enumerate()
            .map(|(i, &(_, end))| {
                let next_start = spans.get(i + 1).map_or(content.len(), |&(start, _)| start);
                &content[end..next_start]
            })
            .collect()
    }
}

/// 选择章节边界模式
///
/// 按优先级逐个尝试。以某模式切分文本会得到 `1 + 2 * 命中数` 段
/// （前言，然后每处命中一个标记加一段正文），段数大于 3 即接受，
/// 也就是至少两处标记。后面的模式不再尝试。
pub fn select_boundary_pattern(content: &str) -> Option<BoundaryPattern> {
    BoundaryPattern::PRIORITY.into_iter().find(|pattern| {
        let pieces = 1 + 2 * pattern.regex().find_iter(content).count();
        pieces > 3
    })
}

/// 使用默认配置分割章节
pub fn segment(content: &str) -> Vec<ChapterCandidate> {
    segment_chapters(content, &SegmentConfig::default())
}

/// 分割章节
pub fn segment_chapters(content: &str, config: &SegmentConfig) -> Vec<ChapterCandidate> {
    let Some(pattern) = select_boundary_pattern(content) else {
        tracing::debug!("No chapter markers found, splitting by length");
        return split_by_length(content, config);
    };

    let mut chapters: Vec<ChapterCandidate> = Vec::new();
    for body in pattern.bodies(content) {
        let body = body.trim();
        if body.chars().count() <= config.min_body_chars {
            continue;
        }
        let ordinal = chapters.len() as u32 + 1;
        chapters.push(ChapterCandidate {
            ordinal,
            title: extract_title(body, ordinal),
            body: body.to_string(),
        });
    }

    if chapters.is_empty() {
        tracing::debug!(
            pattern = pattern.as_str(),
            "Chapter markers matched but no usable bodies, splitting by length"
        );
        return split_by_length(content, config);
    }

    tracing::debug!(
        pattern = pattern.as_str(),
        chapters = chapters.len(),
        "Segmented by chapter markers"
    );
    chapters
}

/// 按词数切块
///
/// 每块 `max(min_words_per_chunk, 总词数 / target_chunks)` 个词，
/// 单空格拼接，标题为 `Part {n}`。
pub fn split_by_length(content: &str, config: &SegmentConfig) -> Vec<ChapterCandidate> {
    let words: Vec<&str> = content.split_whitespace().collect();
    let target_chunks = config.target_chunks.max(1);
    let words_per_chunk = config
        .min_words_per_chunk
        .max(words.len() / target_chunks)
        .max(1);

    let mut chapters: Vec<ChapterCandidate> = Vec::new();
    for chunk in words.chunks(words_per_chunk) {
        let body = chunk.join(" ");
        if body.chars().count() <= config.min_body_chars {
            continue;
        }
        let ordinal = chapters.len() as u32 + 1;
        chapters.push(ChapterCandidate {
            ordinal,
            title: format!("Part {}", ordinal),
            body,
        });
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(tag: &str, sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("The {tag} story continues with sentence number {i} in it."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_chapter_markers_produce_ordered_chapters() {
        let text = format!(
            "Preface text.\nChapter 1\nThe Beginning\n{}\nChapter 2\nThe Middle\n{}\nChapter 3\nThe End\n{}",
            filler("first", 5),
            filler("second", 5),
            filler("third", 5)
        );

        let chapters = segment(&text);

        assert_eq!(chapters.len(), 3);
        let ordinals: Vec<u32> = chapters.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(chapters[0].title, "The Beginning");
        assert_eq!(chapters[2].title, "The End");
        assert!(chapters[1].body.contains("second story"));
        assert!(!chapters[0].body.contains("Preface"));
    }

    #[test]
    fn test_roman_numerals_case_insensitive() {
        let text = format!(
            "chapter i\n{}\nCHAPTER II\n{}",
            filler("alpha", 4),
            filler("beta", 4)
        );
        assert_eq!(
            select_boundary_pattern(&text),
            Some(BoundaryPattern::ChapterHeading)
        );
        assert_eq!(segment(&text).len(), 2);
    }

    #[test]
    fn test_single_marker_not_accepted() {
        let text = format!("Chapter 1\n{}", filler("lonely", 4));
        assert_eq!(select_boundary_pattern(&text), None);

        let chapters = segment(&text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Part 1");
    }

    #[test]
    fn test_short_bodies_do_not_consume_ordinals() {
        let text = format!(
            "Chapter 1\nToo short.\nChapter 2\nKept One\n{}\nChapter 3\nKept Two\n{}",
            filler("kept", 4),
            filler("also", 4)
        );
        let chapters = segment(&text);

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].ordinal, 1);
        assert_eq!(chapters[0].title, "Kept One");
        assert_eq!(chapters[1].ordinal, 2);
    }

    #[test]
    fn test_ch_abbreviation_pattern() {
        let text = format!("Ch. 1\n{}\nCh. 2\n{}", filler("a", 4), filler("b", 4));
        assert_eq!(
            select_boundary_pattern(&text),
            Some(BoundaryPattern::ChAbbreviation)
        );
        assert_eq!(segment(&text).len(), 2);
    }

    #[test]
    fn test_bare_number_lines() {
        let text = format!("1\n{}\n\n2\n{}\n", filler("one", 4), filler("two", 4));
        assert_eq!(
            select_boundary_pattern(&text),
            Some(BoundaryPattern::BareNumberLine)
        );
        let chapters = segment(&text);
        assert_eq!(chapters.len(), 2);
        assert!(chapters[1].body.starts_with("The two story"));
    }

    #[test]
    fn test_numbered_lines() {
        let text = format!("1. {}\n2. {}", filler("one", 4), filler("two", 4));
        assert_eq!(
            select_boundary_pattern(&text),
            Some(BoundaryPattern::NumberedLine)
        );
        assert_eq!(segment(&text).len(), 2);
    }

    #[test]
    fn test_markers_without_bodies_fall_back_to_length() {
        let text = format!("{}\nChapter 1\nshort\nChapter 2\nshort", filler("preface", 5));
        let chapters = segment(&text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Part 1");
        assert!(chapters[0].body.starts_with("The preface story"));
    }

    #[test]
    fn test_length_fallback_chunk_count() {
        // 4500 个词，每块 max(2000, 450) = 2000 词 => 3 块
        let text = vec!["lorem"; 4500].join(" ");
        let chapters = segment(&text);

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "Part 1");
        assert_eq!(chapters[2].title, "Part 3");
        assert_eq!(chapters[0].body.split(' ').count(), 2000);
        assert_eq!(chapters[2].body.split(' ').count(), 500);
    }

    #[test]
    fn test_length_fallback_large_text_uses_tenth() {
        let text = vec!["word"; 30_000].join("\n");
        let chapters = segment(&text);
        assert_eq!(chapters.len(), 10);
        assert_eq!(chapters[0].body.split(' ').count(), 3000);
    }

    #[test]
    fn test_tiny_text_yields_nothing() {
        assert!(segment("just a few words").is_empty());
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_body_length_counts_chars_not_bytes() {
        // 60 个双字节字符，字节数超过 100 但字符数不足
        let short = "é".repeat(60);
        let text = format!("Chapter 1\n{short}\nChapter 2\n{short}");
        let chapters = segment(&text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Part 1");
    }
}
