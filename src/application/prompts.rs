//! LLM 提示词构造
//!
//! 摘要、聊天、章节分析三类提示词，均为纯函数。

use uuid::Uuid;

use crate::application::ports::ChapterRecord;
use crate::domain::novel::SummaryLength;

/// 聊天上下文取前几章
pub const CHAT_CONTEXT_CHAPTERS: usize = 5;
/// 系统提示词中上下文的最大字符数
pub const CHAT_CONTEXT_MAX_CHARS: usize = 6000;
/// 无摘要时截取正文的字符数
pub const CHAPTER_PREVIEW_CHARS: usize = 500;
/// 模板中 chapter_id 的占位值，章节 ID 由存储层生成
pub const CHAPTER_ID_PLACEHOLDER: &str = "GENERATED_BY_DB";

/// 按字符截断
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 章节摘要提示词
pub fn summary_prompt(
    chapter_title: &str,
    chapter_content: &str,
    length: SummaryLength,
    max_content_chars: usize,
) -> String {
    format!(
        r#"You are an expert literary analyst. Please analyze the following chapter and provide:

1. A {length} summary following this instruction: {instruction}
2. A list of key events (3-5 main plot points)
3. A list of characters mentioned in this chapter

Chapter Title: {title}

Chapter Content:
{content}

Please format your response as a JSON object with the following structure:
{{
    "summary": "Your summary here",
    "key_events": ["Event 1", "Event 2", "Event 3"],
    "characters_mentioned": ["Character 1", "Character 2"]
}}"#,
        length = length.as_str(),
        instruction = length.instruction(),
        title = chapter_title,
        content = truncate_chars(chapter_content, max_content_chars),
    )
}

/// 聊天上下文：前几章的标题加摘要（无摘要时取正文开头）
pub fn chat_context(chapters: &[ChapterRecord]) -> (String, usize) {
    let parts: Vec<String> = chapters
        .iter()
        .take(CHAT_CONTEXT_CHAPTERS)
        .map(|chapter| {
            let body = match chapter.summary.as_deref() {
                Some(summary) if !summary.trim().is_empty() => summary,
                _ => truncate_chars(&chapter.content, CHAPTER_PREVIEW_CHARS),
            };
            format!("Chapter {}: {}\n{}", chapter.chapter_number, chapter.title, body)
        })
        .collect();

    let used = parts.len();
    (parts.join("\n\n"), used)
}

/// 聊天系统提示词
pub fn chat_system_prompt(novel_context: &str) -> String {
    format!(
        r#"You are an intelligent reading companion AI. You help readers understand and discuss novels.
You have access to the following novel content for reference:

{context}

Guidelines:
- Provide helpful, insightful responses about the story
- Reference specific parts of the text when relevant
- Suggest related questions that might interest the reader
- Be conversational and engaging
- If you're not sure about something, say so"#,
        context = truncate_chars(novel_context, CHAT_CONTEXT_MAX_CHARS),
    )
}

/// 章节分析模板的填充字段
#[derive(Debug, Clone)]
pub struct AnalysisPromptFields<'a> {
    pub novel_id: Uuid,
    pub novel_title: &'a str,
    pub chapter_number: u32,
    pub word_count: usize,
    pub reading_time_minutes: usize,
}

impl AnalysisPromptFields<'_> {
    /// 章节标题统一为 "{小说标题} - Chapter {n}"
    pub fn chapter_title(&self) -> String {
        format!("{} - Chapter {}", self.novel_title, self.chapter_number)
    }
}

/// 替换模板中的 `{{...}}` 占位符
pub fn fill_analysis_template(template: &str, fields: &AnalysisPromptFields<'_>) -> String {
    template
        .replace("{{novel_id}}", &fields.novel_id.to_string())
        .replace("{{chapter_id}}", CHAPTER_ID_PLACEHOLDER)
        .replace("{{novel_title}}", fields.novel_title)
        .replace("{{chapter_number}}", &fields.chapter_number.to_string())
        .replace("{{chapter_title}}", &fields.chapter_title())
        .replace("{{word_count}}", &fields.word_count.to_string())
        .replace("{{reading_time}}", &fields.reading_time_minutes.to_string())
}

/// 章节正文在前，填充后的模板在后
pub fn analysis_prompt(chapter_content: &str, filled_template: &str) -> String {
    format!(
        "Novel Chapter Text:\n\n{chapter_content}\n\n---END OF CHAPTER TEXT---\n\n\
         Analyze the above chapter and provide the output in the following JSON format. \
         Ensure the entire output is a single valid JSON object as specified in the schema \
         provided in the initial prompt template instructions:\n\n{filled_template}"
    )
}
