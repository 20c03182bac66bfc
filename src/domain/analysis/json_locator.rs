//! LLM 返回内容中的 JSON 对象定位
//!
//! LLM 经常在 JSON 前后夹带说明文字或 markdown 代码块，这里按顺序尝试
//! 多个候选片段，第一个能解析成 JSON 对象的胜出。

use serde_json::{Map, Value};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// 从 LLM 文本中提取 JSON 对象
///
/// 候选顺序:
/// 1. 内容以 ```` ```json ```` 开头时，取该标记与最后一个 ```` ``` ```` 之间的文本
/// 2. 第一个括号配平的 `{...}`（跳过字符串内的括号和转义）
/// 3. 第一个 `{` 到最后一个 `}`
///
/// 去掉代码块标记后能解析的全文必然以 `{` 开头、`}` 结尾，已被第 3 步覆盖，
/// 所以不单独尝试。
///
/// 文本中没有 `{` 时直接返回 None；所有候选都失败时记录 warn 并返回 None。
pub fn extract_json_object(content: &str) -> Option<Map<String, Value>> {
    if !content.contains('{') {
        return None;
    }

    let candidates = [
        fenced_block(content),
        first_balanced_object(content),
        outermost_braces(content),
    ];

    let mut last_error: Option<serde_json::Error> = None;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Some(map),
            Ok(_) => continue,
            Err(e) => last_error = Some(e),
        }
    }

    let preview: String = content.chars().take(200).collect();
    match last_error {
        Some(e) => tracing::warn!(error = %e, preview = %preview, "Failed to locate JSON object in LLM output"),
        None => tracing::warn!(preview = %preview, "LLM output contains JSON but no object"),
    }
    None
}

fn fenced_block(content: &str) -> Option<&str> {
    if !content.trim().starts_with(JSON_FENCE) {
        return None;
    }
    let start = content.find(JSON_FENCE)? + JSON_FENCE.len();
    let end = content.rfind(FENCE)?;
    (start < end).then(|| content[start..end].trim())
}

fn first_balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&content[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

fn outermost_braces(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}
