//! Analysis Queries - 不落库的即时文本分析

/// 即时分析一段文本
#[derive(Debug, Clone)]
pub struct AnalyzeText {
    pub text: String,
    /// 关系分析使用的人名；为空时使用识别出的人物
    pub names: Option<Vec<String>>,
}
