//! 语言模型能力
//!
//! 可选的语言学模型（NER、分句、词性/词元）抽象。
//! 模型在启动时尽力加载一次，以 `LanguageSupport` 注入各分析组件，
//! 不可用时各组件走基础（正则 + 词频）路径。

use std::fmt;
use std::sync::Arc;

/// 模型识别出的命名实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    /// 实体原文
    pub text: String,
    /// 实体标签（PERSON / GPE / LOC / ORG ...）
    pub label: String,
}

impl NamedEntity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// 模型输出的词元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    /// 通用词性标签（NOUN / ADJ / VERB / PUNCT / X ...）
    pub pos: String,
    pub is_stop: bool,
    pub is_punct: bool,
}

/// 语言学模型接口
///
/// 实现必须是纯函数式的：同一输入总是得到同一输出。
pub trait LinguisticModel: Send + Sync {
    /// 命名实体识别，按文本顺序返回
    fn entities(&self, text: &str) -> Vec<NamedEntity>;

    /// 分句
    fn sentences(&self, text: &str) -> Vec<String>;

    /// 分词（含词元、词性、停用词标记）
    fn tokens(&self, text: &str) -> Vec<Token>;
}

/// 能力标记
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NlpCapability {
    /// 仅基础算法
    #[default]
    Basic,
    /// 语言学模型可用
    Model,
}

impl NlpCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            NlpCapability::Basic => "basic",
            NlpCapability::Model => "model",
        }
    }
}

/// 注入到各分析组件的语言支持
#[derive(Clone, Default)]
pub enum LanguageSupport {
    #[default]
    Basic,
    Model(Arc<dyn LinguisticModel>),
}

impl LanguageSupport {
    pub fn with_model(model: Arc<dyn LinguisticModel>) -> Self {
        LanguageSupport::Model(model)
    }

    pub fn capability(&self) -> NlpCapability {
        match self {
            LanguageSupport::Basic => NlpCapability::Basic,
            LanguageSupport::Model(_) => NlpCapability::Model,
        }
    }
}

impl fmt::Debug for LanguageSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageSupport({})", self.capability().as_str())
    }
}
