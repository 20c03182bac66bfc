//! NLP Adapter - 可选的语言学模型

mod lexicon_model;

pub use lexicon_model::{load_language_support, LexiconModel, ModelLoadError};
