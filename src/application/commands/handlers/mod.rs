//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod analysis_handlers;
mod chat_handlers;
mod novel_handlers;

pub use analysis_handlers::*;
pub use chat_handlers::*;
pub use novel_handlers::*;
