//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod analysis_handlers;
mod novel_handlers;

pub use analysis_handlers::*;
pub use novel_handlers::*;
