//! HTTP Handlers

mod analysis;
mod chapter;
mod novel;
mod ping;
mod websocket;

pub use analysis::*;
pub use chapter::*;
pub use novel::*;
pub use ping::*;
pub use websocket::*;
