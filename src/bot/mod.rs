//! Bot module - Telegram front-end of the engine.

pub mod dispatcher;
mod runtime;
mod transport;
pub mod updates;
mod webhook;

pub use dispatcher::{ThrottledBot, build_dispatcher};
pub use runtime::run;
pub use transport::TelegramTransport;
