//! Database models.

pub mod common;
pub mod policy;
pub mod user;
pub mod warn;

pub use common::{ChatId, MessageId, UserId};
pub use policy::{AutoResponse, Policy, PolicyChange};
pub use user::ChatUser;
pub use warn::{WarnOutcome, WarnRecord};
