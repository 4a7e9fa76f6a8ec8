//! Permission system for checking user roles.
//!
//! Role lookups go to the transport and are cached per (chat, user), so a
//! burst of admin commands costs a single API call.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let perms = Permissions::new(transport.clone(), owner_ids);
//!
//! if perms.is_elevated(chat, user).await? {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::Permissions;
