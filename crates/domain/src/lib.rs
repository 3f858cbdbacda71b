pub mod bridge;
mod error;
mod identity;
mod models;
mod tree;

pub use error::{Error, Result};
pub use identity::{valid_email, GuestIdentity, LinkedAccount, SessionIdentity, UserProfile};
pub use models::{Comment, ContentId, ContentRef, ContentType, ModerationState};
pub use tree::CommentTree;
