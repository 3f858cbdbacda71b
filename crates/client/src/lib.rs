mod http;
mod invalidate;
mod traits;

pub use http::HttpApi;
pub use invalidate::{
    InvalidationSigner, Invalidator, NullInvalidator, WebhookInvalidator, MAX_SKEW_SECS,
};
pub use traits::{Api, CreateComment, Credential, RotatedToken, ThreadPayload};
