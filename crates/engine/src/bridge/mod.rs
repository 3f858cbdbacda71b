mod channel;
mod opener;
mod popup;

pub use channel::{OpenerPort, PopupConnection, PopupHandle, PopupLauncher};
pub use opener::IdentityBridge;
pub use popup::{PopupFlow, PopupState};

#[cfg(test)]
pub(crate) mod fakes;
