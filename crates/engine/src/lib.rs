pub mod bridge;
mod composer;
mod config;
mod drafts;
mod events;
mod highlight;
mod moderation;
mod polling;
mod render;
mod session;
mod state;
mod store;

pub use composer::{Composer, ComposerMode, Sticker, StickerCatalog, StickerPack, StickerSource};
pub use config::Settings;
pub use drafts::{DraftKey, DraftStore};
pub use events::{EventBus, ToastLevel, UiEvent};
pub use highlight::{overlay_phase, HighlightCoordinator, OverlayPhase};
pub use moderation::ModerationActions;
pub use polling::{PollState, PollingController};
pub use render::{
    plan, prerender, Actions, Badge, Breadcrumb, ComposerKind, OpenComposer, RenderNode,
    RenderOptions, Viewer,
};
pub use session::SessionHandle;
pub use state::{AppState, ThreadHandle};
pub use store::{CommentStore, Snapshot};

#[cfg(test)]
pub(crate) mod test_api;
