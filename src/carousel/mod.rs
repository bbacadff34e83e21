//! Display-independent carousel and lightbox state.

pub mod bounds;
pub mod fade;
pub mod lightbox;
pub mod load_state;
pub mod motion;
pub mod scroll_lock;

pub use bounds::{BoundsTracker, BoundsUpdate};
pub use fade::FadeVisibility;
pub use lightbox::{CloseReason, Lightbox, LightboxKey};
pub use load_state::{slide_at, visible_slides, LoadFlags, SlideRequests, TapDecision, TapTracker};
pub use motion::{Frame, OffsetController};
pub use scroll_lock::ScrollLock;
