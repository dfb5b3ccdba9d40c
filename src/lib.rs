//! Auto-follow scroll controller for a token-streamed chat transcript.
//!
//! A transcript pane that receives streamed tokens must keep the newest
//! content visible, yet yield immediately when the user scrolls away. Both
//! cases produce identical low-level scroll events, so the controller has to
//! disambiguate them live, without fighting the frame-paced loop that keeps
//! re-pinning the viewport to the bottom while a stream is active.
//!
//! ## Architecture
//!
//! ```text
//! PaneEvent (scroll / stream / content / conversation)
//!   └── FollowController            (integration shell, owns everything)
//!        ├── detector               (immediate manual-scroll check, runs first)
//!        ├── DebounceGate           (coalesces classification passes)
//!        ├── classify               (metrics -> ScrollPosition)
//!        ├── AutoScrollMachine      (FOLLOWING / PAUSED, single writer)
//!        └── ScrollDriver           (frame-paced jump-to-bottom loop)
//! ```
//!
//! The controller is deterministic: every entry point takes the current
//! [`std::time::Instant`], and all timers are deadlines owned by the
//! controller itself. [`runtime::FollowRuntime`] supplies the tokio event
//! loop for production use; tests drive `on_tick` with hand-built instants.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod detector;
pub mod driver;
pub mod events;
pub mod machine;
pub mod metrics;
pub mod runtime;
pub mod viewport;

pub use config::FollowConfig;
pub use controller::FollowController;
pub use events::PaneEvent;
pub use machine::FollowSnapshot;
pub use metrics::{ScrollMetrics, ScrollPosition};
pub use runtime::{FollowHandle, FollowRuntime};
pub use viewport::{ScrollBehavior, Viewport, ViewportHandle};
