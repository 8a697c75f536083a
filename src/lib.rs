// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. dom::DomError)
    clippy::module_name_repetitions
)]

//! # docnav
//!
//! Headless runtime for the navigation widgets of a generated API
//! documentation page.
//!
//! Two widgets are provided:
//! - a scroll highlighter that marks the menu entry of the section the reader
//!   is currently looking at
//! - panel toggles that open and close auxiliary panels on tap and dismiss
//!   them on outside presses or in-page navigation
//!
//! ## Architecture
//!
//! The runtime follows The Elm Architecture (TEA) pattern:
//! - **Model**: [`app::App`] owning the page and its services
//! - **Message**: [`app::Message`], host events
//! - **Update**: [`app::App::dispatch`], one message at a time
//! - **View**: [`app::Snapshot`], the observable class state
//!
//! ## Modules
//!
//! - [`app`]: Runtime and message dispatch
//! - [`components`]: The widgets and their lifecycle trait
//! - [`dom`]: Element tree, selectors and URL handling
//! - [`viewport`]: Scroll/resize notifications
//! - [`pointer`]: Tap vs. drag detection
//! - [`scheduler`]: Deferred callbacks on an explicit clock
//! - [`registry`]: Selector to widget bindings
//! - [`script`]: Replay scripts
//! - [`config`]: Persistent defaults
//! - [`watcher`]: File watching

pub mod app;
pub mod components;
pub mod config;
pub mod dom;
pub mod pointer;
pub mod registry;
pub mod scheduler;
pub mod script;
pub mod viewport;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Snapshot};
    pub use crate::components::{Component, ScrollHighlighter, Timings, ToggleControl};
    pub use crate::dom::{NodeId, Page, PageSpec};
    pub use crate::script::Script;
    pub use crate::viewport::Viewport;
}
