//! # otl-core
//!
//! Outline synchronization engine for notebook documents.
//!
//! This crate keeps three views of a notebook's heading structure in
//! agreement: the document itself (markdown cells containing ATX
//! headings), a hierarchical outline view rendered by the host, and the
//! host's own built-in outline pane. It parses headings, builds the
//! hierarchy, and coordinates updates and selection in both directions.
//!
//! ## Architecture
//!
//! The crate is organized around several key components:
//!
//! - **Parsing and hierarchy**: Regex-based ATX heading extraction and a
//!   single-pass stack algorithm producing parent links and cell ranges
//! - **View model**: The current structure plus filter, selection, and
//!   in-viewport state, with change notifications for the rendering layer
//! - **Coordination**: Trailing-edge debounced refreshes that skip work
//!   while the outline view is hidden
//! - **Selection sync**: Loop-free bidirectional synchronization between
//!   editor cell selections and outline node selection
//! - **Host outline**: Best-effort, retried nudging of the host's native
//!   outline pane
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use otl_core::{HostOutline, OutlineEngine, OutlineView, Settings};
//!
//! # fn hosts() -> (Arc<dyn OutlineView>, Arc<dyn HostOutline>) { unimplemented!() }
//! # async fn run() -> otl_core::Result<()> {
//! let (outline_view, host_outline) = hosts();
//! let engine = OutlineEngine::activate(&Settings::default(), outline_view, host_outline);
//!
//! // Forward host events into the engine:
//! engine.document_changed();
//! engine.view_visibility_changed(true);
//!
//! engine.deactivate();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T, Error>`]. Failures on the sync
//! paths are deliberately non-fatal: a refresh that cannot parse degrades
//! to an empty outline, and host-outline sync logs and swallows errors
//! after its retry budget. Only configuration and argument validation
//! surface errors to the caller.

/// Configuration types and TOML parsing
pub mod config;
/// Debounced scheduling of outline refreshes
pub mod coordinator;
/// Reusable trailing-edge debounce timer
pub mod debounce;
/// Selection change detection with user/system tagging
pub mod detector;
/// Activation-time wiring and host event entry points
pub mod engine;
/// Error types and result aliases
pub mod error;
/// Stack-based heading hierarchy construction
pub mod hierarchy;
/// Host integration traits and document snapshots
pub mod host;
/// ATX heading extraction from markup cells
pub mod parser;
/// Editor <-> outline selection synchronization
pub mod selection_sync;
/// Best-effort host outline pane synchronization
pub mod sync_manager;
/// Core data types and structures
pub mod types;
/// The outline view model
pub mod view_model;
/// Viewport tracking of in-view outline nodes
pub mod visible;

// Re-export commonly used types
pub use config::{OutlineSettings, Settings, SyncConfig};
pub use coordinator::{SnapshotFn, UpdateCoordinator};
pub use debounce::Debouncer;
pub use detector::{SelectionChangeDetector, SelectionContext, SelectionSubscription};
pub use engine::OutlineEngine;
pub use error::{Error, Result};
pub use hierarchy::HierarchyBuilder;
pub use host::{CellSnapshot, DocumentSnapshot, HostOutline, NotebookEditor, OutlineView};
pub use parser::HeadingParser;
pub use selection_sync::OutlineSelectionSync;
pub use sync_manager::OutlineSyncManager;
pub use types::*;
pub use view_model::{OutlineChange, OutlineViewModel, SubscriptionId};
pub use visible::VisibleRangeTracker;
