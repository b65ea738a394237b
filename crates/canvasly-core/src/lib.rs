//! Canvasly Core Library
//!
//! Editing state for the Canvasly design canvas: elements, selection,
//! linear undo/redo history, and key-value persistence.

pub mod config;
pub mod element;
pub mod history;
pub mod project;
pub mod state;
pub mod storage;
pub mod store;

pub use config::StoreConfig;
pub use element::{CanvasElement, ElementId, ElementKind, ElementPatch, FontStyle, FontWeight, TextAlign};
pub use history::{History, HistoryEntry};
pub use project::{Project, ProjectLibrary, ProjectStatus};
pub use state::{CanvasState, CanvasView};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError, StorageResult};
pub use store::{CanvasStore, SubscriptionId};
