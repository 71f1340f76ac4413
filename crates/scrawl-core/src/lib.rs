//! # scrawl-core
//!
//! Core types, traits, and services for the scrawl shared notepad.
//!
//! This crate provides the foundational pieces the other scrawl crates build
//! on: the error taxonomy, the store and model-backend traits, the debounced
//! write coalescer that owns the in-memory note, and the origin-aware
//! notification hub with its bounded subscriber registry.

pub mod defaults;
pub mod editor;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod traits;

// Re-export commonly used types at crate root
pub use editor::NoteEditor;
pub use error::{Error, Result};
pub use models::{ChatMessage, ChatSummary, ChatTranscript, MessageRole};
pub use notify::{NoteChanged, NotifyHub, OriginId, SubscriberId, Subscription};
pub use traits::{ChatStore, CompletionBackend, NoteStore};
