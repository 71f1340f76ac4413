//! Request-independent orchestration services.

pub mod chat;

pub use chat::ChatService;
