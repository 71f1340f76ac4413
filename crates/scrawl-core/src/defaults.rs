//! Centralized default constants for the scrawl system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers. When adding new constants, place them in the appropriate section
//! and document the rationale for the chosen value.

// =============================================================================
// WRITE COALESCING
// =============================================================================

/// Quiet period the editor waits after the last edit before persisting.
///
/// Human typing cadence rarely pauses this long mid-thought, so one storage
/// write typically covers a whole burst of keystrokes.
pub const QUIET_PERIOD_MS: u64 = 5_000;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Upper bound on concurrently registered change-notification subscribers.
/// Oldest registrations are evicted past this point, capping connection
/// leakage when disconnects are never observed.
pub const MAX_SUBSCRIBERS: usize = 50;

/// SSE event label clients listen for to trigger a refresh.
pub const SSE_EVENT_LABEL: &str = "message";

/// Interval between SSE keep-alive comments.
pub const SSE_KEEPALIVE_SECS: u64 = 15;

// =============================================================================
// STORAGE
// =============================================================================

/// Row id of the singleton note record.
pub const NOTE_ROW_ID: i64 = 0;

/// Default database URL when `DATABASE_URL` is unset.
pub const DATABASE_URL: &str = "sqlite://scrawl.db";

// =============================================================================
// CHAT
// =============================================================================

/// Placeholder title assigned to a freshly created chat.
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Prompt prefix used to summarize a chat into a short title.
pub const TITLE_PROMPT_PREFIX: &str = "Summarize this chat in 2 words:";

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Maximum accepted request body size. Notes are plain text; anything
/// approaching this is not a note.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;
