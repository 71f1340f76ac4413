//! Structured logging schema and field name constants for scrawl.
//!
//! All crates use these field names for consistent structured logging so log
//! aggregation tools can query by standardized names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (tokens, deliveries) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request's sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "core", "db", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "editor", "notify", "pool", "openai"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "edit", "rollback", "publish", "complete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Origin key of the client behind a request or subscription.
pub const ORIGIN: &str = "origin";

/// Chat transcript id being operated on.
pub const CHAT_ID: &str = "chat_id";

/// Registry handle of a notification subscriber.
pub const SUBSCRIBER: &str = "subscriber";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of note content or a model reply.
pub const CONTENT_LEN: &str = "content_len";

/// Number of subscribers an event was delivered to.
pub const DELIVERED: &str = "delivered";

/// Number of live notification subscribers.
pub const LIVE: &str = "live";

/// Depth of the note version history.
pub const VERSIONS: &str = "versions";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for a completion.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
