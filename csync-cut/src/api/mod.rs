//! HTTP API handlers for csync-cut
//!
//! REST endpoints for song records and job triggers, plus an SSE stream of
//! job notifications.

pub mod health;
pub mod songs;
pub mod sse;

pub use health::health_routes;
pub use songs::song_routes;
pub use sse::event_stream;
