//! Job Relay - buffers short-lived game-server job notifications between a
//! webhook producer and a polling consumer.
//!
//! Producers post chat-style embed payloads; the relay extracts a job from
//! each, drops resends of jobs still queued, and hands each live job to
//! exactly one consumer pull, highest category first. Jobs older than the TTL
//! are never delivered.

pub mod config;
pub mod extract;
pub mod forward;
pub mod queue;
pub mod relay;
pub mod server;
pub mod sweeper;
pub mod types;
