//! Foundational low-level utilities shared across Orbit crates.
//!
//! Provides timestamp parsing, short stable hashes, text truncation, and atomic
//! state-file writes used by plan building, rendering, and the chat runtime.

pub mod atomic_io;
pub mod hash_utils;
pub mod text_utils;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use hash_utils::{sha256_hex, short_key_hash};
pub use text_utils::{tail_lines, truncate_for_error};
pub use time_utils::{parse_rfc3339_utc, seconds_between};
