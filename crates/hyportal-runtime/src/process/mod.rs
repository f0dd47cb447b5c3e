//! Process plumbing shared by the server supervisor and the downloader.
//!
//! - `ports`: point-in-time TCP port availability
//! - `shutdown`: SIGTERM, grace period, SIGKILL
//! - `stream`: chunked, UTF-8 safe output readers

mod ports;
mod shutdown;
mod stream;

pub use ports::is_port_available;
pub use shutdown::{DEFAULT_GRACE_PERIOD, shutdown_child};
pub use stream::{OutputChunk, Utf8ChunkDecoder, spawn_chunk_reader};
