/// Re-export `Config` from `kpilens-core` for use within this crate.
///
/// Environment parsing lives in `kpilens-core` so integration tests can build
/// a config without depending on the server.
pub use kpilens_core::config::Config;
