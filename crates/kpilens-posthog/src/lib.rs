//! PostHog-backed KPI assembly: the HTTP client, response normalization and
//! per-family parsers, and the orchestration that ties them together.

pub mod assembler;
pub mod cache;
pub mod client;
pub mod envelope;
pub mod extract;
pub mod parsers;

pub use assembler::KpiAssembler;
pub use cache::RequestCache;
pub use client::PosthogClient;
