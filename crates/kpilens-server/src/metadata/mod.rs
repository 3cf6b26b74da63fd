pub use kpilens_metadata::{TenantConfig, TenantStore};

pub mod file;
