pub mod service;

pub use service::{cache_ttl, PollerService};
