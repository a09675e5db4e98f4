// Adapters layer: concrete implementations of the domain ports (HTTP sources, cache).

pub mod cache;
pub mod dart;
pub mod ecos;
pub mod fred;
pub mod http;

pub use cache::TtlCache;
pub use dart::DartClient;
pub use ecos::EcosClient;
pub use fred::FredClient;
