//! Explorer API transport, caching, search routing and refresh cycles.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod search;
pub mod snapshot;
pub mod source;

pub use cache::{InMemoryCache, NoCache, ResponseCache};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpExplorer;
pub use search::{SearchResolver, SearchResult};
pub use snapshot::{Snapshot, SnapshotProcessor};
pub use source::ExplorerSource;

#[cfg(test)]
pub(crate) mod testing;
