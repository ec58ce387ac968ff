//! Vector similarity services over a catalog snapshot.
//!
//! - [`IndexWriter`] embeds the catalog and persists a LanceDB table plus a
//!   [`IndexManifest`]
//! - [`LanceIndex`] serves nearest-neighbour queries from that table
//! - [`FlatIndex`] does the same in memory without persistence
pub mod manifest;
pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use manifest::IndexManifest;
pub use memory::FlatIndex;
pub use search::LanceIndex;
pub use writer::{embed_catalog, IndexWriter};
