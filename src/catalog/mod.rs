//! Catalog data model
//!
//! Value objects produced by the extractors and consumed by the persistence sink,
//! plus the traversal key space that drives the outer crawl loop.
//!
//! # Components
//!
//! - `TraversalKey` / `KeySpace`: one listing shard and the finite ordered set of shards
//! - `EntryStub`: a catalog entry (movie) as seen on a listing page
//! - `NestedRecord`: a song found on an entry's detail page
//! - `CapturedDocument`: the raw capture persisted to the blob store

mod keys;
mod types;

pub use keys::{KeySpace, TraversalKey};
pub use types::{capture_key, CapturedDocument, EntryStub, NestedRecord};
