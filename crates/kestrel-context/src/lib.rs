//! Vector similarity store client for retrieval-augmented review context.
//!
//! Kestrel does not compute embeddings itself; this crate only talks to an
//! already-populated index to upsert vectors and fetch the nearest matches,
//! whose metadata snippets become the "context" string fed to the prompt
//! assembler.

pub mod store;

pub use store::{context_from_matches, SimilarityMatch, VectorStoreClient};
