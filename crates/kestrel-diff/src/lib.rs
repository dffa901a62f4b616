//! Unified-diff handling for the Kestrel review pipeline.
//!
//! Provides the line mapper (new-file line numbers for added/context lines),
//! the patch rendering strategies (raw vs. context-expanded), and a splitter
//! that turns a whole `git diff` into per-file patches.

pub mod mapper;
pub mod splitter;
pub mod strategy;
