//! Multi-role AI review orchestration for pull request diffs.
//!
//! Provides the review pipeline: completion service client, prompt
//! templates and assembly, token budget gating, independent reviewer roles,
//! orchestration with per-file error isolation, XML report serialization,
//! and GitHub PR integration.

pub mod budget;
pub mod completion;
pub mod github;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod roles;
