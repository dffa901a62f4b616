//! Review orchestration with per-file error isolation.
//!
//! The pipeline fans a batch of changed files out to every reviewer role
//! concurrently, gates each conversation on the token budget before any
//! request is sent, and folds the results back together in the original
//! file order. One file failing never takes down the batch; failures are
//! recorded next to the successful reviews.

use futures::future::join_all;
use kestrel_core::{FileReview, KestrelError, PrFile, ReviewConfig, RoleId};
use kestrel_diff::{mapper, strategy};
use serde::Serialize;

use crate::budget;
use crate::completion::CompletionService;
use crate::prompt::{build_conversation, build_diff_blob, PromptKind};
use crate::report;
use crate::roles::{default_roles, ReviewerRole};

/// A file the batch could not review, with the failing role when the
/// failure was role-specific.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub filename: String,
    /// `None` when the failure happened before any role ran, such as a
    /// patch that would not parse or a conversation over budget.
    pub role: Option<RoleId>,
    pub error: String,
}

/// The outcome of reviewing a batch of files.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReview {
    /// Successful per-file reviews, in input order.
    pub reviews: Vec<FileReview>,
    /// Files that could not be reviewed, in input order.
    pub failures: Vec<FileFailure>,
}

impl BatchReview {
    /// Render the successful reviews as an XML report.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Serialization`] when review text contains
    /// characters XML cannot represent.
    pub fn to_xml(&self) -> Result<String, KestrelError> {
        report::to_xml(&self.reviews)
    }
}

enum FileOutcome {
    Reviewed(FileReview),
    Failed(FileFailure),
}

/// Render a file's patch with the configured strategy, then assign
/// new-file line numbers so reviewers can reference exact positions.
pub fn render_numbered_patch(file: &PrFile, context_lines: usize) -> Result<String, KestrelError> {
    let patch = strategy::render_patch(file, context_lines)?;
    mapper::assign_line_numbers(&patch)
}

/// Orchestrates reviewer roles over batches of changed files.
pub struct ReviewPipeline<C> {
    service: C,
    config: ReviewConfig,
    roles: Vec<ReviewerRole>,
}

impl<C: CompletionService> ReviewPipeline<C> {
    /// Build a pipeline with the default reviewer lineup.
    pub fn new(service: C, config: ReviewConfig) -> Self {
        Self {
            service,
            config,
            roles: default_roles(),
        }
    }

    /// Review a batch of files with no retrieved context.
    ///
    /// # Errors
    ///
    /// Individual file failures are collected in the returned
    /// [`BatchReview`]; this only errors on conditions that invalidate the
    /// whole batch, which today is none.
    pub async fn review_files(&self, files: &[PrFile]) -> Result<BatchReview, KestrelError> {
        self.review_files_with_context(files, &[]).await
    }

    /// Review a batch of files, pairing each with optional retrieved
    /// context by position. A missing or `None` entry means no context.
    pub async fn review_files_with_context(
        &self,
        files: &[PrFile],
        contexts: &[Option<String>],
    ) -> Result<BatchReview, KestrelError> {
        let outcomes = join_all(files.iter().enumerate().map(|(i, file)| {
            let context = contexts.get(i).and_then(|c| c.as_deref());
            self.review_one(file, context)
        }))
        .await;

        let mut reviews = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Reviewed(review) => reviews.push(review),
                FileOutcome::Failed(failure) => failures.push(failure),
            }
        }
        Ok(BatchReview { reviews, failures })
    }

    /// Review one file with every role concurrently.
    ///
    /// The budget gate runs for all roles before any request goes out, so
    /// an oversized file costs zero completion calls. Role results are
    /// inspected in the fixed role order; the first role error wins.
    async fn review_one(&self, file: &PrFile, context: Option<&str>) -> FileOutcome {
        let patch = match render_numbered_patch(file, self.config.context_lines) {
            Ok(patch) => patch,
            Err(e) => {
                return FileOutcome::Failed(FileFailure {
                    filename: file.filename.clone(),
                    role: None,
                    error: e.to_string(),
                });
            }
        };

        for role in &self.roles {
            let conversation = role.conversation(&patch, context);
            match budget::conversation_within_limit(&conversation, self.service.model()) {
                Ok(true) => {}
                Ok(false) => {
                    return FileOutcome::Failed(FileFailure {
                        filename: file.filename.clone(),
                        role: None,
                        error: KestrelError::Budget(format!(
                            "{} conversation for {} exceeds the {} context window",
                            role.id(),
                            file.filename,
                            self.service.model()
                        ))
                        .to_string(),
                    });
                }
                Err(e) => {
                    return FileOutcome::Failed(FileFailure {
                        filename: file.filename.clone(),
                        role: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        let results = join_all(
            self.roles
                .iter()
                .map(|role| role.run(&self.service, &patch, context)),
        )
        .await;

        let mut findings = Vec::new();
        for (role, result) in self.roles.iter().zip(results) {
            match result {
                Ok(role_findings) => findings.extend(role_findings),
                Err(e) => {
                    return FileOutcome::Failed(FileFailure {
                        filename: file.filename.clone(),
                        role: Some(role.id()),
                        error: e.to_string(),
                    });
                }
            }
        }

        FileOutcome::Reviewed(FileReview {
            filename: file.filename.clone(),
            reviews: findings,
        })
    }

    /// Review the whole batch as one diff blob with a single completion
    /// call, returning the model's raw text.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Budget`] when the combined blob exceeds the
    /// model's context window; the service is never invoked in that case.
    /// Patch rendering and completion errors propagate as-is.
    pub async fn review_single_shot(
        &self,
        files: &[PrFile],
        kind: PromptKind,
    ) -> Result<String, KestrelError> {
        let patches = files
            .iter()
            .map(|file| render_numbered_patch(file, self.config.context_lines))
            .collect::<Result<Vec<_>, _>>()?;

        let blob = build_diff_blob(&patches);
        let conversation = build_conversation(kind, &blob, None);
        if !budget::conversation_within_limit(&conversation, self.service.model())? {
            return Err(KestrelError::Budget(format!(
                "combined diff exceeds the {} context window",
                self.service.model()
            )));
        }

        self.service.complete(conversation).await
    }
}
