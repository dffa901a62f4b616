//! GitHub pull request integration.
//!
//! Fetches the changed files of a PR and posts the finished report back
//! as an issue comment. Only the patch text is fetched; full file
//! contents are left out so review input stays bounded by the diff.

use kestrel_core::{KestrelError, PrFile};
use serde::Deserialize;

/// Parse an `owner/repo#number` pull request reference.
///
/// # Errors
///
/// Returns [`KestrelError::Config`] when the reference does not have the
/// `owner/repo#number` shape.
///
/// # Examples
///
/// ```
/// use kestrel_review::github::parse_pr_reference;
///
/// let (owner, repo, number) = parse_pr_reference("rust-lang/cargo#1234").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "cargo");
/// assert_eq!(number, 1234);
/// ```
pub fn parse_pr_reference(reference: &str) -> Result<(String, String, u64), KestrelError> {
    let invalid =
        || KestrelError::Config(format!("invalid PR reference '{reference}', expected owner/repo#number"));

    let (path, number) = reference.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = path.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number: u64 = number.parse().map_err(|_| invalid())?;
    Ok((owner.to_string(), repo.to_string(), number))
}

#[derive(Deserialize)]
struct ChangedFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
}

/// GitHub API client for pull request review.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client, falling back to the `GITHUB_TOKEN` environment
    /// variable when no token is given. Without a token only public
    /// repositories can be read and nothing can be posted.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Git`] when the underlying clients cannot
    /// be built.
    pub fn new(token: Option<&str>) -> Result<Self, KestrelError> {
        let token = token
            .map(str::to_string)
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());

        let mut builder = octocrab::Octocrab::builder();
        if let Some(t) = &token {
            builder = builder.personal_token(t.clone());
        }
        let octocrab = builder
            .build()
            .map_err(|e| KestrelError::Git(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent("kestrel-ai")
            .build()
            .map_err(|e| KestrelError::Git(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token,
        })
    }

    /// Fetch the changed files of a pull request as reviewable inputs.
    ///
    /// Files without patch text (binary files, very large diffs) are
    /// skipped. Old and new file contents are not fetched.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Git`] on API failures.
    pub async fn get_pr_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PrFile>, KestrelError> {
        let url = format!(
            "https://api.github.com/repos/{owner}/{repo}/pulls/{number}/files?per_page=100"
        );

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| KestrelError::Git(format!("failed to fetch PR files: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KestrelError::Git(format!(
                "GitHub API error {status} fetching files for {owner}/{repo}#{number}: {body}"
            )));
        }

        let changed: Vec<ChangedFile> = response
            .json()
            .await
            .map_err(|e| KestrelError::Git(format!("failed to parse PR file list: {e}")))?;

        Ok(changed
            .into_iter()
            .filter_map(|f| {
                f.patch.map(|patch| PrFile {
                    filename: f.filename,
                    patch,
                    old_contents: None,
                    new_contents: None,
                })
            })
            .collect())
    }

    /// Post the review report as a comment on the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Git`] on API failures, including a missing
    /// token.
    pub async fn post_review_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), KestrelError> {
        if self.token.is_none() {
            return Err(KestrelError::Git(
                "posting a review comment requires a GitHub token".into(),
            ));
        }

        self.octocrab
            .issues(owner, repo)
            .create_comment(number, body)
            .await
            .map_err(|e| {
                KestrelError::Git(format!(
                    "failed to post review comment on {owner}/{repo}#{number}: {e}"
                ))
            })?;

        Ok(())
    }
}
