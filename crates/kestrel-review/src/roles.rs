//! Independent reviewer roles.
//!
//! Each role pairs a fixed system prompt with a findings parser. Roles
//! never share state; running one has no effect on another, so the
//! orchestrator is free to run them concurrently.

use kestrel_core::{KestrelError, ReviewFinding, RoleId};
use serde::Deserialize;

use crate::completion::{ChatMessage, CompletionService};
use crate::prompt::{build_conversation, template, PromptKind};

/// A single reviewer persona: one role id, one fixed instruction template.
#[derive(Debug, Clone, Copy)]
pub struct ReviewerRole {
    id: RoleId,
}

#[derive(Deserialize)]
struct FindingsPayload {
    #[serde(default)]
    findings: Vec<ReviewFinding>,
}

impl ReviewerRole {
    pub fn new(id: RoleId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    /// The fixed system prompt this role reviews with.
    pub fn system_prompt(&self) -> &'static str {
        template(PromptKind::from(self.id))
    }

    /// Build this role's conversation for one rendered patch.
    pub fn conversation(&self, patch: &str, context: Option<&str>) -> Vec<ChatMessage> {
        build_conversation(PromptKind::from(self.id), patch, context)
    }

    /// Run this role against one rendered patch and parse its findings.
    ///
    /// A response that is not valid findings JSON is treated as an empty
    /// review, with a warning on stderr; only transport and service
    /// failures surface as errors.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Completion`] when the completion service
    /// fails.
    pub async fn run<C: CompletionService>(
        &self,
        service: &C,
        patch: &str,
        context: Option<&str>,
    ) -> Result<Vec<ReviewFinding>, KestrelError> {
        let raw = service.complete(self.conversation(patch, context)).await?;
        Ok(parse_findings(&raw, self.id))
    }
}

/// The default reviewer lineup, in fixed order.
///
/// # Examples
///
/// ```
/// use kestrel_core::RoleId;
/// use kestrel_review::roles::default_roles;
///
/// let roles = default_roles();
/// assert_eq!(roles[0].id(), RoleId::Syntax);
/// assert_eq!(roles.len(), 3);
/// ```
pub fn default_roles() -> Vec<ReviewerRole> {
    RoleId::ALL.into_iter().map(ReviewerRole::new).collect()
}

/// Strip markdown code fences from a model response.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a role's raw response into findings.
///
/// Unparsable output is a model quality problem, not a pipeline failure:
/// it yields an empty finding list and a stderr warning. Findings with an
/// empty category fall back to the role name.
pub fn parse_findings(raw: &str, role: RoleId) -> Vec<ReviewFinding> {
    let cleaned = strip_code_fences(raw);
    let payload: FindingsPayload = match serde_json::from_str(cleaned) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("warning: {role} reviewer returned unparsable findings ({e}); treating as empty");
            return Vec::new();
        }
    };
    payload
        .findings
        .into_iter()
        .filter(|f| !f.suggestion.trim().is_empty())
        .map(|mut f| {
            if f.kind.trim().is_empty() {
                f.kind = role.to_string();
            }
            f
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_findings() {
        let raw = r#"{"findings":[{"type":"performance","suggestion":"cache the regex"}]}"#;
        let findings = parse_findings(raw, RoleId::Syntax);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "performance");
        assert_eq!(findings[0].suggestion, "cache the regex");
    }

    #[test]
    fn unparsable_response_is_empty_not_error() {
        let findings = parse_findings("Sure! Here are my thoughts...", RoleId::Style);
        assert!(findings.is_empty());
    }

    #[test]
    fn empty_findings_list_is_valid() {
        let findings = parse_findings(r#"{"findings":[]}"#, RoleId::Dependency);
        assert!(findings.is_empty());
    }

    #[test]
    fn missing_findings_key_is_empty() {
        let findings = parse_findings("{}", RoleId::Dependency);
        assert!(findings.is_empty());
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"findings\":[{\"type\":\"style\",\"suggestion\":\"rename x\"}]}\n```";
        let findings = parse_findings(raw, RoleId::Style);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion, "rename x");
    }

    #[test]
    fn empty_category_falls_back_to_role_name() {
        let raw = r#"{"findings":[{"type":"","suggestion":"split this function"}]}"#;
        let findings = parse_findings(raw, RoleId::Dependency);
        assert_eq!(findings[0].kind, "dependency");
    }

    #[test]
    fn blank_suggestions_are_dropped() {
        let raw = r#"{"findings":[{"type":"style","suggestion":"  "},{"type":"style","suggestion":"real one"}]}"#;
        let findings = parse_findings(raw, RoleId::Style);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion, "real one");
    }

    #[test]
    fn role_conversations_use_distinct_prompts() {
        let roles = default_roles();
        let prompts: Vec<&str> = roles.iter().map(|r| r.system_prompt()).collect();
        assert_ne!(prompts[0], prompts[1]);
        assert_ne!(prompts[1], prompts[2]);
    }

    #[test]
    fn strip_fences_handles_plain_text() {
        assert_eq!(strip_code_fences("  plain  "), "plain");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
    }
}
