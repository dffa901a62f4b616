//! Static instruction templates and conversation assembly.
//!
//! Templates are pure static text keyed by prompt kind; nothing mutates
//! them at runtime. A conversation is always one system message carrying
//! the template, followed by one user message carrying the diff (and the
//! retrieved context, when present).

use kestrel_core::RoleId;

use crate::completion::{ChatMessage, Role};

/// Which fixed instruction template a conversation is built from.
///
/// # Examples
///
/// ```
/// use kestrel_core::RoleId;
/// use kestrel_review::prompt::PromptKind;
///
/// assert_eq!(PromptKind::from(RoleId::Style), PromptKind::Style);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Syntax, logic, and functionality review.
    Syntax,
    /// Dependency and modularity review.
    Dependency,
    /// Readability and style review.
    Style,
    /// Single-shot free-form review of a whole diff.
    GenericDiff,
    /// Single-shot review with XML-tagged output.
    XmlStructured,
}

impl From<RoleId> for PromptKind {
    fn from(role: RoleId) -> Self {
        match role {
            RoleId::Syntax => PromptKind::Syntax,
            RoleId::Dependency => PromptKind::Dependency,
            RoleId::Style => PromptKind::Style,
        }
    }
}

const SYNTAX_PROMPT: &str = r#"You are PR-Reviewer, a language model that reviews git pull requests with a focus on syntax, logical correctness, and functionality.
Provide constructive and concise feedback for the new code added in the PR (lines starting with '+').

Example PR diff input:
'
## src/file1.py

@@ -12,5 +12,5 @@ def func1():
code line that already existed in the file...
-code line that was removed in the PR
+new code line added in the PR
code line that already existed in the file...
'

Focus on:
- Syntax: errors or inconsistencies in the new code.
- Logic: flaws and edge cases that may break the code.
- Functionality: whether the new code does what it is intended to do.

Avoid:
- Suggesting changes to code that was not modified in the PR.
- Comments unrelated to syntax, logic, or functionality.
- Repeating suggestions already implemented in the PR.

Respond with a JSON object:
{
  "findings": [
    { "type": "category such as performance, security, style", "suggestion": "one actionable suggestion" }
  ]
}

If you have no suggestions, return: { "findings": [] }"#;

const DEPENDENCY_PROMPT: &str = r#"You are PR-Reviewer, a language model that reviews git pull requests with a focus on dependencies and modularity.
Provide constructive and concise feedback on the use of external libraries and module boundaries in the PR.

Example PR diff input:
'
## src/file1.py

@@ -12,5 +12,5 @@ def func1():
-import old_dependency
+import new_dependency
...
'

Focus on:
- Outdated or insecure libraries; suggest alternatives.
- Redundant or unnecessary imports.
- Better-suited libraries or functions for the code at hand.
- Whether newly added dependencies are appropriate and well integrated.

Avoid:
- General code improvements unrelated to dependencies.
- Comments on lines not modified in the PR.

Respond with a JSON object:
{
  "findings": [
    { "type": "category such as performance, security, style", "suggestion": "one actionable suggestion" }
  ]
}

If you have no suggestions, return: { "findings": [] }"#;

const STYLE_PROMPT: &str = r#"You are PR-Reviewer, a language model that reviews git pull requests with a focus on readability and maintainability.
Provide constructive and concise feedback for improving the readability of the new code added in the PR (lines starting with '+').

Example PR diff input:
'
## src/file1.py

@@ -12,5 +12,5 @@ def func1():
code line that already existed in the file...
-code line that was removed in the PR
+new code line added in the PR
code line that already existed in the file...
'

Focus on:
- Code formatting and consistency.
- Naming conventions and clarity.
- Logical flow and ease of understanding.

Avoid:
- Suggesting changes to code that was not modified in the PR.
- Comments unrelated to readability or maintainability.

Respond with a JSON object:
{
  "findings": [
    { "type": "category such as performance, security, style", "suggestion": "one actionable suggestion" }
  ]
}

If you have no suggestions, return: { "findings": [] }"#;

const GENERIC_DIFF_PROMPT: &str = r#"You are PR-Reviewer, a language model designed to review git pull requests.
Your task is to provide constructive and concise feedback for the PR, and also provide meaningful code suggestions.

Example PR diff input:
'
## src/file1.py

@@ -12,5 +12,5 @@ def func1():
code line that already existed in the file...
-code line that was removed in the PR
+new code line added in the PR
code line that already existed in the file...

@@ ... @@ def func2():
...

## src/file2.py
...
'

The review should focus on new code added in the PR (lines starting with '+'), not on code that already existed in the file (lines starting with '-', or without prefix).

- ONLY PROVIDE CODE SUGGESTIONS
- Focus on important suggestions like fixing code problems, improving performance, improving security, improving readability
- Avoid making suggestions that have already been implemented in the PR code
- Don't suggest adding docstrings, type hints, or comments
- Do not say things like "without seeing the full repo" or "the rest of the codebase" - comment only on the code you have

Make sure the provided code suggestions are in the same programming language as the PR.

Don't repeat the prompt in the answer."#;

const XML_STRUCTURED_PROMPT: &str = r#"As PR-Reviewer, analyze the git pull request across any programming language and provide precise code enhancements. Keep your focus on the new code modifications indicated by '+' lines in the PR. Hunt for code issues, opportunities for performance enhancement, security improvements, and ways to increase readability.

Ensure your suggestions are novel and haven't already been incorporated in the '+' lines of the PR code. Refrain from proposing enhancements that add docstrings, type hints, or comments. Your recommendations should strictly target the '+' lines without requiring context beyond the diff.

Represent your suggestions in XML using the tags: <review>, <suggestion>, <describe>, <type>, <comment>, <code>, <filename>. All suggestions reside within one <review> tag. Code snippets use valid GitHub Markdown syntax enclosed within backticks, identifying the language they are written in.

Example output:
<review>
  <suggestion>
    <describe>[objective of the newly incorporated code]</describe>
    <type>[category such as performance, security, readability]</type>
    <comment>[guidance on enhancing the new code]</comment>
    <code>```[language]
[suggested code amendment]
```</code>
    <filename>[name of the relevant file]</filename>
  </suggestion>
</review>"#;

/// Return the fixed instruction template for a prompt kind.
///
/// # Examples
///
/// ```
/// use kestrel_review::prompt::{template, PromptKind};
///
/// assert!(template(PromptKind::Dependency).contains("dependencies"));
/// ```
pub fn template(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Syntax => SYNTAX_PROMPT,
        PromptKind::Dependency => DEPENDENCY_PROMPT,
        PromptKind::Style => STYLE_PROMPT,
        PromptKind::GenericDiff => GENERIC_DIFF_PROMPT,
        PromptKind::XmlStructured => XML_STRUCTURED_PROMPT,
    }
}

/// Assemble an ordered conversation: system template first, then one user
/// message with the diff and optional retrieved context.
///
/// # Examples
///
/// ```
/// use kestrel_review::completion::Role;
/// use kestrel_review::prompt::{build_conversation, PromptKind};
///
/// let convo = build_conversation(PromptKind::Syntax, "## a.rs\n\n@@ -1,1 +1,1 @@\n+x", None);
/// assert_eq!(convo.len(), 2);
/// assert!(matches!(convo[0].role, Role::System));
/// assert!(convo[1].content.contains("+x"));
/// ```
pub fn build_conversation(
    kind: PromptKind,
    diff: &str,
    context: Option<&str>,
) -> Vec<ChatMessage> {
    let user_content = match context {
        Some(ctx) => format!("Relevant context:\n{ctx}\n\nPR Diff:\n{diff}"),
        None => format!("PR Diff:\n{diff}"),
    };

    vec![
        ChatMessage {
            role: Role::System,
            content: template(kind).to_string(),
        },
        ChatMessage {
            role: Role::User,
            content: user_content,
        },
    ]
}

/// Join per-file rendered patches into one diff blob for single-shot mode.
///
/// Each rendered patch already carries its own `## filename` header, so a
/// plain newline join keeps the file boundaries visible.
///
/// # Examples
///
/// ```
/// use kestrel_review::prompt::build_diff_blob;
///
/// let blob = build_diff_blob(&["## a.rs\n\n+x".into(), "## b.rs\n\n+y".into()]);
/// assert_eq!(blob, "## a.rs\n\n+x\n## b.rs\n\n+y");
/// ```
pub fn build_diff_blob(patches: &[String]) -> String {
    patches.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_distinct() {
        let kinds = [
            PromptKind::Syntax,
            PromptKind::Dependency,
            PromptKind::Style,
            PromptKind::GenericDiff,
            PromptKind::XmlStructured,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(template(*a), template(*b));
            }
        }
    }

    #[test]
    fn role_templates_demand_json_findings() {
        for role in RoleId::ALL {
            let text = template(PromptKind::from(role));
            assert!(text.contains("\"findings\""), "{role} template lacks findings format");
        }
    }

    #[test]
    fn conversation_order_is_system_then_user() {
        let convo = build_conversation(PromptKind::Style, "diff body", None);
        assert_eq!(convo.len(), 2);
        assert!(matches!(convo[0].role, Role::System));
        assert!(matches!(convo[1].role, Role::User));
        assert!(convo[1].content.ends_with("diff body"));
    }

    #[test]
    fn context_precedes_diff_in_user_message() {
        let convo = build_conversation(PromptKind::Syntax, "the diff", Some("the context"));
        let user = &convo[1].content;
        let ctx_pos = user.find("the context").unwrap();
        let diff_pos = user.find("the diff").unwrap();
        assert!(ctx_pos < diff_pos);
    }

    #[test]
    fn blob_joins_with_newline() {
        let blob = build_diff_blob(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(blob, "a\nb\nc");
    }

    #[test]
    fn blob_of_one_is_identity() {
        assert_eq!(build_diff_blob(&["only".into()]), "only");
    }
}
