use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One file's change in a pull request.
///
/// Supplied per review invocation and never mutated by the pipeline. The
/// `patch` field holds unified-diff text as produced by the GitHub API
/// (hunk headers only, no `---`/`+++` file header lines).
///
/// # Examples
///
/// ```
/// use kestrel_core::PrFile;
///
/// let file = PrFile {
///     filename: "src/auth.py".into(),
///     patch: "@@ -1,2 +1,2 @@\n-old\n+new\n unchanged".into(),
///     old_contents: None,
///     new_contents: None,
/// };
/// assert!(file.old_contents.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFile {
    /// Path of the file within the repository.
    pub filename: String,
    /// Unified-diff text for this file's change.
    pub patch: String,
    /// Full contents of the file before the change, when available.
    pub old_contents: Option<String>,
    /// Full contents of the file after the change, when available.
    pub new_contents: Option<String>,
}

/// An independent review perspective applied to the same input.
///
/// Roles are order-insensitive for correctness, but the declared order here
/// (syntax, dependency, style) fixes the merge order of their findings.
///
/// # Examples
///
/// ```
/// use kestrel_core::RoleId;
///
/// assert_eq!(RoleId::Dependency.to_string(), "dependency");
/// assert_eq!("style".parse::<RoleId>().unwrap(), RoleId::Style);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleId {
    /// Syntax and logical consistency.
    Syntax,
    /// Dependency and modularity issues.
    Dependency,
    /// Readability and maintainability.
    Style,
}

impl RoleId {
    /// All roles in their fixed merge order.
    pub const ALL: [RoleId; 3] = [RoleId::Syntax, RoleId::Dependency, RoleId::Style];
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleId::Syntax => write!(f, "syntax"),
            RoleId::Dependency => write!(f, "dependency"),
            RoleId::Style => write!(f, "style"),
        }
    }
}

impl FromStr for RoleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "syntax" => Ok(RoleId::Syntax),
            "dependency" => Ok(RoleId::Dependency),
            "style" => Ok(RoleId::Style),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One structured suggestion produced by a role for a file.
///
/// # Examples
///
/// ```
/// use kestrel_core::ReviewFinding;
///
/// let finding = ReviewFinding {
///     kind: "security".into(),
///     suggestion: "Parameterize this SQL query".into(),
/// };
/// let json = serde_json::to_value(&finding).unwrap();
/// assert_eq!(json["type"], "security");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFinding {
    /// Category tag, e.g. "performance", "security", "style".
    #[serde(rename = "type")]
    pub kind: String,
    /// The suggestion text.
    pub suggestion: String,
}

/// All findings for one input file, merged across roles.
///
/// The `filename` corresponds exactly to an input [`PrFile`]; findings are
/// ordered by role-execution order (syntax, dependency, style).
///
/// # Examples
///
/// ```
/// use kestrel_core::{FileReview, ReviewFinding};
///
/// let review = FileReview {
///     filename: "foo.py".into(),
///     reviews: vec![ReviewFinding {
///         kind: "dependency".into(),
///         suggestion: "remove unused import X".into(),
///     }],
/// };
/// assert_eq!(review.reviews.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReview {
    /// Path of the reviewed file.
    pub filename: String,
    /// Ordered findings for this file.
    pub reviews: Vec<ReviewFinding>,
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use kestrel_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The structured review document (default).
    #[default]
    Xml,
    /// Machine-readable JSON.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xml => write!(f, "xml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(OutputFormat::Xml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_id_display_and_parse() {
        for role in RoleId::ALL {
            let round: RoleId = role.to_string().parse().unwrap();
            assert_eq!(round, role);
        }
        assert!("arbiter".parse::<RoleId>().is_err());
    }

    #[test]
    fn role_order_is_fixed() {
        assert_eq!(
            RoleId::ALL,
            [RoleId::Syntax, RoleId::Dependency, RoleId::Style]
        );
    }

    #[test]
    fn finding_serializes_kind_as_type() {
        let finding = ReviewFinding {
            kind: "performance".into(),
            suggestion: "cache this lookup".into(),
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "performance");
        assert!(json.get("kind").is_none());

        let back: ReviewFinding =
            serde_json::from_str(r#"{"type":"style","suggestion":"rename x"}"#).unwrap();
        assert_eq!(back.kind, "style");
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("xml".parse::<OutputFormat>().unwrap(), OutputFormat::Xml);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_xml() {
        assert_eq!(OutputFormat::default(), OutputFormat::Xml);
    }
}
