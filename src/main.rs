use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};

use kestrel_core::{CompletionConfig, KestrelConfig, OutputFormat};
use kestrel_review::completion::CompletionClient;
use kestrel_review::pipeline::ReviewPipeline;
use kestrel_review::prompt::PromptKind;

#[derive(Parser)]
#[command(
    name = "kestrel",
    version,
    about = "Multi-role AI pull request reviewer",
    long_about = "Kestrel reviews pull request diffs with independent AI reviewer roles\n\
                   (syntax, dependency, style) and merges their findings into one report.\n\n\
                   Examples:\n  \
                     git diff main | kestrel review      Review a diff from stdin\n  \
                     kestrel review --pr owner/repo#1    Review a GitHub pull request\n  \
                     git diff | kestrel number           Print a line-numbered diff\n  \
                     kestrel context --vector-file q.json  Query the similarity store"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .kestrel.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "xml",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         xml   The structured review document (default)\n  \
                         json  Machine-readable JSON"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a multi-role AI review over a diff
    #[command(long_about = "Run a multi-role AI review over a diff.\n\n\
        Accepts diffs from stdin, a file, or a GitHub PR. Each changed file is\n\
        reviewed independently by the syntax, dependency, and style roles; their\n\
        findings are merged per file into one report. Files whose prompt would\n\
        exceed the model's context window are reported as failures without any\n\
        completion call.\n\n\
        Examples:\n  git diff main | kestrel review\n  kestrel review --pr owner/repo#123 --post\n  kestrel review --file changes.patch --single-shot")]
    Review {
        /// GitHub PR to review (format: owner/repo#123)
        #[arg(
            long,
            long_help = "GitHub PR to review.\n\nFormat: owner/repo#123\nPosting requires the GITHUB_TOKEN env var."
        )]
        pr: Option<String>,
        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Override the configured completion model
        #[arg(long)]
        model: Option<String>,
        /// Post the finished report as a PR comment (requires --pr)
        #[arg(long)]
        post: bool,
        /// Review the whole diff in one completion call instead of per file
        #[arg(
            long,
            long_help = "Review the whole diff with a single completion call.\n\n\
                The model's raw answer is printed as-is: free-form text with\n\
                --format json suppressed, XML-tagged suggestions with the\n\
                default xml format."
        )]
        single_shot: bool,
    },
    /// Print a diff with new-file line numbers assigned
    #[command(long_about = "Print a diff with new-file line numbers assigned.\n\n\
        Splits the input into per-file patches, keeps hunk headers verbatim,\n\
        drops removed lines, and prefixes every surviving line with its line\n\
        number in the new file.\n\n\
        Examples:\n  git diff | kestrel number\n  kestrel number --file changes.patch")]
    Number {
        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Query the vector similarity store for related code context
    #[command(long_about = "Query the vector similarity store for related code context.\n\n\
        Reads a query embedding (a JSON array of numbers) from a file and\n\
        returns the nearest stored chunks. Requires [vector] base_url in the\n\
        config or the VECTOR_API_KEY env var for authenticated stores.\n\n\
        Examples:\n  kestrel context --vector-file query.json\n  kestrel context --vector-file query.json --top-k 3 --namespace docs")]
    Context {
        /// File holding the query embedding as a JSON array of numbers
        #[arg(long)]
        vector_file: PathBuf,
        /// Maximum matches to return (default: from config)
        #[arg(long)]
        top_k: Option<usize>,
        /// Namespace to query (default: from config)
        #[arg(long)]
        namespace: Option<String>,
        /// Metadata filter as a JSON object
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create a default .kestrel.toml configuration file
    #[command(long_about = "Create a default .kestrel.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .kestrel.toml already exists.")]
    Init,
}

fn read_diff_input(file: &Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

/// Resolve the completion config with CLI overrides and env-var API key
/// fallback, failing with a hint when no key is available.
fn resolve_completion_config(
    config: &KestrelConfig,
    model: Option<&str>,
) -> Result<CompletionConfig> {
    let mut completion = config.completion.clone();
    if let Some(model) = model {
        completion.model = model.to_string();
    }

    let env_var = match completion.provider.as_str() {
        "groq" => "GROQ_API_KEY",
        _ => "OPENAI_API_KEY",
    };
    if completion.api_key.is_none() {
        match std::env::var(env_var) {
            Ok(key) => completion.api_key = Some(key),
            Err(_) => {
                // A custom base_url usually means a local endpoint with no key.
                if completion.base_url.is_none() {
                    miette::bail!(miette::miette!(
                        help = "Set {env_var} or add api_key in your .kestrel.toml under [completion]",
                        "No API key configured for completion provider '{}'",
                        completion.provider
                    ));
                }
            }
        }
    }
    Ok(completion)
}

const DEFAULT_CONFIG: &str = r#"# Kestrel Configuration
# See: https://github.com/kestrel-rs/kestrel

[completion]
# OpenAI-compatible chat completions endpoint
# provider = "groq"
# model = "llama3-70b-8192"
# base_url = "http://localhost:11434"

[review]
# Unchanged source lines to interleave around each hunk when file
# contents are available
# context_lines = 3
# Similarity matches to retrieve per query
# top_k = 5

[vector]
# base_url = "https://my-index.svc.pinecone.io"
# namespace = "code-context"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => KestrelConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".kestrel.toml");
            if default_path.exists() {
                KestrelConfig::from_file(default_path)?
            } else {
                KestrelConfig::default()
            }
        }
    };

    match cli.command {
        None => {
            let version = env!("CARGO_PKG_VERSION");
            println!("kestrel v{version} — multi-role AI pull request review\n");
            println!("Quick start:");
            println!("  kestrel init                  Create a .kestrel.toml config file");
            println!("  git diff | kestrel review     Review your latest changes with AI");
            println!("  git diff | kestrel number     Print a line-numbered diff\n");
            println!("All commands:");
            println!("  review    Multi-role AI review (stdin, file, or GitHub PR)");
            println!("  number    Assign new-file line numbers to a diff");
            println!("  context   Query the vector similarity store");
            println!("  init      Create default configuration\n");
            println!("Run 'kestrel <command> --help' for details.");
        }
        Some(Command::Review {
            ref pr,
            ref file,
            ref model,
            post,
            single_shot,
        }) => {
            let files = if let Some(pr_ref) = pr {
                let (owner, repo, number) = kestrel_review::github::parse_pr_reference(pr_ref)?;
                let github = kestrel_review::github::GitHubClient::new(None)?;
                github.get_pr_files(&owner, &repo, number).await?
            } else {
                let input = read_diff_input(file)?;
                if input.trim().is_empty() {
                    miette::bail!(miette::miette!(
                        help = "Pipe a diff to kestrel, e.g.: git diff | kestrel review\n       Or use --file <path> or --pr owner/repo#123",
                        "Empty diff input"
                    ));
                }
                kestrel_diff::splitter::split_unified_diff(&input)
            };

            if files.is_empty() {
                miette::bail!("no reviewable files in the diff");
            }
            if cli.verbose {
                eprintln!(
                    "Reviewing {} file(s) with model {}",
                    files.len(),
                    model.as_deref().unwrap_or(config.completion.model.as_str())
                );
            }

            let completion = resolve_completion_config(&config, model.as_deref())?;
            let client = CompletionClient::new(&completion)?;
            let pipeline = ReviewPipeline::new(client, config.review.clone());

            if single_shot {
                let kind = match cli.format {
                    OutputFormat::Xml => PromptKind::XmlStructured,
                    OutputFormat::Json => PromptKind::GenericDiff,
                };
                let text = pipeline.review_single_shot(&files, kind).await?;
                println!("{text}");
                return Ok(());
            }

            let batch = pipeline.review_files(&files).await?;

            for failure in &batch.failures {
                match failure.role {
                    Some(role) => eprintln!(
                        "warning: {} not reviewed ({role} role failed: {})",
                        failure.filename, failure.error
                    ),
                    None => eprintln!(
                        "warning: {} not reviewed ({})",
                        failure.filename, failure.error
                    ),
                }
            }

            let report = match cli.format {
                OutputFormat::Xml => batch.to_xml()?,
                OutputFormat::Json => serde_json::to_string_pretty(&batch).into_diagnostic()?,
            };
            println!("{report}");

            if post {
                let Some(pr_ref) = pr else {
                    miette::bail!("--post requires --pr");
                };
                let (owner, repo, number) = kestrel_review::github::parse_pr_reference(pr_ref)?;
                let github = kestrel_review::github::GitHubClient::new(None)?;
                let comment = format!("## Kestrel review\n\n```xml\n{}\n```", batch.to_xml()?);
                github
                    .post_review_comment(&owner, &repo, number, &comment)
                    .await?;
                eprintln!(
                    "Posted review of {} file(s) to {pr_ref}",
                    batch.reviews.len()
                );
            }
        }
        Some(Command::Number { ref file }) => {
            let input = read_diff_input(file)?;
            if input.trim().is_empty() {
                miette::bail!(miette::miette!(
                    help = "Pipe a diff to kestrel, e.g.: git diff | kestrel number",
                    "Empty diff input"
                ));
            }

            let files = kestrel_diff::splitter::split_unified_diff(&input);
            if files.is_empty() {
                miette::bail!("no diffable files in the input");
            }

            let mut rendered = Vec::with_capacity(files.len());
            for file in &files {
                rendered.push(kestrel_review::pipeline::render_numbered_patch(
                    file,
                    config.review.context_lines,
                )?);
            }
            println!("{}", rendered.join("\n"));
        }
        Some(Command::Context {
            ref vector_file,
            top_k,
            ref namespace,
            ref filter,
        }) => {
            let raw = std::fs::read_to_string(vector_file)
                .into_diagnostic()
                .wrap_err(format!("reading {}", vector_file.display()))?;
            let vector: Vec<f32> = serde_json::from_str(&raw)
                .into_diagnostic()
                .wrap_err("query embedding must be a JSON array of numbers")?;

            let filter: Option<serde_json::Value> = match filter {
                Some(text) => Some(
                    serde_json::from_str(text)
                        .into_diagnostic()
                        .wrap_err("--filter must be a JSON object")?,
                ),
                None => None,
            };

            let store = kestrel_context::VectorStoreClient::new(&config.vector)?;
            let namespace = namespace.as_deref().unwrap_or(config.vector.namespace.as_str());
            let matches = store
                .query(
                    namespace,
                    &vector,
                    top_k.unwrap_or(config.review.top_k),
                    filter,
                )
                .await?;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&matches).into_diagnostic()?
                    );
                }
                OutputFormat::Xml => match kestrel_context::context_from_matches(&matches) {
                    Some(context) => println!("{context}"),
                    None => println!("No matching context found."),
                },
            }
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".kestrel.toml");
            if path.exists() {
                miette::bail!(".kestrel.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .kestrel.toml with default configuration");
        }
    }

    Ok(())
}
