//! Token budget estimation and gating.
//!
//! Estimation is a deliberate approximation: one token per four bytes of
//! UTF-8, rounded up, plus a fixed per-message framing overhead. The point
//! is a stable, deterministic gate that errs on the side of refusing
//! oversized conversations before any network call is made, not exact
//! tokenizer parity with any one provider.

use kestrel_core::KestrelError;

use crate::completion::ChatMessage;

/// Fixed framing overhead charged per message, covering role tags and
/// delimiters the provider adds around each message.
const MESSAGE_OVERHEAD: usize = 4;

/// Context window sizes for known models, in tokens.
const MODEL_LIMITS: &[(&str, usize)] = &[
    ("mixtral-8x7b-32768", 32768),
    ("gemma-7b-it", 32768),
    ("llama3-70b-8192", 8192),
    ("llama3-8b-8192", 8192),
    ("gpt-3.5-turbo", 16385),
    ("gpt-4o", 128000),
    ("gpt-4o-mini", 128000),
];

/// Return the context window size for a model.
///
/// # Errors
///
/// Returns [`KestrelError::Config`] for a model not in the table, so an
/// unknown model is a configuration problem, never a silently unbounded
/// prompt.
///
/// # Examples
///
/// ```
/// use kestrel_review::budget::model_limit;
///
/// assert_eq!(model_limit("llama3-70b-8192").unwrap(), 8192);
/// assert!(model_limit("unknown-model").is_err());
/// ```
pub fn model_limit(model: &str) -> Result<usize, KestrelError> {
    MODEL_LIMITS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, limit)| *limit)
        .ok_or_else(|| KestrelError::Config(format!("unknown model for token limit: {model}")))
}

/// Estimate the token count of a piece of text.
///
/// Approximation: `ceil(bytes / 4)`. Real tokenizers vary by model; four
/// bytes per token is a conservative average for code-heavy English text.
///
/// # Examples
///
/// ```
/// use kestrel_review::budget::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcd"), 1);
/// assert_eq!(estimate_tokens("abcde"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate the total token count of a conversation, including per-message
/// framing overhead.
pub fn conversation_tokens(messages: &[ChatMessage]) -> usize {
    messages
        .iter()
        .map(|m| estimate_tokens(&m.content) + MESSAGE_OVERHEAD)
        .sum()
}

/// Check whether a conversation fits the model's context window.
///
/// The comparison is strict: a conversation estimated at exactly the
/// window size does not fit, leaving no room for the reply.
///
/// # Errors
///
/// Returns [`KestrelError::Config`] for a model with no known limit.
pub fn conversation_within_limit(
    messages: &[ChatMessage],
    model: &str,
) -> Result<bool, KestrelError> {
    let limit = model_limit(model)?;
    Ok(conversation_tokens(messages) < limit)
}
