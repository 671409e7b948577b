use regex::Regex;
use std::fmt;

/// Redacts GitHub credentials from text before it is logged or put into an
/// error message.
#[derive(Clone)]
pub struct SecretScrubber {
    github_token_pattern: Regex,
    bearer_pattern: Regex,
    field_pattern: Regex,
}

impl SecretScrubber {
    /// Create a scrubber.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Classic and fine-grained GitHub tokens: ghp_..., gho_..., github_pat_...
            github_token_pattern: Regex::new(
                r"\b(?:gh[pousr]_[A-Za-z0-9]{20,}|github_pat_[A-Za-z0-9_]{20,})\b",
            )?,
            // Authorization header values
            bearer_pattern: Regex::new(r"(?i)\b(bearer|token)\s+[A-Za-z0-9\-_\.=]{8,}")?,
            // token/secret/password fields in JSON or key=value text
            field_pattern: Regex::new(
                r#"(?i)["']?(token|secret|password|client_secret)["']?\s*([:=])\s*["']?[^"'\s,}]+["']?"#,
            )?,
        })
    }

    /// Scrub a message of credentials
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .github_token_pattern
            .replace_all(message, "[TOKEN_REDACTED]");
        let scrubbed = self
            .bearer_pattern
            .replace_all(&scrubbed, "$1 [TOKEN_REDACTED]");
        self.field_pattern
            .replace_all(&scrubbed, "$1$2[REDACTED]")
            .into_owned()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}
