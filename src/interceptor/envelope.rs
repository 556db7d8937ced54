//! Directive envelope
//!
//! The single string the review engine consumes: a comment-embedded
//! parameter block, the begin marker, the statement body and the commit
//! marker. The body is copied verbatim.

use serde::{Deserialize, Serialize};

use crate::vault::credentials::TargetDatabase;

pub const BEGIN_MARKER: &str = "inception_magic_start;";
pub const COMMIT_MARKER: &str = "inception_magic_commit;";

/// Which directive flags the envelope carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeMode {
    /// Check only, nothing is executed
    Review,
    /// First split pass: the engine returns the batch re-split the way it
    /// would execute it (each piece prefixed with a database selection)
    SplitDiscovery,
    /// Second split pass: check one re-split piece
    SplitReview,
}

impl EnvelopeMode {
    pub fn flags(&self) -> &'static str {
        match self {
            Self::Review => "--enable-check=1;",
            Self::SplitDiscovery => "--enable-execute;--enable-ignore-warnings;--enable-split;",
            Self::SplitReview => "--enable-check;--enable-ignore-warnings;",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::SplitDiscovery => "split_discovery",
            Self::SplitReview => "split_review",
        }
    }
}

/// Builds the envelope for `body` against `target`.
///
/// A `;` is added after the body only when it does not already end with one,
/// so the commit marker always starts a new statement.
pub fn build_envelope(target: &TargetDatabase, mode: EnvelopeMode, body: &str) -> String {
    let terminator = if body.trim_end().ends_with(';') { "" } else { ";" };

    format!(
        "/*--user={};--password={};--host={};--port={};{}*/\n{}\n{}{}\n{}",
        target.username,
        target.password.expose(),
        target.host,
        target.port,
        mode.flags(),
        BEGIN_MARKER,
        body,
        terminator,
        COMMIT_MARKER,
    )
}
