//! A minimal cartfile tokeniser, in scope only as a way to build
//! `Dependency`/`VersionSpecifier` fixtures for tests from a short textual
//! form (spec §1's Non-goals explicitly exclude a full cartfile parser).
//!
//! Supported lines:
//!
//! ```text
//! github "owner/repo"
//! github "owner/repo" ~> 1.2.0
//! github "owner/repo" == 1.2.0
//! github "owner/repo" >= 1.2.0
//! github "owner/repo" "some-branch-or-tag"
//! git "https://example.com/x.git" ~> 1.0.0
//! binary "https://example.com/x.json" ~> 1.0.0
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::dependency::{Dependency, SourceKind};
use crate::semantic_version::SemanticVersion;
use crate::version_specifier::VersionSpecifier;

/// A single parsed cartfile line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartfileEntry {
    pub dependency: Dependency,
    pub specifier: VersionSpecifier,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartfileParseError {
    #[error("line {line}: unrecognized origin keyword {keyword:?}, expected github/git/binary")]
    UnknownOrigin { line: usize, keyword: String },
    #[error("line {line}: missing quoted source after origin keyword")]
    MissingSource { line: usize },
    #[error("line {line}: malformed github source {source:?}, expected \"owner/repo\"")]
    MalformedGitHubSource { line: usize, source: String },
    #[error("line {line}: unrecognized constraint operator {operator:?}")]
    UnknownOperator { line: usize, operator: String },
    #[error("line {line}: invalid semantic version: {0}", .source)]
    InvalidVersion { line: usize, source: String },
}

/// Parses a whole cartfile's text into its entries, in source order.
pub fn parse(text: &str) -> Result<Vec<CartfileEntry>, CartfileParseError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| parse_line(line_no, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Result<CartfileEntry, CartfileParseError> {
    let tokens = tokenize(line);
    let mut tokens = tokens.into_iter();

    let keyword = tokens.next().unwrap_or_default();
    let source = tokens.next().ok_or(CartfileParseError::MissingSource { line: line_no })?;

    let dependency = match keyword.as_str() {
        "github" => {
            let (owner, repo) = source.split_once('/').ok_or_else(|| CartfileParseError::MalformedGitHubSource {
                line: line_no,
                source: source.clone(),
            })?;
            Dependency::github(owner, repo)
        }
        "git" => Dependency::git(source.clone(), derive_name(&source)),
        "binary" => Dependency::binary(source.clone(), derive_name(&source)),
        other => {
            return Err(CartfileParseError::UnknownOrigin {
                line: line_no,
                keyword: other.to_string(),
            });
        }
    };

    let specifier = match (tokens.next(), tokens.next()) {
        (None, _) => VersionSpecifier::Any,
        (Some(quoted), None) if !is_operator(&quoted) => VersionSpecifier::GitReference(quoted),
        (Some(operator), Some(version)) => {
            let version = SemanticVersion::parse(&version).map_err(|e| CartfileParseError::InvalidVersion {
                line: line_no,
                source: e.to_string(),
            })?;
            match operator.as_str() {
                "==" => VersionSpecifier::Exactly(version),
                ">=" => VersionSpecifier::AtLeast(version),
                "~>" => VersionSpecifier::CompatibleWith(version),
                other => {
                    return Err(CartfileParseError::UnknownOperator {
                        line: line_no,
                        operator: other.to_string(),
                    });
                }
            }
        }
        (Some(token), None) => {
            return Err(CartfileParseError::UnknownOperator { line: line_no, operator: token });
        }
    };

    Ok(CartfileEntry { dependency, specifier })
}

fn is_operator(token: &str) -> bool {
    matches!(token, "==" | ">=" | "~>")
}

fn derive_name(source: &str) -> String {
    source.rsplit('/').next().unwrap_or(source).trim_end_matches(".git").to_string()
}

/// Splits a cartfile line into tokens, honoring double-quoted strings as a
/// single token with the quotes stripped.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut buf = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                buf.push(c);
            }
            tokens.push(buf);
        } else {
            let mut buf = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                buf.push(c);
                chars.next();
            }
            tokens.push(buf);
        }
    }

    tokens
}
