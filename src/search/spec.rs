use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::util::normalize_text;

/// Reported kind for every [`SpecError`]
pub const INVALID_SPECIFICATION: &str = "invalid_specification";

/// A search request that cannot be run. Raised before any feed is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("invalid search specification: unknown field '{0}' (expected title, description or both)")]
    UnknownField(String),
    #[error("invalid search specification: unknown mode '{0}' (expected any or all)")]
    UnknownMode(String),
    #[error("invalid search specification: max_results must not be negative (got {0})")]
    NegativeMaxResults(i64),
}

impl SpecError {
    pub fn kind(&self) -> &'static str {
        INVALID_SPECIFICATION
    }
}

// ============================================================================
// Field selector / match mode
// ============================================================================

/// Which entry fields keywords are looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSelector {
    Title,
    Description,
    #[default]
    Both,
}

impl FieldSelector {
    pub fn includes_title(self) -> bool {
        matches!(self, FieldSelector::Title | FieldSelector::Both)
    }

    pub fn includes_description(self) -> bool {
        matches!(self, FieldSelector::Description | FieldSelector::Both)
    }
}

impl FromStr for FieldSelector {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(FieldSelector::Title),
            // RSS calls it description, Atom calls it summary
            "description" | "summary" => Ok(FieldSelector::Description),
            "both" => Ok(FieldSelector::Both),
            _ => Err(SpecError::UnknownField(s.to_string())),
        }
    }
}

impl std::fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldSelector::Title => "title",
            FieldSelector::Description => "description",
            FieldSelector::Both => "both",
        })
    }
}

/// How multiple keywords combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one keyword must be found
    #[default]
    Any,
    /// Every keyword must be found
    All,
}

impl FromStr for MatchMode {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            _ => Err(SpecError::UnknownMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
        })
    }
}

// ============================================================================
// Raw request
// ============================================================================

fn default_field() -> String {
    "both".to_string()
}

fn default_mode() -> String {
    "any".to_string()
}

/// Search parameters as received from a caller, before validation.
///
/// `keywords` is a single string holding comma- or newline-separated
/// keywords. Field and mode are free text so that bad values surface as
/// [`SpecError`]s rather than deserialization failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub keywords: String,
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub max_results: i64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            field: default_field(),
            mode: default_mode(),
            max_results: 0,
        }
    }
}

/// Splits a raw keyword string on commas and newlines.
///
/// Pieces are NFC-normalized and trimmed; empty pieces are dropped. Order
/// is preserved.
///
/// # Examples
///
/// ```
/// use feedsift::search::parse_keywords;
///
/// assert_eq!(parse_keywords("rust, tokio\nasync,, "), vec!["rust", "tokio", "async"]);
/// ```
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(normalize_text)
        .filter(|k| !k.is_empty())
        .collect()
}

// ============================================================================
// Validated specification
// ============================================================================

/// A validated search: keywords, field selector, mode and cap.
///
/// The keyword list may be empty; such a search matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSpec {
    keywords: Vec<String>,
    field: FieldSelector,
    mode: MatchMode,
    /// 0 = unlimited
    max_results: usize,
}

impl SearchSpec {
    /// Creates a spec from individual keywords.
    ///
    /// Keywords are NFC-normalized and trimmed; blank ones are discarded.
    pub fn new<I, S>(keywords: I, field: FieldSelector, mode: MatchMode, max_results: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| normalize_text(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keywords,
            field,
            mode,
            max_results,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when no keyword survived normalization.
    pub fn is_degenerate(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn field(&self) -> FieldSelector {
        self.field
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl TryFrom<&SearchRequest> for SearchSpec {
    type Error = SpecError;

    fn try_from(req: &SearchRequest) -> Result<Self, Self::Error> {
        let field: FieldSelector = req.field.parse()?;
        let mode: MatchMode = req.mode.parse()?;
        let max_results = usize::try_from(req.max_results)
            .map_err(|_| SpecError::NegativeMaxResults(req.max_results))?;

        Ok(SearchSpec::new(
            parse_keywords(&req.keywords),
            field,
            mode,
            max_results,
        ))
    }
}
