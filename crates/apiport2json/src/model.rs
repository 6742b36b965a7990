use serde::{Deserialize, Serialize};

/// One breaking-change entry, extracted from a single markdown document.
///
/// Field order is the serialization order of the JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingChange {
    /// Numeric identifier from the `## <id>: <title>` header
    pub id: i32,
    pub title: String,
    /// Impact scope, e.g. "Major", "Minor", "Edge"
    pub scope: String,
    pub version_introduced: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_reverted: Option<String>,
    pub source_analyzer_status: String,
    /// Change description (markdown, may span several paragraphs)
    pub description: String,
    pub quirked: bool,
    #[serde(default)]
    pub optional: bool,
    pub build_time_break: bool,
    pub recommended_action: String,
    /// Raw text of the "Affected APIs" section
    pub affected_apis: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Link target of the `[More information](...)` trailer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_bug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Trim `value`, treating an empty or whitespace-only capture as absent.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
