//! Typed shapes of everything the model produces.
//!
//! Field names follow the JSON the prompts ask for. Mandatory fields carry no
//! serde default, so a response missing one fails to parse and the caller's
//! fallback is used instead of a half-filled value.

use std::collections::HashSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Post-parse invariants serde cannot express (ranges, uniqueness, blank text).
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    OnPage,
    Technical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoIssue {
    #[serde(deserialize_with = "display_string")]
    pub id: String,
    #[serde(rename = "type")]
    pub severity: IssueSeverity,
    pub category: IssueCategory,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    #[serde(deserialize_with = "whole_number")]
    pub score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<SeoIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: u8) -> ScoreBand {
        if score > 75 {
            ScoreBand::Good
        } else if score > 50 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub notice: usize,
}

impl AuditResult {
    pub fn fallback() -> AuditResult {
        AuditResult {
            score: 50,
            summary: "Could not generate audit. Please check API key.".into(),
            issues: Vec::new(),
        }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::of(self.score)
    }

    /// Dashboard health threshold.
    pub fn needs_attention(&self) -> bool {
        self.score <= 70
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for issue in &self.issues {
            match issue.severity {
                IssueSeverity::Critical => counts.critical += 1,
                IssueSeverity::Warning => counts.warning += 1,
                IssueSeverity::Notice => counts.notice += 1,
            }
        }
        counts
    }

    pub fn issue(&self, id: &str) -> Option<&SeoIssue> {
        self.issues.iter().find(|i| i.id == id)
    }
}

impl Validate for AuditResult {
    fn validate(&self) -> Result<(), String> {
        if self.score > 100 {
            return Err(format!("score {} is outside 0-100", self.score));
        }
        let mut seen = HashSet::new();
        for issue in &self.issues {
            if issue.id.trim().is_empty() {
                return Err("issue with empty id".into());
            }
            if issue.title.trim().is_empty() {
                return Err(format!("issue {} has an empty title", issue.id));
            }
            if !seen.insert(issue.id.as_str()) {
                return Err(format!("duplicate issue id {}", issue.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchIntent {
    #[serde(alias = "transactional")]
    Transactional,
    #[serde(alias = "informational")]
    Informational,
    #[serde(alias = "local")]
    Local,
    #[serde(alias = "navigational")]
    Navigational,
}

impl SearchIntent {
    pub fn label(self) -> &'static str {
        match self {
            SearchIntent::Transactional => "Transactional",
            SearchIntent::Informational => "Informational",
            SearchIntent::Local => "Local",
            SearchIntent::Navigational => "Navigational",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordData {
    pub keyword: String,
    pub intent: SearchIntent,
    #[serde(default, deserialize_with = "display_string")]
    pub volume: String,
    #[serde(deserialize_with = "whole_number")]
    pub difficulty: u8,
}

impl Validate for Vec<KeywordData> {
    fn validate(&self) -> Result<(), String> {
        for k in self {
            if k.keyword.trim().is_empty() {
                return Err("keyword entry with empty text".into());
            }
            if k.difficulty > 100 {
                return Err(format!("difficulty {} for '{}' is outside 0-100", k.difficulty, k.keyword));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

/// Models sometimes send `1200` instead of `"1.2k"`, or `1` as an issue id.
fn display_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(de)? {
        Scalar::Text(s) => s,
        Scalar::Number(n) => n.to_string(),
    })
}

/// Accepts `72`, `72.0` and `"72"`. Fractions, negatives and values above 255
/// are errors; the 0-100 range is left to [`Validate`].
fn whole_number<'de, D>(de: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match Scalar::deserialize(de)? {
        Scalar::Number(n) => n.as_f64(),
        Scalar::Text(s) => s.trim().parse::<f64>().ok(),
    };
    match n {
        Some(f) if f.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&f) => Ok(f as u8),
        _ => Err(D::Error::custom("expected a whole number between 0 and 255")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleBusinessProfile {
    pub description: String,
    #[serde(default)]
    pub posts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingPageStructure {
    pub h1: String,
    #[serde(default)]
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStrategy {
    pub google_business_profile: GoogleBusinessProfile,
    pub landing_page_structure: LandingPageStructure,
    #[serde(default)]
    pub local_keywords: Vec<String>,
}

impl LocalStrategy {
    pub fn fallback() -> LocalStrategy {
        LocalStrategy {
            google_business_profile: GoogleBusinessProfile {
                description: "Could not generate a local strategy. Please try again.".into(),
                posts: Vec::new(),
            },
            landing_page_structure: LandingPageStructure { h1: String::new(), sections: Vec::new() },
            local_keywords: Vec::new(),
        }
    }
}

impl Validate for LocalStrategy {
    fn validate(&self) -> Result<(), String> {
        if self.google_business_profile.description.trim().is_empty() {
            return Err("empty business profile description".into());
        }
        if self.landing_page_structure.h1.trim().is_empty() {
            return Err("empty landing page h1".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Potential {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    pub potential: Potential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklinkStrategy {
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
    pub email_template: String,
}

impl BacklinkStrategy {
    pub fn fallback() -> BacklinkStrategy {
        BacklinkStrategy {
            opportunities: Vec::new(),
            email_template: "Could not generate an outreach template. Please try again.".into(),
        }
    }
}

impl Validate for BacklinkStrategy {
    fn validate(&self) -> Result<(), String> {
        if self.email_template.trim().is_empty() {
            return Err("empty email template".into());
        }
        if self.opportunities.iter().any(|o| o.kind.trim().is_empty() || o.target.trim().is_empty()) {
            return Err("opportunity with empty type or target".into());
        }
        Ok(())
    }
}

/// Markdown article for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub topic: String,
    pub content: String,
}

pub const BLOG_POST_FALLBACK: &str = "Error generating content. Please try again.";
pub const FIX_FALLBACK: &str = "Error generating fix.";
