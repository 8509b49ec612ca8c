use crate::artifacts::SeoIssue;
use crate::profile::Profile;

/// Which artifact a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Audit,
    Keywords,
    BlogPost,
    IssueFix,
    LocalStrategy,
    BacklinkStrategy,
}

impl PromptKind {
    /// Whether the gateway should constrain the model to a single JSON document.
    pub fn structured(self) -> bool {
        !matches!(self, PromptKind::BlogPost | PromptKind::IssueFix)
    }
}

/// A prompt request plus the per-kind input it needs beyond the profile.
#[derive(Debug, Clone, Copy)]
pub enum PromptRequest<'a> {
    Audit,
    Keywords,
    BlogPost { topic: &'a str },
    IssueFix { issue: &'a SeoIssue },
    LocalStrategy,
    BacklinkStrategy,
}

impl PromptRequest<'_> {
    pub fn kind(&self) -> PromptKind {
        match self {
            PromptRequest::Audit => PromptKind::Audit,
            PromptRequest::Keywords => PromptKind::Keywords,
            PromptRequest::BlogPost { .. } => PromptKind::BlogPost,
            PromptRequest::IssueFix { .. } => PromptKind::IssueFix,
            PromptRequest::LocalStrategy => PromptKind::LocalStrategy,
            PromptRequest::BacklinkStrategy => PromptKind::BacklinkStrategy,
        }
    }
}

/// Pure and deterministic: the same request and profile always give the same text.
pub fn build_prompt(req: PromptRequest<'_>, profile: &Profile) -> String {
    match req {
        PromptRequest::Audit => audit_prompt(profile),
        PromptRequest::Keywords => keywords_prompt(profile),
        PromptRequest::BlogPost { topic } => blog_post_prompt(topic, profile),
        PromptRequest::IssueFix { issue } => issue_fix_prompt(issue, profile),
        PromptRequest::LocalStrategy => local_strategy_prompt(profile),
        PromptRequest::BacklinkStrategy => backlink_strategy_prompt(profile),
    }
}

#[derive(Clone, Copy)]
enum Field {
    Business,
    Website,
    Industry,
    Location,
    Keywords,
    Competitors,
}

/// One `Label: value` line per field; blank fields produce no line at all.
fn context_block(profile: &Profile, fields: &[Field]) -> String {
    let mut s = String::new();
    for f in fields {
        let (label, value) = match f {
            Field::Business => ("Business", &profile.business_name),
            Field::Website => ("URL", &profile.website_url),
            Field::Industry => ("Industry", &profile.industry),
            Field::Location => ("Location", &profile.location),
            Field::Keywords => ("Core Topic", &profile.primary_keywords),
            Field::Competitors => ("Competitors", &profile.competitors),
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        s.push_str(label);
        s.push_str(": ");
        s.push_str(value);
        s.push('\n');
    }
    s
}

fn json_only() -> &'static str {
    "Respond with exactly one JSON document: no markdown, no code fences, no commentary."
}

pub fn audit_prompt(profile: &Profile) -> String {
    let ctx = context_block(profile, &[Field::Business, Field::Website, Field::Industry, Field::Location]);
    format!(
        r#"You are an expert Technical SEO Auditor. Analyze the likely SEO status of this business:
{ctx}
Simulate a realistic SEO audit. Return a JSON object with this exact schema:
{{
  "score": integer 0-100,
  "summary": "Short executive summary of findings",
  "issues": [
    {{
      "id": "string, unique within this list",
      "type": "CRITICAL" | "WARNING" | "NOTICE",
      "category": "ON_PAGE" | "TECHNICAL",
      "title": "Issue title",
      "description": "What is wrong",
      "recommendation": "How to fix it"
    }}
  ]
}}
Generate at least 6 varied issues tailored to the industry.
{json_only}"#,
        json_only = json_only()
    )
}

pub fn keywords_prompt(profile: &Profile) -> String {
    let ctx = context_block(
        profile,
        &[Field::Business, Field::Website, Field::Industry, Field::Location, Field::Keywords],
    );
    format!(
        r#"You are a Keyword Research Specialist. Generate a list of high-value SEO keywords for:
{ctx}
Return a JSON object with a single "keywords" array:
{{
  "keywords": [
    {{
      "keyword": "string",
      "intent": "Transactional" | "Informational" | "Local" | "Navigational",
      "volume": "string (e.g. '1.2k')",
      "difficulty": integer 0-100
    }}
  ]
}}
Generate 10-15 keywords.
{json_only}"#,
        json_only = json_only()
    )
}

/// A blank topic falls back to the profile's core topic, then to the business name.
pub fn blog_post_prompt(topic: &str, profile: &Profile) -> String {
    let topic = [topic, profile.primary_keywords.as_str(), profile.business_name.as_str()]
        .into_iter()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or_default();
    let ctx = context_block(profile, &[Field::Business, Field::Website, Field::Location]);
    format!(
        r#"You are an expert SEO Content Writer. Write a comprehensive blog post about "{topic}".
Context:
{ctx}
Requirements:
- Use Markdown format.
- SEO optimized title (H1).
- Engaging introduction.
- Several H2 and H3 subheadings.
- An FAQ section (AEO optimized).
- A conclusion with a call to action.
- Approximately 800 words.
- Tone: professional but accessible."#
    )
}

pub fn issue_fix_prompt(issue: &SeoIssue, profile: &Profile) -> String {
    let ctx = context_block(profile, &[Field::Business, Field::Website, Field::Industry]);
    let mut details = String::new();
    details.push_str("Issue: ");
    details.push_str(issue.title.trim());
    details.push('\n');
    for (label, value) in [("Description", &issue.description), ("Recommendation", &issue.recommendation)] {
        if !value.trim().is_empty() {
            details.push_str(label);
            details.push_str(": ");
            details.push_str(value.trim());
            details.push('\n');
        }
    }
    format!(
        r#"You are an SEO technician. Provide the specific code fix or text rewrite for this issue:
{details}
Context:
{ctx}
Provide ONLY the solution (e.g. the new meta tag, the rewritten H1, or the robots.txt snippet). No conversational filler."#
    )
}

pub fn local_strategy_prompt(profile: &Profile) -> String {
    let ctx = context_block(
        profile,
        &[Field::Business, Field::Website, Field::Location, Field::Industry, Field::Keywords],
    );
    format!(
        r#"Create a Local SEO Strategy for:
{ctx}
Return a JSON object:
{{
  "googleBusinessProfile": {{
    "description": "Optimized description, at most 750 characters",
    "posts": ["Post idea 1", "Post idea 2", "Post idea 3"]
  }},
  "landingPageStructure": {{
    "h1": "string",
    "sections": ["string", "string"]
  }},
  "localKeywords": ["string", "string", "string"]
}}
{json_only}"#,
        json_only = json_only()
    )
}

pub fn backlink_strategy_prompt(profile: &Profile) -> String {
    let ctx = context_block(
        profile,
        &[Field::Business, Field::Website, Field::Industry, Field::Competitors],
    );
    format!(
        r#"Create a Backlink Outreach Strategy for:
{ctx}
Return a JSON object:
{{
  "opportunities": [
    {{"type": "Guest Post", "target": "Industry Blogs", "potential": "High"}},
    {{"type": "Directory", "target": "Local Listings", "potential": "Medium"}}
  ],
  "emailTemplate": "Subject: ... Body: ..."
}}
"potential" must be one of "High", "Medium", "Low".
{json_only}"#,
        json_only = json_only()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{IssueCategory, IssueSeverity};
    use pretty_assertions::assert_eq;

    fn acme() -> Profile {
        Profile {
            business_name: "Acme".into(),
            website_url: "https://acme.test".into(),
            industry: "Retail".into(),
            location: "Austin".into(),
            primary_keywords: "shoe repair".into(),
            competitors: String::new(),
        }
    }

    fn issue() -> SeoIssue {
        SeoIssue {
            id: "m1".into(),
            severity: IssueSeverity::Critical,
            category: IssueCategory::OnPage,
            title: "Missing H1".into(),
            description: "Home page has no H1".into(),
            recommendation: String::new(),
            fixed: None,
        }
    }

    fn every_request(issue: &SeoIssue) -> Vec<PromptRequest<'_>> {
        vec![
            PromptRequest::Audit,
            PromptRequest::Keywords,
            PromptRequest::BlogPost { topic: "resoling boots" },
            PromptRequest::IssueFix { issue },
            PromptRequest::LocalStrategy,
            PromptRequest::BacklinkStrategy,
        ]
    }

    #[test]
    fn keyword_prompt_carries_profile() {
        let prompt = build_prompt(PromptRequest::Keywords, &acme());
        for needle in ["Acme", "Retail", "Austin", "shoe repair"] {
            assert!(prompt.contains(needle), "missing {needle}");
        }
        // json_object modes only emit objects, so the list is wrapped
        assert!(prompt.contains(r#""keywords": ["#));
    }

    #[test]
    fn every_prompt_names_business_and_site() {
        let issue = issue();
        let profiles = [
            acme(),
            Profile { business_name: "GoDrive Rentals".into(), website_url: "https://godrive.example".into(), ..Profile::default() },
        ];
        for profile in &profiles {
            for req in every_request(&issue) {
                let prompt = build_prompt(req, profile);
                assert!(prompt.contains(&profile.business_name), "{:?}", req.kind());
                assert!(prompt.contains(&profile.website_url), "{:?}", req.kind());
                assert!(!prompt.contains("undefined"));
            }
        }
    }

    #[test]
    fn blank_fields_are_omitted() {
        let profile = Profile { business_name: "Acme".into(), website_url: "https://acme.test".into(), ..Profile::default() };
        let prompt = backlink_strategy_prompt(&profile);
        assert!(!prompt.contains("Competitors:"));
        assert!(!prompt.contains("Industry:"));
        assert!(backlink_strategy_prompt(&acme()).contains("Industry: Retail"));
        assert!(!backlink_strategy_prompt(&acme()).contains("Competitors"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let issue = issue();
        for req in every_request(&issue) {
            assert_eq!(build_prompt(req, &acme()), build_prompt(req, &acme()));
        }
    }

    #[test]
    fn blog_topic_falls_back() {
        assert!(blog_post_prompt("  ", &acme()).contains("about \"shoe repair\""));
        let bare = Profile { business_name: "Acme".into(), website_url: "https://acme.test".into(), ..Profile::default() };
        assert!(blog_post_prompt("", &bare).contains("about \"Acme\""));
        assert!(blog_post_prompt("heel repair", &acme()).contains("about \"heel repair\""));
    }

    #[test]
    fn fix_prompt_describes_issue() {
        let prompt = issue_fix_prompt(&issue(), &acme());
        assert!(prompt.contains("Issue: Missing H1"));
        assert!(prompt.contains("Description: Home page has no H1"));
        assert!(!prompt.contains("Recommendation:"));
    }

    #[test]
    fn structured_kinds() {
        assert!(PromptKind::Audit.structured());
        assert!(PromptKind::Keywords.structured());
        assert!(PromptKind::LocalStrategy.structured());
        assert!(PromptKind::BacklinkStrategy.structured());
        assert!(!PromptKind::BlogPost.structured());
        assert!(!PromptKind::IssueFix.structured());
    }
}
