//! Prompt → gateway → normalizer, once per artifact kind.
//!
//! Every method resolves to a [`Fetched`] value: either what the model
//! produced or the documented fallback, never an error.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::artifacts::{
    AuditResult, BacklinkStrategy, BlogPost, KeywordData, LocalStrategy, SeoIssue, Validate, BLOG_POST_FALLBACK,
    FIX_FALLBACK,
};
use crate::normalize::{normalize_text, try_normalize};
use crate::profile::Profile;
use crate::prompt::{build_prompt, PromptRequest};
use crate::provider::{DynGateway, InvokeOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Model,
    /// Fallback substituted; the string says why (gateway or parse failure).
    Fallback(String),
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: Origin,
    pub generated_at: DateTime<Utc>,
}

impl<T> Fetched<T> {
    pub fn model(value: T) -> Self {
        Self { value, origin: Origin::Model, generated_at: Utc::now() }
    }

    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self { value, origin: Origin::Fallback(reason.into()), generated_at: Utc::now() }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback(_))
    }
}

#[derive(Clone)]
pub struct SeoService {
    gateway: DynGateway,
}

impl SeoService {
    pub fn new(gateway: DynGateway) -> Self {
        Self { gateway }
    }

    pub async fn audit(&self, profile: &Profile) -> Fetched<AuditResult> {
        self.fetch_json(PromptRequest::Audit, profile, AuditResult::fallback()).await
    }

    pub async fn keywords(&self, profile: &Profile) -> Fetched<Vec<KeywordData>> {
        self.fetch_json(PromptRequest::Keywords, profile, Vec::new()).await
    }

    pub async fn local_strategy(&self, profile: &Profile) -> Fetched<LocalStrategy> {
        self.fetch_json(PromptRequest::LocalStrategy, profile, LocalStrategy::fallback()).await
    }

    pub async fn backlink_strategy(&self, profile: &Profile) -> Fetched<BacklinkStrategy> {
        self.fetch_json(PromptRequest::BacklinkStrategy, profile, BacklinkStrategy::fallback()).await
    }

    pub async fn blog_post(&self, topic: &str, profile: &Profile) -> Fetched<BlogPost> {
        let fetched = self.fetch_text(PromptRequest::BlogPost { topic }, profile, BLOG_POST_FALLBACK).await;
        Fetched {
            value: BlogPost { topic: topic.to_string(), content: fetched.value },
            origin: fetched.origin,
            generated_at: fetched.generated_at,
        }
    }

    pub async fn fix_issue(&self, issue: &SeoIssue, profile: &Profile) -> Fetched<String> {
        self.fetch_text(PromptRequest::IssueFix { issue }, profile, FIX_FALLBACK).await
    }

    async fn fetch_json<T>(&self, req: PromptRequest<'_>, profile: &Profile, fallback: T) -> Fetched<T>
    where
        T: DeserializeOwned + Validate,
    {
        let kind = req.kind();
        let prompt = build_prompt(req, profile);
        let span = info_span!("fetch", ?kind, request_id = %Uuid::new_v4());
        async move {
            let raw = match self.gateway.invoke(&prompt, InvokeOptions { structured: kind.structured() }).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "gateway failed, using fallback");
                    return Fetched::fallback(fallback, e.to_string());
                }
            };
            match try_normalize::<T>(&raw) {
                Ok(v) => {
                    info!("artifact ready");
                    Fetched::model(v)
                }
                Err(e) => {
                    warn!(error = %e, bytes = raw.len(), "malformed response, using fallback");
                    Fetched::fallback(fallback, e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn fetch_text(&self, req: PromptRequest<'_>, profile: &Profile, fallback: &str) -> Fetched<String> {
        let kind = req.kind();
        let prompt = build_prompt(req, profile);
        let span = info_span!("fetch", ?kind, request_id = %Uuid::new_v4());
        async move {
            match self.gateway.invoke(&prompt, InvokeOptions { structured: kind.structured() }).await {
                Ok(raw) => {
                    let text = normalize_text(&raw, "");
                    if text.is_empty() {
                        Fetched::fallback(fallback.to_string(), "empty response")
                    } else {
                        info!(bytes = text.len(), "text ready");
                        Fetched::model(text)
                    }
                }
                Err(e) => {
                    warn!(error = %e, "gateway failed, using fallback");
                    Fetched::fallback(fallback.to_string(), e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GatewayError;
    use crate::provider::scripted::{Reply, ScriptedGateway};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

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

    #[tokio::test]
    async fn fenced_audit_from_model() {
        let gw = Arc::new(ScriptedGateway::new(vec![Reply::text(
            "```json\n{\"score\":80,\"summary\":\"ok\",\"issues\":[]}\n```",
        )]));
        let svc = SeoService::new(gw.clone());
        let got = svc.audit(&acme()).await;
        assert_eq!(got.origin, Origin::Model);
        assert_eq!(got.value, AuditResult { score: 80, summary: "ok".into(), issues: vec![] });
        let calls = gw.calls();
        assert!(calls[0].opts.structured);
        assert!(calls[0].prompt.contains("https://acme.test"));
    }

    #[tokio::test]
    async fn prose_audit_falls_back() {
        let svc = SeoService::new(Arc::new(ScriptedGateway::new(vec![Reply::text("not json at all")])));
        let got = svc.audit(&acme()).await;
        assert!(got.is_fallback());
        assert_eq!(got.value, AuditResult::fallback());
    }

    #[tokio::test]
    async fn gateway_errors_become_fallbacks_for_every_artifact() {
        let gw = Arc::new(ScriptedGateway::always(Reply::error(GatewayError::Status { status: 503, body: "down".into() })));
        let svc = SeoService::new(gw);
        let p = acme();
        assert_eq!(svc.audit(&p).await.value, AuditResult::fallback());
        assert!(svc.keywords(&p).await.value.is_empty());
        assert_eq!(svc.local_strategy(&p).await.value, LocalStrategy::fallback());
        assert_eq!(svc.backlink_strategy(&p).await.value, BacklinkStrategy::fallback());
        let post = svc.blog_post("boots", &p).await;
        assert_eq!(post.value.content, BLOG_POST_FALLBACK);
        assert_eq!(post.value.topic, "boots");
        let fix = svc.fix_issue(&sample_issue(), &p).await;
        assert_eq!(fix.value, FIX_FALLBACK);
        assert!(matches!(fix.origin, Origin::Fallback(ref why) if why.contains("503")));
    }

    #[tokio::test]
    async fn text_artifacts_are_not_structured() {
        let gw = Arc::new(ScriptedGateway::new(vec![Reply::text("# Boot care\n\nBody")]));
        let svc = SeoService::new(gw.clone());
        let post = svc.blog_post("boot care", &acme()).await;
        assert_eq!(post.origin, Origin::Model);
        assert_eq!(post.value.content, "# Boot care\n\nBody");
        assert!(!gw.calls()[0].opts.structured);
    }

    #[tokio::test]
    async fn blank_text_is_a_fallback() {
        let svc = SeoService::new(Arc::new(ScriptedGateway::new(vec![Reply::text("   ")])));
        let fix = svc.fix_issue(&sample_issue(), &acme()).await;
        assert_eq!(fix.value, FIX_FALLBACK);
        assert!(fix.is_fallback());
    }

    #[tokio::test]
    async fn timeouts_resolve_to_fallback() {
        let slow = Arc::new(ScriptedGateway::new(vec![Reply::text("[]").after(Duration::from_millis(200))]));
        let bounded = crate::provider::Bounded::new(slow, Duration::from_millis(10));
        let svc = SeoService::new(Arc::new(bounded));
        let got = svc.keywords(&acme()).await;
        assert!(got.is_fallback());
        assert!(got.value.is_empty());
    }

    fn sample_issue() -> SeoIssue {
        SeoIssue {
            id: "h1".into(),
            severity: crate::artifacts::IssueSeverity::Warning,
            category: crate::artifacts::IssueCategory::OnPage,
            title: "Missing H1".into(),
            description: String::new(),
            recommendation: String::new(),
            fixed: None,
        }
    }
}
