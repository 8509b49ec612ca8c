//! Cross-view state and the view state machine.
//!
//! `Session` is the only writer of dashboard state. Views read it and express
//! intents; fetches are split into `begin_*` (claims the slot, snapshots the
//! profile) and `finish_*` (stores the result if the ticket still owns the
//! slot), so no borrow of the session is held while a request runs.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::artifacts::{AuditResult, BacklinkStrategy, BlogPost, KeywordData, LocalStrategy, SeoIssue};
use crate::errors::{NavigationError, OnboardingError};
use crate::pipeline::Fetched;
use crate::profile::Profile;
use crate::slot::{RequestSlot, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Onboarding,
    Dashboard,
    Audit,
    Keywords,
    Content,
    LocalSeo,
    Backlinks,
}

impl View {
    /// Menu order after onboarding.
    pub const MENU: [View; 6] = [
        View::Dashboard,
        View::Audit,
        View::Keywords,
        View::Content,
        View::LocalSeo,
        View::Backlinks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::Onboarding => "Onboarding",
            View::Dashboard => "Dashboard",
            View::Audit => "Site Audit",
            View::Keywords => "Keywords",
            View::Content => "Content Writer",
            View::LocalSeo => "Local SEO",
            View::Backlinks => "Backlinks",
        }
    }

    /// Views that fetch on entry when they have nothing yet.
    pub fn loads_on_entry(self) -> bool {
        matches!(self, View::Keywords | View::LocalSeo | View::Backlinks)
    }
}

/// A claimed slot plus the inputs the pipeline needs.
#[derive(Debug, Clone)]
pub struct Pending {
    pub ticket: Ticket,
    pub profile: Profile,
}

#[derive(Debug, Clone)]
pub struct PendingPost {
    pub ticket: Ticket,
    pub profile: Profile,
    pub topic: String,
}

#[derive(Debug, Clone)]
pub struct PendingFix {
    pub ticket: Ticket,
    pub profile: Profile,
    pub issue: SeoIssue,
}

#[derive(Debug, Default)]
pub struct Session {
    view: Option<View>,
    profile: Option<Profile>,
    topic: String,
    audit: RequestSlot<Fetched<AuditResult>>,
    fixes: HashMap<String, RequestSlot<Fetched<String>>>,
    keywords: RequestSlot<Fetched<Vec<KeywordData>>>,
    content: RequestSlot<Fetched<BlogPost>>,
    local: RequestSlot<Fetched<LocalStrategy>>,
    backlinks: RequestSlot<Fetched<BacklinkStrategy>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view.unwrap_or(View::Onboarding)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Leaves onboarding. The stored profile is immutable from here on.
    pub fn complete_onboarding(&mut self, profile: Profile) -> Result<(), OnboardingError> {
        if self.profile.is_some() {
            return Err(OnboardingError::AlreadyOnboarded);
        }
        let profile = profile.trimmed();
        profile.validate()?;
        info!(business = %profile.business_name, url = %profile.website_url, "onboarding complete");
        self.profile = Some(profile);
        self.view = Some(View::Dashboard);
        Ok(())
    }

    pub fn navigate(&mut self, to: View) -> Result<(), NavigationError> {
        if self.profile.is_none() {
            return Err(NavigationError::NotOnboarded);
        }
        if to == View::Onboarding {
            return Err(NavigationError::OnboardingClosed);
        }
        debug!(from = ?self.view(), ?to, "navigate");
        self.view = Some(to);
        Ok(())
    }

    /// Hands a keyword to the content writer and switches to it in one step.
    pub fn select_keyword(&mut self, keyword: &str) -> Result<(), NavigationError> {
        self.navigate(View::Content)?;
        self.topic = keyword.trim().to_string();
        Ok(())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: &str) {
        self.topic = topic.trim().to_string();
    }

    /// True when entering `view` should start a fetch.
    pub fn needs_load(&self, view: View) -> bool {
        view.loads_on_entry()
            && match view {
                View::Keywords => self.keywords.value().is_none() && !self.keywords.is_loading(),
                View::LocalSeo => self.local.value().is_none() && !self.local.is_loading(),
                View::Backlinks => self.backlinks.value().is_none() && !self.backlinks.is_loading(),
                _ => false,
            }
    }

    fn pending<T>(profile: &Option<Profile>, slot: &mut RequestSlot<T>) -> Option<Pending> {
        let profile = profile.clone()?;
        let ticket = slot.begin()?;
        Some(Pending { ticket, profile })
    }

    // audit

    pub fn audit(&self) -> Option<&Fetched<AuditResult>> {
        self.audit.value()
    }

    pub fn audit_loading(&self) -> bool {
        self.audit.is_loading()
    }

    pub fn begin_audit(&mut self) -> Option<Pending> {
        Self::pending(&self.profile, &mut self.audit)
    }

    /// A new audit replaces the old one wholesale, fixes included.
    pub fn finish_audit(&mut self, ticket: Ticket, result: Fetched<AuditResult>) -> bool {
        let stored = self.audit.complete(ticket, result);
        if stored {
            self.fixes.clear();
        }
        stored
    }

    pub fn mark_fixed(&mut self, issue_id: &str) -> bool {
        let Some(audit) = self.audit.value_mut() else {
            return false;
        };
        match audit.value.issues.iter_mut().find(|i| i.id == issue_id) {
            Some(issue) => {
                issue.fixed = Some(true);
                true
            }
            None => false,
        }
    }

    // per-issue fixes

    /// Claims the fix slot for one issue of the current audit.
    pub fn begin_fix(&mut self, issue_id: &str) -> Option<PendingFix> {
        let profile = self.profile.clone()?;
        let issue = self.audit.value()?.value.issue(issue_id)?.clone();
        let ticket = self.fixes.entry(issue.id.clone()).or_default().begin()?;
        Some(PendingFix { ticket, profile, issue })
    }

    pub fn finish_fix(&mut self, issue_id: &str, ticket: Ticket, fix: Fetched<String>) -> bool {
        match self.fixes.get_mut(issue_id) {
            Some(slot) => slot.complete(ticket, fix),
            None => false,
        }
    }

    pub fn fix(&self, issue_id: &str) -> Option<&Fetched<String>> {
        self.fixes.get(issue_id).and_then(|s| s.value())
    }

    pub fn fix_loading(&self, issue_id: &str) -> bool {
        self.fixes.get(issue_id).is_some_and(|s| s.is_loading())
    }

    /// Issue id → fix text for every completed fix.
    pub fn fix_map(&self) -> HashMap<&str, &str> {
        self.fixes
            .iter()
            .filter_map(|(id, slot)| slot.value().map(|f| (id.as_str(), f.value.as_str())))
            .collect()
    }

    // keywords

    pub fn keywords(&self) -> Option<&Fetched<Vec<KeywordData>>> {
        self.keywords.value()
    }

    pub fn keywords_loading(&self) -> bool {
        self.keywords.is_loading()
    }

    pub fn begin_keywords(&mut self) -> Option<Pending> {
        Self::pending(&self.profile, &mut self.keywords)
    }

    pub fn finish_keywords(&mut self, ticket: Ticket, result: Fetched<Vec<KeywordData>>) -> bool {
        self.keywords.complete(ticket, result)
    }

    // content

    pub fn post(&self) -> Option<&Fetched<BlogPost>> {
        self.content.value()
    }

    pub fn post_loading(&self) -> bool {
        self.content.is_loading()
    }

    /// Needs a non-blank topic.
    pub fn begin_post(&mut self) -> Option<PendingPost> {
        if self.topic.is_empty() {
            return None;
        }
        let Pending { ticket, profile } = Self::pending(&self.profile, &mut self.content)?;
        Some(PendingPost { ticket, profile, topic: self.topic.clone() })
    }

    pub fn finish_post(&mut self, ticket: Ticket, result: Fetched<BlogPost>) -> bool {
        self.content.complete(ticket, result)
    }

    // local

    pub fn local(&self) -> Option<&Fetched<LocalStrategy>> {
        self.local.value()
    }

    pub fn local_loading(&self) -> bool {
        self.local.is_loading()
    }

    pub fn begin_local(&mut self) -> Option<Pending> {
        Self::pending(&self.profile, &mut self.local)
    }

    pub fn finish_local(&mut self, ticket: Ticket, result: Fetched<LocalStrategy>) -> bool {
        self.local.complete(ticket, result)
    }

    // backlinks

    pub fn backlinks(&self) -> Option<&Fetched<BacklinkStrategy>> {
        self.backlinks.value()
    }

    pub fn backlinks_loading(&self) -> bool {
        self.backlinks.is_loading()
    }

    pub fn begin_backlinks(&mut self) -> Option<Pending> {
        Self::pending(&self.profile, &mut self.backlinks)
    }

    pub fn finish_backlinks(&mut self, ticket: Ticket, result: Fetched<BacklinkStrategy>) -> bool {
        self.backlinks.complete(ticket, result)
    }
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
            ..Profile::default()
        }
    }

    fn issue(id: &str) -> SeoIssue {
        SeoIssue {
            id: id.into(),
            severity: IssueSeverity::Warning,
            category: IssueCategory::Technical,
            title: format!("Issue {id}"),
            description: String::new(),
            recommendation: String::new(),
            fixed: None,
        }
    }

    fn onboarded_with_audit(ids: &[&str]) -> Session {
        let mut s = Session::new();
        s.complete_onboarding(acme()).unwrap();
        let p = s.begin_audit().unwrap();
        let audit = AuditResult { score: 70, summary: "s".into(), issues: ids.iter().map(|i| issue(i)).collect() };
        assert!(s.finish_audit(p.ticket, Fetched::model(audit)));
        s
    }

    #[test]
    fn onboarding_gate() {
        let mut s = Session::new();
        assert_eq!(s.view(), View::Onboarding);
        assert_eq!(s.navigate(View::Audit), Err(NavigationError::NotOnboarded));
        assert!(s.begin_audit().is_none());

        let no_name = Profile { website_url: "https://acme.test".into(), ..Profile::default() };
        assert_eq!(s.complete_onboarding(no_name), Err(OnboardingError::MissingName));
        assert_eq!(s.view(), View::Onboarding);

        s.complete_onboarding(acme()).unwrap();
        assert_eq!(s.view(), View::Dashboard);
        assert_eq!(s.complete_onboarding(acme()), Err(OnboardingError::AlreadyOnboarded));
        assert_eq!(s.navigate(View::Onboarding), Err(NavigationError::OnboardingClosed));
    }

    #[test]
    fn every_view_reachable_and_back() {
        let mut s = Session::new();
        s.complete_onboarding(acme()).unwrap();
        for v in View::MENU {
            s.navigate(v).unwrap();
            assert_eq!(s.view(), v);
            s.navigate(View::Dashboard).unwrap();
            assert_eq!(s.view(), View::Dashboard);
        }
    }

    #[test]
    fn keyword_selection_switches_with_topic() {
        let mut s = Session::new();
        s.complete_onboarding(acme()).unwrap();
        s.navigate(View::Keywords).unwrap();
        s.select_keyword(" boot resoling austin ").unwrap();
        assert_eq!(s.view(), View::Content);
        assert_eq!(s.topic(), "boot resoling austin");
        let pending = s.begin_post().unwrap();
        assert_eq!(pending.topic, "boot resoling austin");
    }

    #[test]
    fn audit_survives_navigation() {
        let mut s = onboarded_with_audit(&["a"]);
        s.navigate(View::Keywords).unwrap();
        s.navigate(View::Audit).unwrap();
        assert_eq!(s.audit().map(|a| a.value.score), Some(70));
        assert!(!s.audit_loading());
    }

    #[test]
    fn one_audit_in_flight_at_a_time() {
        let mut s = Session::new();
        s.complete_onboarding(acme()).unwrap();
        let first = s.begin_audit().unwrap();
        assert!(s.audit_loading());
        assert!(s.begin_audit().is_none());
        assert!(s.finish_audit(first.ticket, Fetched::fallback(AuditResult::fallback(), "boom")));
        assert!(!s.audit_loading());
        assert!(s.audit().unwrap().is_fallback());
    }

    #[test]
    fn fixes_complete_out_of_order() {
        let mut s = onboarded_with_audit(&["A", "B"]);
        let a = s.begin_fix("A").unwrap();
        let b = s.begin_fix("B").unwrap();
        assert!(s.fix_loading("A") && s.fix_loading("B"));

        assert!(s.finish_fix("B", b.ticket, Fetched::model("fix for B".into())));
        assert!(s.fix_loading("A"));
        assert!(!s.fix_loading("B"));
        assert!(s.finish_fix("A", a.ticket, Fetched::model("fix for A".into())));

        let map = s.fix_map();
        assert_eq!(map.get("A"), Some(&"fix for A"));
        assert_eq!(map.get("B"), Some(&"fix for B"));
    }

    #[test]
    fn fix_requires_known_issue_and_single_flight() {
        let mut s = onboarded_with_audit(&["A"]);
        assert!(s.begin_fix("missing").is_none());
        let a = s.begin_fix("A").unwrap();
        assert_eq!(a.issue.title, "Issue A");
        assert!(s.begin_fix("A").is_none());
        // a ticket from another issue cannot land here
        assert!(!s.finish_fix("B", a.ticket, Fetched::model("x".into())));
    }

    #[test]
    fn new_audit_drops_old_fixes() {
        let mut s = onboarded_with_audit(&["A"]);
        let a = s.begin_fix("A").unwrap();
        let rerun = s.begin_audit().unwrap();
        assert!(s.begin_fix("A").is_none());
        assert!(s.finish_audit(rerun.ticket, Fetched::model(AuditResult::fallback())));
        assert!(!s.finish_fix("A", a.ticket, Fetched::model("stale".into())));
        assert!(s.fix_map().is_empty());
    }

    #[test]
    fn mark_fixed_sets_flag() {
        let mut s = onboarded_with_audit(&["A", "B"]);
        assert!(s.mark_fixed("B"));
        assert!(!s.mark_fixed("Z"));
        let audit = &s.audit().unwrap().value;
        assert_eq!(audit.issues[0].fixed, None);
        assert_eq!(audit.issues[1].fixed, Some(true));
    }

    #[test]
    fn entry_loads_only_when_empty() {
        let mut s = Session::new();
        s.complete_onboarding(acme()).unwrap();
        assert!(s.needs_load(View::Keywords));
        assert!(!s.needs_load(View::Audit));
        assert!(!s.needs_load(View::Content));
        let p = s.begin_keywords().unwrap();
        assert!(!s.needs_load(View::Keywords));
        s.finish_keywords(p.ticket, Fetched::model(vec![]));
        assert!(!s.needs_load(View::Keywords));
    }

    #[test]
    fn post_needs_topic() {
        let mut s = Session::new();
        s.complete_onboarding(acme()).unwrap();
        assert!(s.begin_post().is_none());
        s.set_topic("winter boots");
        assert!(s.begin_post().is_some());
    }
}
