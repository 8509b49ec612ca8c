//! Runs view intents against the session and the fetch pipelines.
//!
//! Fetches never hold the session: `begin_*` claims a slot, the pipeline runs
//! on its own task with a profile snapshot, and the result comes back as a
//! [`Completion`] that [`Controller::apply`] hands to the matching `finish_*`.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::artifacts::{AuditResult, BacklinkStrategy, BlogPost, KeywordData, LocalStrategy};
use crate::errors::NavigationError;
use crate::pipeline::{Fetched, SeoService};
use crate::session::{Session, View};
use crate::slot::Ticket;

/// A finished fetch on its way back to the session.
#[derive(Debug)]
pub enum Completion {
    Audit(Ticket, Fetched<AuditResult>),
    Keywords(Ticket, Fetched<Vec<KeywordData>>),
    Post(Ticket, Fetched<BlogPost>),
    Local(Ticket, Fetched<LocalStrategy>),
    Backlinks(Ticket, Fetched<BacklinkStrategy>),
    Fix { issue_id: String, ticket: Ticket, fix: Fetched<String> },
}

pub struct Controller {
    session: Session,
    service: SeoService,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Controller {
    pub fn new(service: SeoService) -> Self {
        let (tx, rx) = unbounded_channel();
        Self { session: Session::new(), service, tx, rx, in_flight: 0 }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Requests started and not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Navigates, then starts a fetch if the view loads on entry and has nothing yet.
    pub fn open(&mut self, view: View) -> Result<(), NavigationError> {
        self.session.navigate(view)?;
        if self.session.needs_load(view) {
            self.refresh(view);
        }
        Ok(())
    }

    /// Starts the fetch behind `view`. Returns false when nothing was
    /// started (slot busy, no topic, or a view without a fetch).
    pub fn refresh(&mut self, view: View) -> bool {
        let service = self.service.clone();
        match view {
            View::Audit => {
                let Some(p) = self.session.begin_audit() else { return false };
                self.spawn(async move { Completion::Audit(p.ticket, service.audit(&p.profile).await) });
            }
            View::Keywords => {
                let Some(p) = self.session.begin_keywords() else { return false };
                self.spawn(async move { Completion::Keywords(p.ticket, service.keywords(&p.profile).await) });
            }
            View::Content => {
                let Some(p) = self.session.begin_post() else { return false };
                self.spawn(async move { Completion::Post(p.ticket, service.blog_post(&p.topic, &p.profile).await) });
            }
            View::LocalSeo => {
                let Some(p) = self.session.begin_local() else { return false };
                self.spawn(async move { Completion::Local(p.ticket, service.local_strategy(&p.profile).await) });
            }
            View::Backlinks => {
                let Some(p) = self.session.begin_backlinks() else { return false };
                self.spawn(async move { Completion::Backlinks(p.ticket, service.backlink_strategy(&p.profile).await) });
            }
            View::Onboarding | View::Dashboard => return false,
        }
        true
    }

    /// Keyword → content writer handoff, then starts the post.
    pub fn write_about(&mut self, keyword: &str) -> Result<bool, NavigationError> {
        self.session.select_keyword(keyword)?;
        Ok(self.refresh(View::Content))
    }

    /// Starts fixes for several issues at once. Each lands in its own slot
    /// whatever order the responses arrive in. Returns how many were started.
    pub fn fix_issues(&mut self, ids: &[String]) -> usize {
        let pending: Vec<_> = ids.iter().filter_map(|id| self.session.begin_fix(id)).collect();
        debug!(requested = ids.len(), started = pending.len(), "fixing issues");
        let started = pending.len();
        for p in pending {
            let service = self.service.clone();
            self.spawn(async move {
                let fix = service.fix_issue(&p.issue, &p.profile).await;
                Completion::Fix { issue_id: p.issue.id, ticket: p.ticket, fix }
            });
        }
        started
    }

    /// Next finished fetch. Pending forever while nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Stores a finished fetch. False when its ticket no longer owns the slot.
    pub fn apply(&mut self, done: Completion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match done {
            Completion::Audit(t, r) => self.session.finish_audit(t, r),
            Completion::Keywords(t, r) => self.session.finish_keywords(t, r),
            Completion::Post(t, r) => self.session.finish_post(t, r),
            Completion::Local(t, r) => self.session.finish_local(t, r),
            Completion::Backlinks(t, r) => self.session.finish_backlinks(t, r),
            Completion::Fix { issue_id, ticket, fix } => self.session.finish_fix(&issue_id, ticket, fix),
        }
    }

    /// Waits until every started fetch has been applied.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(done) => {
                    self.apply(done);
                }
                None => break,
            }
        }
    }

    fn spawn<F>(&mut self, fut: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // the receiver lives as long as the controller
            let _ = tx.send(fut.await);
        });
    }
}
