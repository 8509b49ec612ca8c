//! A gateway that replays canned replies, so pipeline and controller tests run
//! without network access.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Gateway, InvokeOptions};
use crate::errors::GatewayError;

#[derive(Debug, Clone)]
pub struct Reply {
    outcome: Result<String, GatewayError>,
    delay: Option<Duration>,
    matching: Option<String>,
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Reply {
        Reply { outcome: Ok(s.into()), delay: None, matching: None }
    }

    pub fn error(e: GatewayError) -> Reply {
        Reply { outcome: Err(e), delay: None, matching: None }
    }

    pub fn after(mut self, delay: Duration) -> Reply {
        self.delay = Some(delay);
        self
    }

    /// Only answer prompts containing `needle`.
    pub fn when(mut self, needle: impl Into<String>) -> Reply {
        self.matching = Some(needle.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub prompt: String,
    pub opts: InvokeOptions,
}

pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    otherwise: Option<Reply>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedGateway {
    /// Each reply is used once, first match wins.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self { replies: Mutex::new(replies.into()), otherwise: None, calls: Mutex::new(Vec::new()) }
    }

    /// Answers every call with the same reply.
    pub fn always(reply: Reply) -> Self {
        Self { replies: Mutex::new(VecDeque::new()), otherwise: Some(reply), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn invoke(&self, prompt: &str, opts: InvokeOptions) -> Result<String, GatewayError> {
        self.calls.lock().push(Call { prompt: prompt.to_string(), opts });
        let reply = {
            let mut replies = self.replies.lock();
            let pos = replies
                .iter()
                .position(|r| r.matching.as_deref().map_or(true, |n| prompt.contains(n)));
            pos.and_then(|i| replies.remove(i))
        };
        let Some(reply) = reply.or_else(|| self.otherwise.clone()) else {
            return Err(GatewayError::Transport("no scripted reply left".into()));
        };
        if let Some(d) = reply.delay {
            tokio::time::sleep(d).await;
        }
        reply.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn replies_are_consumed_by_match() {
        let gw = ScriptedGateway::new(vec![Reply::text("b").when("beta"), Reply::text("any")]);
        assert_eq!(gw.invoke("alpha", InvokeOptions::default()).await, Ok("any".into()));
        assert_eq!(gw.invoke("beta", InvokeOptions { structured: true }).await, Ok("b".into()));
        assert!(gw.invoke("beta", InvokeOptions::default()).await.is_err());
        assert_eq!(gw.calls().len(), 3);
        assert!(gw.calls()[1].opts.structured);
    }
}
