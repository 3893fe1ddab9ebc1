//! Render harness: owns the component under test and its rendered tree.

use std::collections::VecDeque;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::component::{Component, EventTarget, InputEvent};
use crate::config::PollConfig;
use crate::error::QueryError;
use crate::query::{ElementRef, Query};
use crate::tree::{Element, Role};

/// Drives one component for the duration of one test: mounts it, renders it,
/// queues simulated input, and re-renders on flush.
///
/// Input dispatch is split in two, matching how asynchronous UI updates work:
/// [`type_text`](Harness::type_text) and [`click`](Harness::click) enqueue
/// synchronously, [`flush`](Harness::flush) delivers the queue to the
/// component and re-renders. The `find_*` queries flush implicitly on every
/// poll tick, so awaiting one is enough to observe an input's effect.
pub struct Harness {
    component: Box<dyn Component>,
    tree: Element,
    queued: VecDeque<InputEvent>,
    poll: PollConfig,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("tree", &self.tree)
            .field("queued", &self.queued)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Run the component's `mount` hook and produce the first render.
    pub async fn mount(component: impl Component + 'static) -> Result<Self> {
        let mut component: Box<dyn Component> = Box::new(component);
        component.mount().await.context("component mount failed")?;
        let tree = component.render();
        debug!(nodes = tree.descendants().len(), "component mounted");
        Ok(Self {
            component,
            tree,
            queued: VecDeque::new(),
            poll: PollConfig::from_env(),
        })
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// The current rendered tree, for structural assertions.
    pub fn tree(&self) -> &Element {
        &self.tree
    }

    // ------------------------------------------------------------------
    // Synchronous queries: fail immediately against the current tree.
    // ------------------------------------------------------------------

    pub fn get_by_role(&self, role: Role) -> Result<ElementRef, QueryError> {
        Query::ByRole(role).one(&self.tree)
    }

    pub fn get_all_by_role(&self, role: Role) -> Result<Vec<ElementRef>, QueryError> {
        let query = Query::ByRole(role);
        let found = query.all(&self.tree);
        if found.is_empty() {
            return Err(QueryError::NotFound {
                query: query.to_string(),
            });
        }
        Ok(found)
    }

    pub fn get_by_text(&self, text: &str) -> Result<ElementRef, QueryError> {
        Query::ByText(text.to_string()).one(&self.tree)
    }

    pub fn query_by_role(&self, role: Role) -> Option<ElementRef> {
        Query::ByRole(role).all(&self.tree).into_iter().next()
    }

    pub fn query_by_text(&self, text: &str) -> Option<ElementRef> {
        Query::ByText(text.to_string())
            .all(&self.tree)
            .into_iter()
            .next()
    }

    // ------------------------------------------------------------------
    // Simulated input.
    // ------------------------------------------------------------------

    /// Queue typing into the addressed element. Fails if the handle no longer
    /// resolves against the current tree.
    pub fn type_text(&mut self, target: &ElementRef, text: &str) -> Result<(), QueryError> {
        self.check_handle(target)?;
        self.queued.push_back(InputEvent::Type {
            target: EventTarget::from(target),
            text: text.to_string(),
        });
        Ok(())
    }

    /// Queue a click on the addressed element.
    pub fn click(&mut self, target: &ElementRef) -> Result<(), QueryError> {
        self.check_handle(target)?;
        self.queued.push_back(InputEvent::Click {
            target: EventTarget::from(target),
        });
        Ok(())
    }

    /// Deliver all queued events in order, then re-render once.
    pub async fn flush(&mut self) -> Result<()> {
        while let Some(event) = self.queued.pop_front() {
            trace!(?event, "dispatching input event");
            self.component
                .handle(event)
                .await
                .context("component rejected input event")?;
        }
        self.tree = self.component.render();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Asynchronous queries: bounded retry loop with a fixed poll interval.
    // ------------------------------------------------------------------

    pub async fn find_by_role(&mut self, role: Role) -> Result<ElementRef, QueryError> {
        let query = Query::ByRole(role);
        let mut found = self.wait_for(&query).await?;
        if found.len() > 1 {
            return Err(QueryError::Ambiguous {
                query: query.to_string(),
                count: found.len(),
            });
        }
        Ok(found.remove(0))
    }

    pub async fn find_all_by_role(&mut self, role: Role) -> Result<Vec<ElementRef>, QueryError> {
        self.wait_for(&Query::ByRole(role)).await
    }

    pub async fn find_by_text(&mut self, text: &str) -> Result<ElementRef, QueryError> {
        let query = Query::ByText(text.to_string());
        let mut found = self.wait_for(&query).await?;
        if found.len() > 1 {
            return Err(QueryError::Ambiguous {
                query: query.to_string(),
                count: found.len(),
            });
        }
        Ok(found.remove(0))
    }

    /// Poll until the query matches or the configured timeout elapses. Each
    /// tick flushes queued input first so pending effects become visible.
    async fn wait_for(&mut self, query: &Query) -> Result<Vec<ElementRef>, QueryError> {
        let started = Instant::now();
        loop {
            self.flush().await.map_err(|err| QueryError::Component {
                context: format!("waiting for {query}"),
                message: format!("{err:#}"),
            })?;
            let found = query.all(&self.tree);
            if !found.is_empty() {
                return Ok(found);
            }
            if started.elapsed() >= self.poll.timeout {
                debug!(%query, waited_ms = started.elapsed().as_millis() as u64, "query timed out");
                return Err(QueryError::Timeout {
                    query: query.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll.interval).await;
        }
    }

    fn check_handle(&self, handle: &ElementRef) -> Result<(), QueryError> {
        match self.tree.node_at(&handle.path) {
            Some(node) if node.role == handle.role => Ok(()),
            _ => Err(QueryError::Stale {
                path: handle.path.to_string(),
                role: handle.role,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// Minimal fixture: a counter with a button; text shows the count.
    struct Counter {
        clicks: usize,
    }

    #[async_trait::async_trait]
    impl Component for Counter {
        fn render(&self) -> Element {
            Element::new(Role::Generic)
                .child(Element::button("bump"))
                .child(Element::heading(format!("count: {}", self.clicks)))
        }

        async fn handle(&mut self, event: InputEvent) -> Result<()> {
            if matches!(event, InputEvent::Click { .. }) {
                self.clicks += 1;
            }
            Ok(())
        }
    }

    struct FailingMount;

    #[async_trait::async_trait]
    impl Component for FailingMount {
        async fn mount(&mut self) -> Result<()> {
            anyhow::bail!("backend unreachable")
        }

        fn render(&self) -> Element {
            Element::new(Role::Generic)
        }

        async fn handle(&mut self, _event: InputEvent) -> Result<()> {
            Ok(())
        }
    }

    fn tight_poll() -> PollConfig {
        PollConfig::new(Duration::from_millis(100), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn click_takes_effect_after_flush() {
        let mut harness = Harness::mount(Counter { clicks: 0 }).await.unwrap();
        let button = harness.get_by_role(Role::Button).unwrap();
        harness.click(&button).unwrap();

        // Not delivered yet: dispatch is queued until a flush.
        assert!(harness.query_by_text("count: 1").is_none());

        harness.flush().await.unwrap();
        assert!(harness.query_by_text("count: 1").is_some());
    }

    #[tokio::test]
    async fn find_flushes_queued_input() {
        let mut harness = Harness::mount(Counter { clicks: 0 })
            .await
            .unwrap()
            .with_poll_config(tight_poll());
        let button = harness.get_by_role(Role::Button).unwrap();
        harness.click(&button).unwrap();
        harness.click(&button).unwrap();

        let heading = harness.find_by_text("count: 2").await.unwrap();
        assert_eq!(heading.role, Role::Heading);
    }

    #[tokio::test]
    async fn find_times_out_with_query_and_elapsed() {
        let mut harness = Harness::mount(Counter { clicks: 0 })
            .await
            .unwrap()
            .with_poll_config(PollConfig::new(
                Duration::from_millis(60),
                Duration::from_millis(10),
            ));

        let err = harness.find_by_text("count: 7").await.unwrap_err();
        match err {
            QueryError::Timeout { query, waited_ms } => {
                assert_eq!(query, "text \"count: 7\"");
                assert!(waited_ms >= 60, "reported wait too short: {waited_ms} ms");
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn stale_handles_are_rejected() {
        let mut harness = Harness::mount(Counter { clicks: 0 }).await.unwrap();
        let heading = harness.get_by_role(Role::Heading).unwrap();

        // Forge a handle pointing past the rendered children.
        let forged = ElementRef {
            path: heading.path.child(3),
            ..heading
        };
        let err = harness.click(&forged).unwrap_err();
        assert!(matches!(err, QueryError::Stale { .. }), "got {err}");
    }

    #[tokio::test]
    async fn mount_failure_is_an_error() {
        let err = Harness::mount(FailingMount).await.unwrap_err();
        assert!(format!("{err:#}").contains("backend unreachable"));
    }
}
