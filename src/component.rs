//! Contract between the harness and the component under test.

use anyhow::Result;
use async_trait::async_trait;

use crate::query::ElementRef;
use crate::tree::{Element, Role};

/// Where a simulated input event lands, derived from the element handle the
/// test obtained from a query. Components match on role and accessible name
/// rather than on tree positions.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTarget {
    pub role: Role,
    pub name: Option<String>,
}

impl From<&ElementRef> for EventTarget {
    fn from(handle: &ElementRef) -> Self {
        Self {
            role: handle.role,
            name: handle.name.clone(),
        }
    }
}

/// A simulated user input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Click { target: EventTarget },
    Type { target: EventTarget, text: String },
}

impl InputEvent {
    pub fn target(&self) -> &EventTarget {
        match self {
            InputEvent::Click { target } => target,
            InputEvent::Type { target, .. } => target,
        }
    }
}

/// A headless UI component.
///
/// `render` is a pure projection of current state; effects belong in `mount`
/// (initial data loading) and `handle` (reactions to input), both of which may
/// await network calls against the mock server.
#[async_trait]
pub trait Component: Send {
    /// One-time setup before the first render.
    async fn mount(&mut self) -> Result<()> {
        Ok(())
    }

    fn render(&self) -> Element;

    /// Process one simulated input event.
    async fn handle(&mut self, event: InputEvent) -> Result<()>;
}
