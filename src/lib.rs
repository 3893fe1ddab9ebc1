//! mockstage: headless component-test harness with a mock HTTP interceptor.
//!
//! Two collaborating pieces. The [`Harness`] renders a [`Component`] into an
//! in-memory [`Element`] tree, simulates user input against it, and answers
//! role/text queries either synchronously or with a bounded polling wait. The
//! [`MockServer`] intercepts the component's outbound HTTP calls, answering
//! from a handler set that is reset between tests so no stub leaks from one
//! test into the next. [`Suite`] wires both into the strict
//! before-all / after-each / after-all lifecycle.

pub mod component;
pub mod config;
pub mod error;
pub mod harness;
pub mod query;
pub mod server;
pub mod suite;
pub mod tree;

pub use component::{Component, EventTarget, InputEvent};
pub use config::PollConfig;
pub use error::{QueryError, ServerError};
pub use harness::Harness;
pub use query::ElementRef;
pub use server::{MockHandler, MockResponse, MockServer, ReceivedRequest};
pub use suite::{Suite, SuiteReport, TestOutcome, TestStatus};
pub use tree::{Element, ElementPath, Role};

/// Install a fmt subscriber honoring `RUST_LOG`, defaulting to `info`.
/// Safe to call from every test; repeat calls are no-ops.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
