//! Suite runner: strict before-all / after-each / after-all ordering.
//!
//! The context `C` is whatever shared state the suite needs, typically the
//! [`MockServer`](crate::MockServer) behind an async mutex. Hooks and test
//! bodies receive it as an `Arc<C>`; nothing here is a global.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures_util::future::BoxFuture;
use tracing::{error, info, warn};

type Hook<C> = Arc<dyn Fn(Arc<C>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

struct TestCase<C> {
    name: String,
    body: Hook<C>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed(String),
    /// Not run because a lifecycle hook failed earlier in the suite.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
}

#[derive(Debug)]
pub struct SuiteReport {
    pub suite: String,
    pub outcomes: Vec<TestOutcome>,
    /// Why the suite stopped running tests early, if it did.
    pub aborted: Option<String>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.aborted.is_none()
            && self
                .outcomes
                .iter()
                .all(|o| o.status == TestStatus::Passed)
    }

    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Skipped))
    }

    fn count(&self, pred: impl Fn(&TestStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

pub struct Suite<C> {
    name: String,
    ctx: Arc<C>,
    before_all: Vec<Hook<C>>,
    after_each: Vec<Hook<C>>,
    after_all: Vec<Hook<C>>,
    tests: Vec<TestCase<C>>,
}

impl<C: Send + Sync + 'static> Suite<C> {
    pub fn new(name: impl Into<String>, ctx: C) -> Self {
        Self {
            name: name.into(),
            ctx: Arc::new(ctx),
            before_all: Vec::new(),
            after_each: Vec::new(),
            after_all: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// Shared context handle, for assertions after the run.
    pub fn context(&self) -> Arc<C> {
        Arc::clone(&self.ctx)
    }

    pub fn before_all<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.before_all.push(Self::hook(f));
        self
    }

    pub fn after_each<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.after_each.push(Self::hook(f));
        self
    }

    pub fn after_all<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.after_all.push(Self::hook(f));
        self
    }

    pub fn test<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.tests.push(TestCase {
            name: name.into(),
            body: Self::hook(f),
        });
        self
    }

    fn hook<F, Fut>(f: F) -> Hook<C>
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Arc::new(move |ctx| Box::pin(f(ctx)))
    }

    /// Execute the suite. Ordering is strict: every before-all hook, then per
    /// test the body followed by every after-each hook regardless of the
    /// body's outcome, then every after-all hook.
    ///
    /// A failing before-all or after-each hook marks the environment
    /// untrustworthy: remaining tests are skipped and the abort reason lands
    /// on the report. After-all hooks still run so held resources (the mock
    /// server above all) get released.
    pub async fn run(self) -> SuiteReport {
        let mut report = SuiteReport {
            suite: self.name.clone(),
            outcomes: Vec::new(),
            aborted: None,
        };
        info!(suite = %self.name, tests = self.tests.len(), "running suite");

        for hook in &self.before_all {
            if let Err(err) = hook(Arc::clone(&self.ctx)).await {
                error!(suite = %self.name, error = %format!("{err:#}"), "before-all hook failed, aborting suite");
                report.aborted = Some(format!("before-all hook failed: {err:#}"));
                break;
            }
        }

        for test in &self.tests {
            if report.aborted.is_some() {
                report.outcomes.push(TestOutcome {
                    name: test.name.clone(),
                    status: TestStatus::Skipped,
                });
                continue;
            }

            let status = Self::run_test(Arc::clone(&self.ctx), test).await;
            report.outcomes.push(TestOutcome {
                name: test.name.clone(),
                status,
            });

            for hook in &self.after_each {
                if let Err(err) = hook(Arc::clone(&self.ctx)).await {
                    error!(suite = %self.name, error = %format!("{err:#}"), "after-each hook failed, aborting remaining tests");
                    report.aborted = Some(format!("after-each hook failed: {err:#}"));
                    break;
                }
            }
        }

        for hook in &self.after_all {
            if let Err(err) = hook(Arc::clone(&self.ctx)).await {
                error!(suite = %self.name, error = %format!("{err:#}"), "after-all hook failed");
                report
                    .aborted
                    .get_or_insert_with(|| format!("after-all hook failed: {err:#}"));
            }
        }

        info!(
            suite = %self.name,
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "suite finished"
        );
        report
    }

    async fn run_test(ctx: Arc<C>, test: &TestCase<C>) -> TestStatus {
        info!(test = %test.name, "running test");
        // The body runs on its own task so an assert! panic surfaces as a
        // join error instead of tearing down the runner.
        match tokio::spawn((test.body)(ctx)).await {
            Ok(Ok(())) => {
                info!(test = %test.name, "passed");
                TestStatus::Passed
            }
            Ok(Err(err)) => {
                warn!(test = %test.name, error = %format!("{err:#}"), "failed");
                TestStatus::Failed(format!("{err:#}"))
            }
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    match join_err.into_panic().downcast::<String>() {
                        Ok(text) => *text,
                        Err(payload) => match payload.downcast::<&'static str>() {
                            Ok(text) => (*text).to_string(),
                            Err(_) => "test panicked".to_string(),
                        },
                    }
                } else {
                    "test task was cancelled".to_string()
                };
                warn!(test = %test.name, %message, "panicked");
                TestStatus::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    type Log = Mutex<Vec<String>>;

    fn record(log: &Arc<Log>, entry: &str) {
        log.lock().push(entry.to_string());
    }

    #[tokio::test]
    async fn hooks_run_in_strict_order() {
        let suite = Suite::new("order", Log::default())
            .before_all(|log: Arc<Log>| async move {
                record(&log, "before_all");
                Ok(())
            })
            .after_each(|log: Arc<Log>| async move {
                record(&log, "after_each");
                Ok(())
            })
            .after_all(|log: Arc<Log>| async move {
                record(&log, "after_all");
                Ok(())
            })
            .test("first", |log: Arc<Log>| async move {
                record(&log, "test:first");
                Ok(())
            })
            .test("second", |log: Arc<Log>| async move {
                record(&log, "test:second");
                Ok(())
            });

        let log = suite.context();
        let report = suite.run().await;
        assert!(report.all_passed(), "unexpected report: {report:?}");
        assert_eq!(
            *log.lock(),
            vec![
                "before_all",
                "test:first",
                "after_each",
                "test:second",
                "after_each",
                "after_all",
            ]
        );
    }

    #[tokio::test]
    async fn failing_body_does_not_stop_the_run() {
        let report = Suite::new("failures", ())
            .test("bad", |_| async { anyhow::bail!("expected 4, got 5") })
            .test("good", |_| async { Ok(()) })
            .run()
            .await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.passed(), 1);
        assert!(report.aborted.is_none());
        assert_eq!(
            report.outcomes[0].status,
            TestStatus::Failed("expected 4, got 5".to_string())
        );
    }

    #[tokio::test]
    async fn panicking_body_is_a_failure_not_a_crash() {
        let report = Suite::new("panics", ())
            .test("boom", |_| async {
                assert_eq!(1 + 1, 3, "arithmetic is broken");
                Ok(())
            })
            .test("calm", |_| async { Ok(()) })
            .run()
            .await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.passed(), 1);
        match &report.outcomes[0].status {
            TestStatus::Failed(message) => {
                assert!(message.contains("arithmetic is broken"), "got: {message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn before_all_failure_skips_every_test_but_runs_after_all() {
        let suite = Suite::new("broken-setup", Log::default())
            .before_all(|_| async { anyhow::bail!("could not bind") })
            .after_all(|log: Arc<Log>| async move {
                record(&log, "after_all");
                Ok(())
            })
            .test("never runs", |log: Arc<Log>| async move {
                record(&log, "test");
                Ok(())
            });

        let log = suite.context();
        let report = suite.run().await;
        assert_eq!(report.skipped(), 1);
        assert!(report
            .aborted
            .as_deref()
            .unwrap()
            .contains("before-all hook failed"));
        assert_eq!(*log.lock(), vec!["after_all"]);
    }

    #[tokio::test]
    async fn after_each_failure_aborts_remaining_tests() {
        let report = Suite::new("broken-teardown", ())
            .after_each(|_| async { anyhow::bail!("reset failed") })
            .test("first", |_| async { Ok(()) })
            .test("second", |_| async { Ok(()) })
            .run()
            .await;

        assert_eq!(report.passed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(report
            .aborted
            .as_deref()
            .unwrap()
            .contains("after-each hook failed"));
    }
}
