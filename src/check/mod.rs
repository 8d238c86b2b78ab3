//! Declarative poll-and-assert condition checks.
//!
//! A [`Check`] describes one assertion against the external system: the
//! query arguments, the expected content, how to compare and with which
//! polarity. Checks are stateless and built fresh per assertion; running
//! one blocks the calling test until the condition holds or the window
//! elapses.

mod poll;

pub use poll::poll;

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::cli::action::is_resource_present;
use crate::cli::{ActionRunner, Privilege, Scope};
use crate::error::{Error, Result};

/// Default poll interval between queries
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
/// Default overall window; slow operations override this up to 900s
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(240);

/// How observed output is compared against the expected content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpMode {
    /// Exact equality
    Compare,
    /// Substring containment
    Contain,
}

/// What a check queries for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    /// Match output content against an expected string
    Expect,
    /// Only require the resource to exist (or not)
    Present,
}

/// Whether the observed output satisfies the expected content.
///
/// The expected string matches as a whole; when it consists of exactly
/// two space-separated tokens, matching either token alone also counts.
/// That form expresses "either of two terminal values" expectations such
/// as `"COMPLIANT NON-COMPLIANT"`.
pub fn output_matches(observed: &str, expected: &str, mode: CmpMode) -> bool {
    let direct = match mode {
        CmpMode::Compare => observed == expected,
        CmpMode::Contain => observed.contains(expected),
    };
    if direct {
        return true;
    }
    let tokens: Vec<&str> = expected.split_whitespace().collect();
    if tokens.len() != 2 {
        return false;
    }
    tokens.iter().any(|token| match mode {
        CmpMode::Compare => observed == *token,
        CmpMode::Contain => observed.contains(token),
    })
}

/// A declarative condition check against the external system.
#[derive(Clone, Debug)]
pub struct Check {
    method: Method,
    privilege: Privilege,
    scope: Scope,
    mode: CmpMode,
    content: String,
    expect: bool,
    args: Vec<String>,
    interval: Duration,
    window: Duration,
}

impl Check {
    /// Check that the queried output matches (`expect = true`) or does
    /// not match (`expect = false`) the expected content.
    pub fn expect(
        privilege: Privilege,
        scope: Scope,
        mode: CmpMode,
        content: &str,
        expect: bool,
        args: &[&str],
    ) -> Self {
        Self {
            method: Method::Expect,
            privilege,
            scope,
            mode,
            content: content.to_string(),
            expect,
            args: crate::cli::action::to_args(args),
            interval: DEFAULT_INTERVAL,
            window: DEFAULT_WINDOW,
        }
    }

    /// Check that the queried resource exists (`expect = true`) or is
    /// absent (`expect = false`).
    pub fn present(privilege: Privilege, scope: Scope, expect: bool, args: &[&str]) -> Self {
        Self {
            method: Method::Present,
            privilege,
            scope,
            mode: CmpMode::Contain,
            content: String::new(),
            expect,
            args: crate::cli::action::to_args(args),
            interval: Duration::from_secs(3),
            window: Duration::from_secs(60),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Run the check, returning a timeout error carrying the last
    /// observed output when the condition never holds.
    ///
    /// Transient query errors are logged and retried until the window
    /// expires; terminal errors (a missing client binary) fail the
    /// check immediately.
    pub async fn try_check<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        match self.method {
            Method::Present => self.check_presence(runner).await,
            Method::Expect => self.check_content(runner).await,
        }
    }

    /// Run the check and panic with a descriptive message on failure.
    ///
    /// This is the assertion form used directly in test bodies.
    #[allow(clippy::panic)]
    pub async fn check<R: ActionRunner>(&self, runner: &R) {
        if let Err(e) = self.try_check(runner).await {
            panic!("check failed: {e}");
        }
    }

    async fn check_presence<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        if is_resource_present(
            runner,
            self.privilege,
            self.scope,
            &args,
            self.expect,
            self.interval,
            self.window,
        )
        .await
        {
            Ok(())
        } else {
            Err(Error::Timeout {
                what: format!("presence={} of {:?}", self.expect, self.args),
                window: self.window,
                last: None,
            })
        }
    }

    async fn check_content<R: ActionRunner>(&self, runner: &R) -> Result<()> {
        let deadline = Instant::now() + self.window;
        let mut last: Option<String> = None;
        loop {
            match runner
                .run_action("get", self.privilege, self.scope, &self.args)
                .await
            {
                Ok(output) => {
                    let matched = output_matches(&output, &self.content, self.mode);
                    if matched == self.expect {
                        debug!(
                            %output,
                            content = %self.content,
                            expect = self.expect,
                            "condition satisfied"
                        );
                        return Ok(());
                    }
                    debug!(%output, content = %self.content, "condition not met yet");
                    last = Some(output);
                }
                Err(e) if e.is_retryable() => {
                    debug!(error = %e, "query failed, retrying");
                }
                Err(e) => return Err(e),
            }
            if Instant::now() + self.interval > deadline {
                return Err(Error::Timeout {
                    what: format!(
                        "content {:?} (mode {:?}, expect {}) from get {:?}",
                        self.content, self.mode, self.expect, self.args
                    ),
                    window: self.window,
                    last,
                });
            }
            sleep(self.interval).await;
        }
    }
}
