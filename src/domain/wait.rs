// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cancellable poll-until-condition helpers.

use crate::infrastructure::kubernetes::{ApplicationPhase, VelaKubeClient};
use colored::Colorize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Done,
    Pending(String),
    Failed(String),
    /// The watched object no longer exists.
    Gone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    TimedOut { last_detail: Option<String> },
    Failed(String),
    Vanished,
    Cancelled,
}

/// Run `probe` immediately and then every `interval` until it settles, the
/// timeout elapses or `cancel` fires. A timeout too large to represent
/// never expires.
pub async fn poll_until<F, Fut>(
    settings: PollSettings,
    cancel: &CancellationToken,
    mut probe: F,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe>,
{
    let deadline = Instant::now().checked_add(settings.timeout);
    let mut last_detail = None;

    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        match probe().await {
            Probe::Done => return PollOutcome::Succeeded,
            Probe::Failed(reason) => return PollOutcome::Failed(reason),
            Probe::Gone => return PollOutcome::Vanished,
            Probe::Pending(detail) => {
                debug!(%detail, "condition not met yet");
                last_detail = Some(detail);
            }
        }

        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return PollOutcome::TimedOut { last_detail };
                }
                settings.interval.min(deadline - now)
            }
            None => settings.interval,
        };

        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(wait) => {}
        }
    }
}

/// Wait for an Application to reach `running`.
pub async fn wait_application_running(
    client: &dyn VelaKubeClient,
    namespace: &str,
    name: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> PollOutcome {
    poll_until(settings, cancel, || async move {
        match client.get_application(namespace, name).await {
            Ok(None) => Probe::Gone,
            Ok(Some(app)) => match app.phase() {
                Some(ApplicationPhase::Running) => Probe::Done,
                Some(phase) if phase.is_failed() => {
                    Probe::Failed(format!("application {} is in phase {}", name, phase))
                }
                phase => {
                    let phase = phase
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "pending".to_string());
                    println!(
                        "  {} application {} is in phase: {}",
                        "⏳".yellow(),
                        name,
                        phase
                    );
                    Probe::Pending(format!("phase {}", phase))
                }
            },
            Err(e) => Probe::Failed(e.to_string()),
        }
    })
    .await
}

/// Wait for an Application to disappear after deletion.
pub async fn wait_application_deleted(
    client: &dyn VelaKubeClient,
    namespace: &str,
    name: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> PollOutcome {
    poll_until(settings, cancel, || async move {
        match client.get_application(namespace, name).await {
            Ok(None) => Probe::Done,
            Ok(Some(_)) => Probe::Pending(format!("application {} still exists", name)),
            Err(e) => Probe::Failed(e.to_string()),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::fake::FakeKubeClient;
    use crate::infrastructure::kubernetes::{Application, ApplicationSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> PollSettings {
        PollSettings::new(Duration::from_millis(5), Duration::from_millis(200))
    }

    fn app(name: &str) -> Application {
        let mut app = Application::new(name, ApplicationSpec::default());
        app.metadata.namespace = Some("vela-system".into());
        app
    }

    #[tokio::test]
    async fn test_poll_succeeds_after_pending_probes() {
        let calls = AtomicUsize::new(0);
        let outcome = poll_until(fast(), &CancellationToken::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Probe::Pending(format!("attempt {}", n))
                } else {
                    Probe::Done
                }
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_times_out_with_last_detail() {
        let settings = PollSettings::new(Duration::from_millis(5), Duration::from_millis(20));
        let outcome = poll_until(settings, &CancellationToken::new(), || async {
            Probe::Pending("still rendering".into())
        })
        .await;

        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                last_detail: Some("still rendering".into())
            }
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_never_expires() {
        let settings = PollSettings::new(Duration::from_millis(1), Duration::MAX);
        let calls = AtomicUsize::new(0);
        let outcome = poll_until(settings, &CancellationToken::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Probe::Pending("waiting".into())
                } else {
                    Probe::Done
                }
            }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_poll_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = poll_until(fast(), &cancel, || async { Probe::Done }).await;
        assert_eq!(outcome, PollOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_wait_running_distinguishes_outcomes() {
        let client = FakeKubeClient::new();
        let cancel = CancellationToken::new();

        client.insert_application(app("ok"));
        client.set_phase("vela-system", "ok", "running");
        assert_eq!(
            wait_application_running(&client, "vela-system", "ok", fast(), &cancel).await,
            PollOutcome::Succeeded
        );

        client.insert_application(app("broken"));
        client.set_phase("vela-system", "broken", "workflowFailed");
        assert!(matches!(
            wait_application_running(&client, "vela-system", "broken", fast(), &cancel).await,
            PollOutcome::Failed(_)
        ));

        assert_eq!(
            wait_application_running(&client, "vela-system", "missing", fast(), &cancel).await,
            PollOutcome::Vanished
        );
    }

    #[tokio::test]
    async fn test_wait_deleted() {
        let client = FakeKubeClient::new();
        let outcome = wait_application_deleted(
            &client,
            "vela-system",
            "gone",
            fast(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, PollOutcome::Succeeded);
    }
}
