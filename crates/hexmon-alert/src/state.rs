use chrono::{DateTime, Duration, Utc};
use hexmon_common::types::{AlertState, Violation};

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nothing breached, nothing was active.
    Quiet,
    /// Breached, but the cooldown holds the notification back.
    Suppressed,
    /// Notify: thresholds breached and the cooldown window has passed.
    Alert { messages: Vec<String> },
    /// Notify: everything back under its threshold.
    Recovery,
}

/// Cooldown-gated alert policy.
///
/// The machine itself is stateless; it mutates the [`AlertState`] handed to
/// each call. Alert notifications are rate-limited by the cooldown. Recovery
/// is immediate and leaves the cooldown timer untouched, so a flapping host
/// still cannot alert more than once per window.
pub struct AlertStateMachine {
    cooldown: Duration,
}

impl AlertStateMachine {
    /// Values outside chrono's representable range saturate to the maximum,
    /// which suppresses every reminder after the first alert.
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown: i64::try_from(cooldown_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn process(
        &self,
        state: &mut AlertState,
        violations: &[Violation],
        now: DateTime<Utc>,
    ) -> Decision {
        if violations.is_empty() {
            if state.active {
                state.active = false;
                return Decision::Recovery;
            }
            return Decision::Quiet;
        }

        // Elapsed means now - last >= cooldown; an unset timer never holds.
        let held = state
            .last_notified_at
            .is_some_and(|last| now - last < self.cooldown);
        if held {
            tracing::debug!(violations = violations.len(), "Alert suppressed (cooldown)");
            return Decision::Suppressed;
        }

        state.active = true;
        state.last_notified_at = Some(now);
        Decision::Alert {
            messages: violations.iter().map(|v| v.message.clone()).collect(),
        }
    }
}
