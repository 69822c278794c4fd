//! Transient toast notifications with deadline-based dismissal.

use std::time::{Duration, Instant};

/// How long a toast stays fully visible.
pub const TOAST_DISPLAY: Duration = Duration::from_millis(3000);
/// Exit-animation window before a toast is removed.
pub const TOAST_EXIT: Duration = Duration::from_millis(300);

/// Where a toast is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Leaving,
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    shown_at: Instant,
}

/// Emits transient user-facing notifications. Toasts expire by deadline:
/// `prune` drops anything past its display + exit window, so nothing
/// outlives the notifier itself.
#[derive(Debug)]
pub struct Notifier {
    display: Duration,
    exit: Duration,
    toasts: Vec<Toast>,
}

impl Notifier {
    pub fn new(display: Duration, exit: Duration) -> Self {
        Self {
            display,
            exit,
            toasts: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::info!("notification: {message}");
        self.toasts.push(Toast {
            message,
            shown_at: now,
        });
    }

    /// Drop every toast whose exit window has elapsed.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.display + self.exit;
        self.toasts
            .retain(|t| now.duration_since(t.shown_at) < lifetime);
    }

    /// Live toasts with their current phase, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = (&str, ToastPhase)> + '_ {
        let display = self.display;
        self.toasts.iter().map(move |t| {
            let phase = if now.duration_since(t.shown_at) < display {
                ToastPhase::Visible
            } else {
                ToastPhase::Leaving
            };
            (t.message.as_str(), phase)
        })
    }

    /// Most recently pushed message, if any is still alive.
    pub fn last_message(&self) -> Option<&str> {
        self.toasts.last().map(|t| t.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(TOAST_DISPLAY, TOAST_EXIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_moves_through_phases_and_expires() {
        let mut notifier = Notifier::default();
        let base = Instant::now();
        notifier.push("Sensors activated", base);

        let phases: Vec<_> = notifier.active(base).map(|(_, p)| p).collect();
        assert_eq!(phases, vec![ToastPhase::Visible]);

        // Still visible just under the display window.
        let phases: Vec<_> = notifier
            .active(base + Duration::from_millis(2999))
            .map(|(_, p)| p)
            .collect();
        assert_eq!(phases, vec![ToastPhase::Visible]);

        // Leaving during the exit animation.
        let phases: Vec<_> = notifier
            .active(base + Duration::from_millis(3100))
            .map(|(_, p)| p)
            .collect();
        assert_eq!(phases, vec![ToastPhase::Leaving]);

        // Removed once display + exit has elapsed.
        notifier.prune(base + Duration::from_millis(3300));
        assert!(notifier.is_empty());
    }

    #[test]
    fn prune_keeps_younger_toasts() {
        let mut notifier = Notifier::default();
        let base = Instant::now();
        notifier.push("first", base);
        notifier.push("second", base + Duration::from_millis(2000));

        notifier.prune(base + Duration::from_millis(3400));
        assert_eq!(notifier.len(), 1);
        assert_eq!(notifier.last_message(), Some("second"));
    }
}
