use std::time::{Duration, Instant};

use crate::config::{LiveCompletion, TandemConfig};
use crate::session::{InputSession, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    Immediate,
    Debounced(Duration),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blocklisted,
    LiveCompletionOff,
    DisplayHidden,
    BelowMinimum,
}

pub fn refresh_policy(
    config: &TandemConfig,
    session: &InputSession,
    display_visible: bool,
) -> RefreshPolicy {
    if config.is_passlisted(session.kind()) {
        return RefreshPolicy::Immediate;
    }
    if config.is_blocklisted(session.kind()) {
        return RefreshPolicy::Skip(SkipReason::Blocklisted);
    }
    match config.live_completion {
        LiveCompletion::Never => return RefreshPolicy::Skip(SkipReason::LiveCompletionOff),
        LiveCompletion::Visible if !display_visible => {
            return RefreshPolicy::Skip(SkipReason::DisplayHidden);
        }
        _ => {}
    }
    if session.char_len() < config.minimum_input {
        return RefreshPolicy::Skip(SkipReason::BelowMinimum);
    }
    if config.live_update_delay.is_zero() {
        RefreshPolicy::Immediate
    } else {
        RefreshPolicy::Debounced(config.live_update_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub session: SessionId,
    pub generation: u64,
    pub text: String,
}

#[derive(Debug, Clone)]
struct PendingRefresh {
    ticket: RefreshTicket,
    due: Instant,
}

/// Debounces text changes into refresh tickets. Every change and every
/// cancellation bumps the generation, which invalidates older tickets.
#[derive(Debug, Default)]
pub struct InputWatcher {
    generation: u64,
    pending: Option<PendingRefresh>,
}

impl InputWatcher {
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn on_change(
        &mut self,
        config: &TandemConfig,
        session: &InputSession,
        display_visible: bool,
        now: Instant,
    ) -> Option<RefreshTicket> {
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
        let policy = refresh_policy(config, session, display_visible);
        tracing::debug!(
            kind = session.kind(),
            generation = self.generation,
            ?policy,
            "input changed"
        );
        match policy {
            RefreshPolicy::Immediate => Some(self.ticket_for(session)),
            RefreshPolicy::Debounced(delay) => {
                self.pending = Some(PendingRefresh {
                    ticket: self.ticket_for(session),
                    due: now + delay,
                });
                None
            }
            RefreshPolicy::Skip(_) => None,
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<RefreshTicket> {
        if self.pending.as_ref().is_some_and(|pending| pending.due <= now) {
            return self.pending.take().map(|pending| pending.ticket);
        }
        None
    }

    pub fn manual_ticket(&mut self, session: &InputSession) -> RefreshTicket {
        self.pending = None;
        self.ticket_for(session)
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!(generation = self.generation, "pending refresh cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_current(&self, ticket: &RefreshTicket, session: Option<&InputSession>) -> bool {
        let Some(session) = session else {
            return false;
        };
        ticket.generation == self.generation
            && ticket.session == session.id()
            && ticket.text == session.text()
    }

    fn ticket_for(&self, session: &InputSession) -> RefreshTicket {
        RefreshTicket {
            session: session.id(),
            generation: self.generation,
            text: session.text().to_string(),
        }
    }
}
