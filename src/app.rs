use std::time::Instant;

use crate::candidates::{Candidate, CandidateSource, StaticSource};
use crate::commit::{self, CommitOutcome};
use crate::config::TandemConfig;
use crate::display::{CandidateDisplay, DisplaySurface};
use crate::error::TandemError;
use crate::lifecycle::{Hook, Lifecycle, ListenerTable};
use crate::navigator::{
    FocusPointer, Step, Surface, candidate_at, first_position, last_position, position_of, step,
};
use crate::session::{InputSession, SessionId, SessionSpec};
use crate::watcher::{InputWatcher, RefreshTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Committed(String),
    Aborted,
}

pub struct App {
    pub running: bool,
    pub ticks: u64,
    config: TandemConfig,
    source: Box<dyn CandidateSource>,
    session: Option<InputSession>,
    next_session_id: u64,
    watcher: InputWatcher,
    display: CandidateDisplay,
    focus: FocusPointer,
    listeners: ListenerTable,
    lifecycle: Lifecycle,
    line_prompt: Option<String>,
    status: Option<String>,
    outcome: Option<SessionOutcome>,
    viewport_height: u16,
}

impl Default for App {
    fn default() -> Self {
        Self::new(
            TandemConfig::default(),
            Box::new(StaticSource::default()),
        )
    }
}

impl App {
    pub fn new(config: TandemConfig, source: Box<dyn CandidateSource>) -> Self {
        let display = CandidateDisplay::new(config.display.clone());
        let mut app = Self {
            running: true,
            ticks: 0,
            config,
            source,
            session: None,
            next_session_id: 0,
            watcher: InputWatcher::default(),
            display,
            focus: FocusPointer::default(),
            listeners: ListenerTable::default(),
            lifecycle: Lifecycle::default(),
            line_prompt: None,
            status: None,
            outcome: None,
            viewport_height: 24,
        };
        app.lifecycle.start(&mut app.listeners);
        app
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.ticks = self.ticks.saturating_add(1);
        if let Some(ticket) = self.watcher.poll(now) {
            self.apply_refresh(ticket);
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn session(&self) -> Option<&InputSession> {
        self.session.as_ref()
    }

    pub fn display(&self) -> &CandidateDisplay {
        &self.display
    }

    pub fn surface(&self) -> Option<&DisplaySurface> {
        self.display.surface()
    }

    pub fn focus(&self) -> &FocusPointer {
        &self.focus
    }

    #[cfg(test)]
    pub fn watcher(&self) -> &InputWatcher {
        &self.watcher
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn take_outcome(&mut self) -> Option<SessionOutcome> {
        self.outcome.take()
    }

    pub fn line_prompt(&self) -> Option<&str> {
        self.line_prompt.as_deref()
    }

    pub fn is_mode_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn shows_line_numbers(&self) -> bool {
        self.config.display.line_numbers || self.line_prompt.is_some()
    }

    pub fn focused_candidate(&self) -> Option<&Candidate> {
        let surface = self.display.surface()?;
        let index = candidate_at(surface.rows(), self.focus.point?)?;
        surface.candidate(index)
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport_height = height;
        let focused = self.focused_index();
        if self.display.set_width(width) {
            self.focus.point = focused.and_then(|index| {
                self.display
                    .surface()
                    .and_then(|surface| position_of(surface.rows(), index))
            });
            self.focus.goal_col = self.focus.point.map(|pos| pos.col);
        }
    }

    pub fn page_rows(&self) -> usize {
        let mode_line = if self.config.display.hide_mode_line {
            0
        } else {
            1
        };
        self.display
            .height(self.viewport_height)
            .saturating_sub(mode_line)
            .max(1) as usize
    }

    pub fn start_session(&mut self, spec: SessionSpec) -> SessionId {
        if self.session.is_some() {
            self.end_session(SessionOutcome::Aborted);
        }
        self.next_session_id = self.next_session_id.wrapping_add(1);
        let id = SessionId(self.next_session_id);
        let session = InputSession::new(id, spec);
        tracing::info!(
            session = id.0,
            kind = session.kind(),
            multiple = session.is_multiple(),
            "session started"
        );
        let passlisted = self.config.is_passlisted(session.kind());
        self.session = Some(session);
        self.focus = FocusPointer::default();
        self.outcome = None;

        if passlisted
            && self.listeners.is_listening(Hook::SessionSetup)
            && let Some(session) = self.session.as_ref()
        {
            let ticket = self.watcher.manual_ticket(session);
            self.apply_refresh(ticket);
        }
        id
    }

    pub fn abort(&mut self) {
        if self.session.is_some() {
            self.end_session(SessionOutcome::Aborted);
        }
    }

    pub fn toggle_mode(&mut self) -> bool {
        if self.lifecycle.is_active() {
            self.lifecycle.stop(&mut self.listeners);
            self.watcher.cancel();
            false
        } else {
            self.lifecycle.start(&mut self.listeners);
            true
        }
    }

    pub fn input_char(&mut self, c: char, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.insert_char(c);
        self.focus.focus_input();
        self.after_change(now);
    }

    pub fn backward_delete_or_updir(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.backward_delete_or_updir() {
            self.focus.focus_input();
            self.after_change(now);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.move_cursor_left();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.move_cursor_right();
        }
    }

    pub fn move_cursor_home(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.move_cursor_home();
        }
    }

    pub fn move_cursor_end(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.move_cursor_end();
        }
    }

    pub fn show_display(&mut self) -> Result<(), TandemError> {
        let session = self.session.as_ref().ok_or(TandemError::NoActiveSession)?;
        let ticket = self.watcher.manual_ticket(session);
        self.display
            .show(session, self.source.as_ref(), ticket.generation)?;
        self.after_display_replaced();
        Ok(())
    }

    pub fn hide_display(&mut self) {
        self.display.hide();
        self.after_display_hidden();
    }

    pub fn toggle_display(&mut self) -> Result<(), TandemError> {
        let session = self.session.as_ref().ok_or(TandemError::NoActiveSession)?;
        let generation = self.watcher.manual_ticket(session).generation;
        if self.display.toggle(session, self.source.as_ref(), generation)? {
            self.after_display_replaced();
        } else {
            self.after_display_hidden();
        }
        Ok(())
    }

    pub fn focus_input(&mut self) -> Result<(), TandemError> {
        self.require_session()?;
        self.focus.focus_input();
        Ok(())
    }

    pub fn focus_display_or_toggle(&mut self) -> Result<(), TandemError> {
        self.require_session()?;
        if self.focus.in_display() || !self.display.is_visible() {
            self.focus.focus_input();
            return Ok(());
        }
        let point = self.focus.point.or_else(|| {
            self.display
                .surface()
                .and_then(|surface| first_position(surface.rows()))
        });
        match point {
            Some(pos) => self.focus.focus_display_at(pos),
            None => self.focus.surface = Surface::Display,
        }
        Ok(())
    }

    pub fn next(&mut self, n: usize) -> Result<(), TandemError> {
        self.require_session()?;
        match self.focus.surface {
            Surface::Input => self.switch_to_top(),
            Surface::Display => {
                self.step_display(n.max(1) as isize);
                Ok(())
            }
        }
    }

    pub fn previous(&mut self, n: usize) -> Result<(), TandemError> {
        self.require_session()?;
        match self.focus.surface {
            Surface::Input => self.switch_to_bottom(),
            Surface::Display => {
                self.step_display(-(n.max(1) as isize));
                Ok(())
            }
        }
    }

    pub fn switch_to_top(&mut self) -> Result<(), TandemError> {
        self.ensure_display()?;
        let first = self
            .display
            .surface()
            .and_then(|surface| first_position(surface.rows()));
        if let Some(pos) = first {
            self.focus.focus_display_at(pos);
        }
        Ok(())
    }

    pub fn switch_to_bottom(&mut self) -> Result<(), TandemError> {
        self.ensure_display()?;
        let last = self
            .display
            .surface()
            .and_then(|surface| last_position(surface.rows()));
        if let Some(pos) = last {
            self.focus.focus_display_at(pos);
        }
        Ok(())
    }

    pub fn first_candidate(&mut self) -> Result<(), TandemError> {
        self.require_session()?;
        if !self.focus.in_display() {
            return Ok(());
        }
        self.switch_to_top()
    }

    pub fn last_candidate(&mut self) -> Result<(), TandemError> {
        self.require_session()?;
        if !self.focus.in_display() {
            return Ok(());
        }
        self.switch_to_bottom()
    }

    pub fn goto_line(&mut self, n: usize) -> Result<(), TandemError> {
        self.require_session()?;
        let max = self
            .display
            .surface()
            .map(|surface| surface.candidates().len())
            .unwrap_or(0);
        if n == 0 || n > max {
            return Err(TandemError::LineOutOfRange { requested: n, max });
        }
        let pos = self
            .display
            .surface()
            .and_then(|surface| position_of(surface.rows(), n - 1))
            .ok_or(TandemError::NoCandidateHere)?;
        self.focus.focus_display_at(pos);
        self.choose_and_exit()
    }

    pub fn begin_line_prompt(&mut self) -> Result<(), TandemError> {
        self.require_session()?;
        if !self.display.is_visible() {
            return Err(TandemError::NoCandidateHere);
        }
        self.line_prompt = Some(String::new());
        Ok(())
    }

    pub fn line_prompt_input(&mut self, c: char) {
        if let Some(prompt) = self.line_prompt.as_mut()
            && c.is_ascii_digit()
        {
            prompt.push(c);
        }
    }

    pub fn line_prompt_backspace(&mut self) {
        if let Some(prompt) = self.line_prompt.as_mut() {
            prompt.pop();
        }
    }

    pub fn submit_line_prompt(&mut self) -> Result<(), TandemError> {
        let Some(prompt) = self.line_prompt.take() else {
            return Ok(());
        };
        let requested = prompt.parse::<usize>().unwrap_or(0);
        self.goto_line(requested)
    }

    pub fn choose_and_exit(&mut self) -> Result<(), TandemError> {
        let text = self.candidate_text_at_point()?;
        let session = self.session.as_mut().ok_or(TandemError::NoActiveSession)?;
        if let CommitOutcome::Exit(text) = commit::choose_and_exit(session, &text) {
            self.end_session(SessionOutcome::Committed(text));
        }
        Ok(())
    }

    pub fn choose_dwim(&mut self, now: Instant) -> Result<(), TandemError> {
        let text = self.candidate_text_at_point()?;
        let session = self.session.as_mut().ok_or(TandemError::NoActiveSession)?;
        let outcome = commit::choose_dwim(
            session,
            &text,
            self.config.multi_select_force_complete,
            self.source.as_ref(),
        )?;
        match outcome {
            CommitOutcome::Exit(text) => self.end_session(SessionOutcome::Committed(text)),
            CommitOutcome::Continue => {
                self.focus.surface = Surface::Display;
                self.after_change(now);
            }
        }
        Ok(())
    }

    pub fn edit_candidate(&mut self, now: Instant) -> Result<(), TandemError> {
        let text = self.candidate_text_at_point()?;
        let session = self.session.as_mut().ok_or(TandemError::NoActiveSession)?;
        commit::edit_candidate(session, &text);
        self.focus.focus_input();
        self.after_change(now);
        Ok(())
    }

    pub fn submit_input(&mut self) -> Result<(), TandemError> {
        let text = self
            .session
            .as_ref()
            .ok_or(TandemError::NoActiveSession)?
            .text()
            .to_string();
        self.end_session(SessionOutcome::Committed(text));
        Ok(())
    }

    pub fn keyboard_quit_dwim(&mut self) {
        if self.line_prompt.is_some() {
            self.line_prompt = None;
        } else if self.focus.in_display() {
            self.focus.focus_input();
        } else if self.display.is_visible() {
            self.hide_display();
        } else {
            self.abort();
        }
    }

    pub fn apply_refresh(&mut self, ticket: RefreshTicket) -> bool {
        if !self.watcher.is_current(&ticket, self.session.as_ref()) {
            tracing::trace!(generation = ticket.generation, "stale refresh ignored");
            return false;
        }
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let shown = self
            .display
            .show(session, self.source.as_ref(), ticket.generation)
            .map(|_| ());
        match shown {
            Ok(()) => {
                self.after_display_replaced();
                true
            }
            Err(TandemError::Aborted) => {
                tracing::debug!("refresh interrupted, unwinding session");
                self.end_session(SessionOutcome::Aborted);
                false
            }
            Err(err) => {
                tracing::debug!(%err, "refresh failed");
                false
            }
        }
    }

    fn after_change(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if self.config.remove_shadowed_file_names {
            session.remove_shadowed_prefix();
        }
        if !self.listeners.is_listening(Hook::InputChanged) {
            return;
        }
        let visible = self.display.is_visible();
        if let Some(ticket) = self.watcher.on_change(&self.config, session, visible, now) {
            self.apply_refresh(ticket);
        }
    }

    fn after_display_replaced(&mut self) {
        if !self.focus.in_display() {
            self.focus.reset_point();
            return;
        }
        let first = self
            .display
            .surface()
            .and_then(|surface| first_position(surface.rows()));
        match first {
            Some(pos) => self.focus.focus_display_at(pos),
            None => {
                self.focus.focus_input();
                self.focus.reset_point();
            }
        }
    }

    fn after_display_hidden(&mut self) {
        self.line_prompt = None;
        self.focus.focus_input();
        self.focus.reset_point();
    }

    fn end_session(&mut self, outcome: SessionOutcome) {
        self.watcher.cancel();
        self.display.hide();
        self.focus = FocusPointer::default();
        self.line_prompt = None;
        if let Some(session) = self.session.take() {
            tracing::info!(session = session.id().0, ?outcome, "session ended");
        }
        self.outcome = Some(outcome);
    }

    fn ensure_display(&mut self) -> Result<(), TandemError> {
        self.require_session()?;
        if !self.display.is_visible() {
            self.show_display()?;
        }
        Ok(())
    }

    fn step_display(&mut self, delta: isize) {
        let Some(point) = self.focus.point else {
            self.focus.focus_input();
            return;
        };
        let goal = self.focus.goal_col.unwrap_or(point.col);
        let moved = self
            .display
            .surface()
            .map(|surface| step(surface.rows(), point, goal, delta))
            .unwrap_or(Step::Boundary);
        match moved {
            Step::Moved(pos) => {
                self.focus.surface = Surface::Display;
                self.focus.point = Some(pos);
                self.focus.goal_col = Some(goal);
            }
            Step::Boundary => self.focus.focus_input(),
        }
    }

    fn focused_index(&self) -> Option<usize> {
        let surface = self.display.surface()?;
        candidate_at(surface.rows(), self.focus.point?)
    }

    fn candidate_text_at_point(&self) -> Result<String, TandemError> {
        self.require_session()?;
        self.focused_candidate()
            .map(|candidate| candidate.text.clone())
            .ok_or(TandemError::NoCandidateHere)
    }

    fn require_session(&self) -> Result<&InputSession, TandemError> {
        self.session.as_ref().ok_or(TandemError::NoActiveSession)
    }
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
