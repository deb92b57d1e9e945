use super::*;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::candidates::Listing;
use crate::config::{ColumnLayout, DisplayOptions, ForceComplete};
use crate::session::Category;

struct RecordingSource {
    inner: StaticSource,
    queries: Rc<RefCell<Vec<String>>>,
    fail_with: Option<fn() -> TandemError>,
}

impl CandidateSource for RecordingSource {
    fn complete(&self, query: &str, session: &InputSession) -> Result<Listing, TandemError> {
        self.queries.borrow_mut().push(query.to_string());
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.inner.complete(query, session)
    }
}

struct FlakySource {
    inner: StaticSource,
    calls: Cell<usize>,
    fail_from_call: usize,
}

impl CandidateSource for FlakySource {
    fn complete(&self, query: &str, session: &InputSession) -> Result<Listing, TandemError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call >= self.fail_from_call {
            return Err(TandemError::Source("backend down".to_string()));
        }
        self.inner.complete(query, session)
    }
}

fn app_with(config: TandemConfig, lines: &str) -> (App, Rc<RefCell<Vec<String>>>) {
    let queries = Rc::new(RefCell::new(Vec::new()));
    let source = RecordingSource {
        inner: StaticSource::from_lines(lines),
        queries: Rc::clone(&queries),
        fail_with: None,
    };
    (App::new(config, Box::new(source)), queries)
}

fn failing_app(fail: fn() -> TandemError) -> (App, Rc<RefCell<Vec<String>>>) {
    let queries = Rc::new(RefCell::new(Vec::new()));
    let source = RecordingSource {
        inner: StaticSource::default(),
        queries: Rc::clone(&queries),
        fail_with: Some(fail),
    };
    (
        App::new(TandemConfig::default(), Box::new(source)),
        queries,
    )
}

fn type_text(app: &mut App, text: &str, now: Instant) {
    for c in text.chars() {
        app.input_char(c, now);
    }
}

fn shown_texts(app: &App) -> Vec<String> {
    app.surface()
        .map(|surface| {
            surface
                .candidates()
                .items()
                .iter()
                .map(|c| c.text.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn focused_text(app: &App) -> Option<String> {
    app.focused_candidate().map(|c| c.text.clone())
}

fn pick_session() -> SessionSpec {
    SessionSpec::new("pick", Category::Other)
}

const FIVE: &str = "a1\na2\na3\na4\na5\n";

#[test]
fn default_state_is_running_without_session() {
    let app = App::default();
    assert!(app.running);
    assert_eq!(app.ticks, 0);
    assert!(app.session().is_none());
    assert!(!app.display().is_visible());
    assert!(app.is_mode_active());
    assert_eq!(app.focus().surface, Surface::Input);
}

#[test]
fn tick_and_quit_update_app_state() {
    let mut app = App::default();
    app.on_tick(Instant::now());
    assert_eq!(app.ticks, 1);
    app.quit();
    assert!(!app.running);
}

#[test]
fn input_below_minimum_never_refreshes() {
    let (mut app, queries) = app_with(TandemConfig::default(), "abcd\n");
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "ab", start);
    app.on_tick(start + Duration::from_secs(10));
    assert!(!app.display().is_visible());
    assert!(queries.borrow().is_empty());
}

#[test]
fn debounced_refresh_shows_candidates_for_typed_text() {
    let (mut app, queries) = app_with(TandemConfig::default(), "abcd\nabcx\nzzz\n");
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "abc", start);
    assert!(!app.display().is_visible());

    app.on_tick(start + Duration::from_millis(299));
    assert!(!app.display().is_visible());
    app.on_tick(start + Duration::from_millis(300));
    assert_eq!(shown_texts(&app), vec!["abcd", "abcx"]);
    assert_eq!(*queries.borrow(), vec!["abc".to_string()]);
}

#[test]
fn edits_within_debounce_window_collapse_into_one_refresh() {
    let (mut app, queries) = app_with(TandemConfig::default(), "abcd\nabcx\nabcyz\n");
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "abc", start);
    app.on_tick(start + Duration::from_millis(100));
    app.input_char('y', start + Duration::from_millis(200));

    app.on_tick(start + Duration::from_millis(400));
    assert!(!app.display().is_visible());
    app.on_tick(start + Duration::from_millis(500));
    assert_eq!(shown_texts(&app), vec!["abcyz"]);
    assert_eq!(*queries.borrow(), vec!["abcy".to_string()]);

    app.on_tick(start + Duration::from_secs(5));
    assert_eq!(queries.borrow().len(), 1);
}

#[test]
fn passlisted_session_refreshes_immediately_from_setup() {
    let config = TandemConfig {
        passlist: vec!["switch-buffer".to_string()],
        ..TandemConfig::default()
    };
    let (mut app, queries) = app_with(config, "alpha\nbeta\n");
    app.start_session(SessionSpec::new("switch-buffer", Category::Other));
    assert_eq!(shown_texts(&app), vec!["alpha", "beta"]);

    app.input_char('b', Instant::now());
    assert_eq!(shown_texts(&app), vec!["beta"]);
    assert_eq!(*queries.borrow(), vec!["".to_string(), "b".to_string()]);
}

#[test]
fn blocklisted_session_only_refreshes_on_request() {
    let config = TandemConfig {
        blocklist: vec!["execute-command".to_string()],
        ..TandemConfig::default()
    };
    let (mut app, _) = app_with(config, "abcd\n");
    let start = Instant::now();
    app.start_session(SessionSpec::new("execute-command", Category::Other));
    type_text(&mut app, "abcd", start);
    app.on_tick(start + Duration::from_secs(1));
    assert!(!app.display().is_visible());

    app.toggle_display().expect("manual show");
    assert_eq!(shown_texts(&app), vec!["abcd"]);
}

#[test]
fn toggle_display_hides_then_reshows_with_focus_on_input() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(2).expect("next");
    assert_eq!(focused_text(&app).as_deref(), Some("a2"));

    app.toggle_display().expect("hide");
    assert!(!app.display().is_visible());
    assert_eq!(app.focus().surface, Surface::Input);
    assert_eq!(focused_text(&app), None);

    app.toggle_display().expect("show");
    assert!(app.display().is_visible());
    assert_eq!(shown_texts(&app).len(), 5);
    assert_eq!(app.focus().surface, Surface::Input);
}

#[test]
fn aborting_cancels_pending_refresh() {
    let (mut app, queries) = app_with(TandemConfig::default(), "abcd\n");
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "abc", start);
    app.keyboard_quit_dwim();
    assert_eq!(app.outcome(), Some(&SessionOutcome::Aborted));

    app.on_tick(start + Duration::from_secs(1));
    assert!(queries.borrow().is_empty());
    assert!(!app.display().is_visible());
}

#[test]
fn stale_ticket_from_superseded_text_is_ignored() {
    let config = TandemConfig {
        live_update_delay: Duration::ZERO,
        ..TandemConfig::default()
    };
    let (mut app, _) = app_with(config, "abcd\nabce\n");
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "abcd", start);
    let stale = RefreshTicket {
        session: app.session().unwrap().id(),
        generation: app.watcher().generation() - 1,
        text: "abc".to_string(),
    };
    assert!(!app.apply_refresh(stale));
    assert_eq!(shown_texts(&app), vec!["abcd"]);
}

#[test]
fn interrupted_refresh_unwinds_the_session() {
    let (mut app, queries) = failing_app(|| TandemError::Aborted);
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "abc", start);
    app.on_tick(start + Duration::from_secs(1));
    assert_eq!(queries.borrow().len(), 1);
    assert!(app.session().is_none());
    assert_eq!(app.outcome(), Some(&SessionOutcome::Aborted));
    assert!(app.status().is_none());
}

#[test]
fn failing_refresh_is_silent_and_keeps_session() {
    let (mut app, _) = failing_app(|| TandemError::Source("backend down".to_string()));
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "abc", start);
    app.on_tick(start + Duration::from_secs(1));
    assert!(app.session().is_some());
    assert!(app.status().is_none());
    assert!(!app.display().is_visible());
}

#[test]
fn next_from_input_enters_display_at_top_and_previous_at_bottom() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(1).expect("next");
    assert!(app.display().is_visible());
    assert_eq!(app.focus().surface, Surface::Display);
    assert_eq!(focused_text(&app).as_deref(), Some("a1"));

    app.focus_input().expect("focus input");
    app.previous(1).expect("previous");
    assert_eq!(focused_text(&app).as_deref(), Some("a5"));
}

#[test]
fn next_then_previous_returns_to_same_candidate() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.next(1).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("a2"));
    app.next(2).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("a4"));
    app.previous(2).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("a2"));
    assert_eq!(app.focus().surface, Surface::Display);
}

#[test]
fn next_at_last_candidate_focuses_input_instead_of_wrapping() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.previous(1).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("a5"));
    app.next(1).unwrap();
    assert_eq!(app.focus().surface, Surface::Input);
    assert_eq!(focused_text(&app).as_deref(), Some("a5"));
}

#[test]
fn previous_at_first_candidate_focuses_input() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.previous(1).unwrap();
    assert_eq!(app.focus().surface, Surface::Input);
}

#[test]
fn overshooting_motion_counts_as_boundary() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.next(10).unwrap();
    assert_eq!(app.focus().surface, Surface::Input);
}

#[test]
fn empty_candidate_set_shows_empty_display_and_navigation_returns_to_input() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    let start = Instant::now();
    app.start_session(pick_session());
    type_text(&mut app, "zzz", start);
    app.on_tick(start + Duration::from_secs(1));
    assert!(app.display().is_visible());
    assert!(shown_texts(&app).is_empty());

    app.next(1).expect("next on empty display");
    assert_eq!(app.focus().surface, Surface::Input);

    app.focus_display_or_toggle().unwrap();
    assert_eq!(app.focus().surface, Surface::Display);
    app.next(1).expect("next inside empty display");
    assert_eq!(app.focus().surface, Surface::Input);
    app.focus_display_or_toggle().unwrap();
    app.previous(1).expect("previous inside empty display");
    assert_eq!(app.focus().surface, Surface::Input);
}

#[test]
fn focus_display_or_toggle_alternates_between_surfaces() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.focus_display_or_toggle().unwrap();
    assert_eq!(app.focus().surface, Surface::Input);

    app.show_display().unwrap();
    app.focus_display_or_toggle().unwrap();
    assert_eq!(app.focus().surface, Surface::Display);
    assert_eq!(focused_text(&app).as_deref(), Some("a1"));
    app.focus_display_or_toggle().unwrap();
    assert_eq!(app.focus().surface, Surface::Input);
    app.focus_display_or_toggle().unwrap();
    assert_eq!(app.focus().surface, Surface::Display);
}

#[test]
fn goto_line_out_of_range_reports_bounds_and_changes_nothing() {
    let (mut app, _) = app_with(TandemConfig::default(), "a1\na2\na3\n");
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.next(1).unwrap();
    let before = *app.focus();

    let err = app.goto_line(9).expect_err("line 9 is out of range");
    assert!(matches!(
        err,
        TandemError::LineOutOfRange {
            requested: 9,
            max: 3
        }
    ));
    assert_eq!(*app.focus(), before);
    assert!(app.session().is_some());
    assert!(app.goto_line(0).is_err());
}

#[test]
fn goto_line_commits_the_numbered_candidate() {
    let (mut app, _) = app_with(TandemConfig::default(), "a1\na2\na3\n");
    app.start_session(pick_session());
    app.show_display().unwrap();
    app.goto_line(2).expect("goto line 2");
    assert_eq!(
        app.outcome(),
        Some(&SessionOutcome::Committed("a2".to_string()))
    );
    assert!(!app.display().is_visible());
}

#[test]
fn line_prompt_turns_on_numbers_until_submitted() {
    let (mut app, _) = app_with(TandemConfig::default(), "a1\na2\na3\n");
    app.start_session(pick_session());
    assert!(app.begin_line_prompt().is_err());
    app.show_display().unwrap();
    assert!(!app.shows_line_numbers());

    app.begin_line_prompt().unwrap();
    assert!(app.shows_line_numbers());
    app.line_prompt_input('3');
    app.line_prompt_input('x');
    assert_eq!(app.line_prompt(), Some("3"));
    app.submit_line_prompt().unwrap();
    assert_eq!(
        app.take_outcome(),
        Some(SessionOutcome::Committed("a3".to_string()))
    );
    assert!(!app.shows_line_numbers());
}

#[test]
fn choose_and_exit_requires_a_candidate() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    assert!(matches!(
        app.choose_and_exit(),
        Err(TandemError::NoCandidateHere)
    ));
    app.next(1).unwrap();
    app.next(1).unwrap();
    app.choose_and_exit().unwrap();
    assert_eq!(
        app.outcome(),
        Some(&SessionOutcome::Committed("a2".to_string()))
    );
}

#[test]
fn commands_without_session_report_it() {
    let mut app = App::default();
    assert!(matches!(app.next(1), Err(TandemError::NoActiveSession)));
    assert!(matches!(
        app.toggle_display(),
        Err(TandemError::NoActiveSession)
    ));
    assert!(matches!(
        app.choose_and_exit(),
        Err(TandemError::NoActiveSession)
    ));
}

#[test]
fn choose_dwim_in_multi_select_appends_and_returns_to_display() {
    let (mut app, _) = app_with(TandemConfig::default(), "red\ngreen\nblue\n");
    let start = Instant::now();
    app.start_session(SessionSpec::new("pick-colors", Category::Other).multiple(true));
    app.next(1).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("red"));

    app.choose_dwim(start).expect("dwim");
    assert_eq!(app.session().unwrap().text(), "red,");
    assert_eq!(app.focus().surface, Surface::Display);
    assert!(app.outcome().is_none());

    app.on_tick(start + Duration::from_secs(1));
    assert_eq!(shown_texts(&app), vec!["red", "green", "blue"]);
    assert_eq!(app.focus().surface, Surface::Display);
    assert_eq!(focused_text(&app).as_deref(), Some("red"));
}

#[test]
fn choose_dwim_honors_force_complete_policy() {
    let config = TandemConfig {
        multi_select_force_complete: ForceComplete::BeforeAppend,
        ..TandemConfig::default()
    };
    let (mut app, _) = app_with(config, "Red\nGreen\n");
    app.start_session(
        SessionSpec::new("pick-colors", Category::Other)
            .multiple(true)
            .initial("re"),
    );
    app.show_display().unwrap();
    app.next(1).unwrap();
    app.choose_dwim(Instant::now()).unwrap();
    assert_eq!(app.session().unwrap().text(), "Red,");
}

#[test]
fn choose_dwim_in_single_select_exits() {
    let (mut app, _) = app_with(TandemConfig::default(), "red\n");
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.choose_dwim(Instant::now()).unwrap();
    assert_eq!(
        app.outcome(),
        Some(&SessionOutcome::Committed("red".to_string()))
    );
}

#[test]
fn edit_candidate_before_visiting_display_fails() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.show_display().unwrap();
    let err = app
        .edit_candidate(Instant::now())
        .expect_err("no candidate visited yet");
    assert!(matches!(err, TandemError::NoCandidateHere));
    assert_eq!(app.session().unwrap().text(), "");
}

#[test]
fn edit_candidate_copies_into_input_without_exiting() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.next(2).unwrap();
    app.edit_candidate(Instant::now()).unwrap();
    let session = app.session().expect("session stays open");
    assert_eq!(session.text(), "a3");
    assert_eq!(app.focus().surface, Surface::Input);
    assert!(app.outcome().is_none());
}

#[test]
fn keyboard_quit_dwim_backs_out_one_level_at_a_time() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session());
    app.next(1).unwrap();
    app.begin_line_prompt().unwrap();

    app.keyboard_quit_dwim();
    assert!(app.line_prompt().is_none());
    assert_eq!(app.focus().surface, Surface::Display);
    app.keyboard_quit_dwim();
    assert_eq!(app.focus().surface, Surface::Input);
    assert!(app.display().is_visible());
    app.keyboard_quit_dwim();
    assert!(!app.display().is_visible());
    assert!(app.session().is_some());
    app.keyboard_quit_dwim();
    assert_eq!(app.outcome(), Some(&SessionOutcome::Aborted));
}

#[test]
fn submit_input_commits_raw_text() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    app.start_session(pick_session().initial("free text"));
    app.submit_input().unwrap();
    assert_eq!(
        app.outcome(),
        Some(&SessionOutcome::Committed("free text".to_string()))
    );
}

#[test]
fn stopped_mode_disables_live_refresh_but_not_manual_show() {
    let (mut app, queries) = app_with(TandemConfig::default(), "abcd\n");
    let start = Instant::now();
    assert!(!app.toggle_mode());
    app.start_session(pick_session());
    type_text(&mut app, "abcd", start);
    app.on_tick(start + Duration::from_secs(1));
    assert!(queries.borrow().is_empty());

    app.show_display().unwrap();
    assert_eq!(shown_texts(&app), vec!["abcd"]);
    assert!(app.toggle_mode());
}

#[test]
fn file_sessions_drop_shadowed_prefix_and_go_up_directories() {
    let (mut app, _) = app_with(TandemConfig::default(), "");
    let now = Instant::now();
    app.start_session(SessionSpec::new("find-file", Category::File).initial("/usr/share/"));
    app.input_char('~', now);
    app.input_char('/', now);
    assert_eq!(app.session().unwrap().text(), "~/");

    type_text(&mut app, "src/", now);
    app.backward_delete_or_updir(now);
    assert_eq!(app.session().unwrap().text(), "~/");
}

#[test]
fn multi_column_rows_preserve_column() {
    let config = TandemConfig {
        display: DisplayOptions {
            layout: ColumnLayout::MultiColumn,
            ..DisplayOptions::default()
        },
        ..TandemConfig::default()
    };
    let (mut app, _) = app_with(config, "aa\nbb\ncc\ndd\nee\nff\n");
    app.start_session(pick_session());
    // cell width = 2 + number width 2 + gap 2; (16 + 2) / 6 = 3 columns
    app.set_viewport(16, 40);
    app.next(1).unwrap();
    assert_eq!(app.surface().unwrap().columns(), 3);
    app.focus_input().unwrap();
    app.previous(1).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("ff"));
    app.previous(1).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("cc"));

    app.set_viewport(6, 40);
    assert_eq!(app.surface().unwrap().columns(), 1);
    assert_eq!(focused_text(&app).as_deref(), Some("cc"));
}

#[test]
fn starting_a_new_session_replaces_the_active_one() {
    let (mut app, _) = app_with(TandemConfig::default(), FIVE);
    let first = app.start_session(pick_session());
    app.show_display().unwrap();
    let second = app.start_session(pick_session());
    assert_ne!(first, second);
    assert!(!app.display().is_visible());
    assert_eq!(app.session().unwrap().id(), second);
}

#[test]
fn choose_dwim_failure_during_force_complete_keeps_input() {
    let config = TandemConfig {
        multi_select_force_complete: ForceComplete::BeforeAppend,
        ..TandemConfig::default()
    };
    let source = FlakySource {
        inner: StaticSource::from_lines("red\ngreen\n"),
        calls: Cell::new(0),
        fail_from_call: 2,
    };
    let mut app = App::new(config, Box::new(source));
    app.start_session(
        SessionSpec::new("pick-colors", Category::Other).multiple(true),
    );
    app.show_display().unwrap();
    app.next(1).unwrap();
    assert_eq!(focused_text(&app).as_deref(), Some("red"));

    let result = app.choose_dwim(Instant::now());
    assert!(matches!(result, Err(TandemError::Source(_))));
    assert_eq!(app.session().unwrap().text(), "");
    assert_eq!(app.focus().surface, Surface::Display);
    assert_eq!(focused_text(&app).as_deref(), Some("red"));
    assert!(app.outcome().is_none());
}
