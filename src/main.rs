use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgGroup, Parser};
use crossterm::cursor::SetCursorStyle;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use serde::Serialize;

mod app;
mod candidates;
mod commit;
mod config;
mod display;
mod error;
mod events;
mod lifecycle;
mod logging;
mod navigator;
mod session;
mod text_layout;
mod theme;
mod ui;
mod watcher;

use app::{App, SessionOutcome};
use candidates::{CandidateSet, CandidateSource, FileSource, StaticSource};
use config::TandemConfig;
use error::TandemError;
use events::AppEvent;
use session::{Category, InputSession, SessionId, SessionSpec};
use theme::Theme;

const DEFAULT_CONFIG_PATH: &str = "tandem.toml";
const ABORT_EXIT_CODE: u8 = 130;

/// Minibuffer-style picker that keeps a live candidate list in tandem with
/// the input line.
#[derive(Debug, Parser)]
#[command(name = "tandem", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["candidates", "files"])))]
struct Cli {
    /// Config file (defaults to ./tandem.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH", default_value = "theme.toml")]
    theme: PathBuf,

    /// Newline-separated candidates, or a JSON array when the file ends in .json.
    #[arg(long, value_name = "FILE")]
    candidates: Option<PathBuf>,

    /// Complete file names relative to the working directory.
    #[arg(long)]
    files: bool,

    /// Session kind, matched against the passlist and blocklist.
    #[arg(long)]
    kind: Option<String>,

    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Accept comma-separated selections.
    #[arg(long)]
    multiple: bool,

    #[arg(long, default_value = "")]
    initial: String,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,

    /// Print the candidates for QUERY and exit without opening the picker.
    #[arg(long, value_name = "QUERY")]
    print_candidates: Option<String>,

    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn session_spec(&self) -> SessionSpec {
        let category = if self.files {
            Category::File
        } else {
            Category::Other
        };
        let kind = self.kind.clone().unwrap_or_else(|| {
            if self.files {
                "file".to_string()
            } else {
                "candidate".to_string()
            }
        });
        SessionSpec::new(kind, category)
            .prompt(self.prompt.clone())
            .multiple(self.multiple)
            .initial(self.initial.clone())
    }

    fn build_source(&self) -> Result<Box<dyn CandidateSource>, TandemError> {
        if self.files {
            let home = std::env::var_os("HOME").map(PathBuf::from);
            return Ok(Box::new(
                FileSource::new(std::env::current_dir()?).with_home(home),
            ));
        }
        match &self.candidates {
            Some(path) => Ok(Box::new(StaticSource::load(path)?)),
            None => Ok(Box::new(StaticSource::default())),
        }
    }

    fn load_config(&self) -> Result<TandemConfig, TandemError> {
        match &self.config {
            Some(path) => Ok(TandemConfig::load(path)?),
            None => Ok(TandemConfig::load_or_default(DEFAULT_CONFIG_PATH)),
        }
    }
}

#[derive(Debug, Serialize)]
struct OutcomeReport<'a> {
    status: &'a str,
    text: Option<&'a str>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "tandem failed");
            eprintln!("tandem: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, TandemError> {
    logging::init(cli.log_file.as_deref())?;
    let config = cli.load_config()?;
    let source = cli.build_source()?;
    let mut stdout = io::stdout().lock();

    if let Some(query) = &cli.print_candidates {
        print_candidates(source.as_ref(), cli.session_spec(), query, cli.json, &mut stdout)?;
        return Ok(ExitCode::SUCCESS);
    }

    let theme = Theme::load_or_default(&cli.theme);
    let mut app = App::new(config, source);
    app.start_session(cli.session_spec());
    let outcome = run_terminal(&mut app, &theme)?;
    write_outcome(&outcome, cli.json, &mut stdout)?;

    Ok(match outcome {
        SessionOutcome::Committed(_) => ExitCode::SUCCESS,
        SessionOutcome::Aborted => ExitCode::from(ABORT_EXIT_CODE),
    })
}

/// Draws on stderr so stdout only ever carries the result.
fn run_terminal(app: &mut App, theme: &Theme) -> io::Result<SessionOutcome> {
    enable_raw_mode()?;

    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen, SetCursorStyle::SteadyBar)?;

    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    let result = run_app(&mut terminal, app, theme);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    theme: &Theme,
) -> io::Result<SessionOutcome> {
    let size = terminal.size()?;
    app.set_viewport(size.width, size.height);

    while app.running {
        terminal.draw(|frame| ui::render(frame, app, theme))?;
        let event = events::next_event()?;
        let now = Instant::now();
        handle_event(app, event, now);
        app.on_tick(now);
        if app.outcome().is_some() {
            app.quit();
        }
    }

    Ok(app.take_outcome().unwrap_or(SessionOutcome::Aborted))
}

fn handle_event(app: &mut App, event: AppEvent, now: Instant) {
    if app.line_prompt().is_some() && handle_line_prompt_event(app, event) {
        return;
    }
    if !matches!(event, AppEvent::Tick | AppEvent::Resize(..)) {
        app.clear_status();
    }

    let result = match event {
        AppEvent::Tick => Ok(()),
        AppEvent::Abort => {
            app.abort();
            Ok(())
        }
        AppEvent::QuitDwim => {
            app.keyboard_quit_dwim();
            Ok(())
        }
        AppEvent::InputChar(c) => {
            app.input_char(c, now);
            Ok(())
        }
        AppEvent::Backspace => {
            app.backward_delete_or_updir(now);
            Ok(())
        }
        AppEvent::CursorLeft => {
            app.move_cursor_left();
            Ok(())
        }
        AppEvent::CursorRight => {
            app.move_cursor_right();
            Ok(())
        }
        AppEvent::CursorHome => {
            app.move_cursor_home();
            Ok(())
        }
        AppEvent::CursorEnd => {
            app.move_cursor_end();
            Ok(())
        }
        AppEvent::Next => app.next(1),
        AppEvent::Previous => app.previous(1),
        AppEvent::PageDown => {
            let rows = app.page_rows();
            app.next(rows)
        }
        AppEvent::PageUp => {
            let rows = app.page_rows();
            app.previous(rows)
        }
        AppEvent::FirstCandidate => app.first_candidate(),
        AppEvent::LastCandidate => app.last_candidate(),
        AppEvent::ToggleDisplay => app.toggle_display(),
        AppEvent::FocusInput => app.focus_input(),
        AppEvent::FocusDisplayOrToggle => app.focus_display_or_toggle(),
        AppEvent::GotoLine => app.begin_line_prompt(),
        AppEvent::Submit => {
            if app.focus().in_display() {
                app.choose_and_exit()
            } else {
                app.submit_input()
            }
        }
        AppEvent::ChooseDwim => app.choose_dwim(now),
        AppEvent::EditCandidate => app.edit_candidate(now),
        AppEvent::ToggleMode => {
            let active = app.toggle_mode();
            app.set_status(if active { "tandem: on" } else { "tandem: off" });
            Ok(())
        }
        AppEvent::Resize(width, height) => {
            app.set_viewport(width, height);
            Ok(())
        }
    };
    report_error(app, result);
}

fn handle_line_prompt_event(app: &mut App, event: AppEvent) -> bool {
    let result = match event {
        AppEvent::InputChar(c) => {
            app.line_prompt_input(c);
            Ok(())
        }
        AppEvent::Backspace => {
            app.line_prompt_backspace();
            Ok(())
        }
        AppEvent::Submit | AppEvent::ChooseDwim => app.submit_line_prompt(),
        _ => return false,
    };
    report_error(app, result);
    true
}

fn report_error(app: &mut App, result: Result<(), TandemError>) {
    if let Err(err) = result {
        tracing::debug!(%err, "command failed");
        app.set_status(err.to_string());
    }
}

fn print_candidates(
    source: &dyn CandidateSource,
    spec: SessionSpec,
    query: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<(), TandemError> {
    let session = InputSession::new(SessionId(0), spec.initial(query));
    let listing = source.complete(session.field(), &session)?;
    let set = CandidateSet::new(session.field(), 0, listing.candidates);
    if json {
        let encoded = serde_json::to_string(set.items())
            .map_err(|err| TandemError::Source(err.to_string()))?;
        writeln!(out, "{encoded}")?;
    } else {
        for candidate in set.items() {
            writeln!(out, "{}", candidate.text)?;
        }
    }
    Ok(())
}

fn write_outcome(outcome: &SessionOutcome, json: bool, out: &mut impl Write) -> io::Result<()> {
    let (status, text) = match outcome {
        SessionOutcome::Committed(text) => ("committed", Some(text.as_str())),
        SessionOutcome::Aborted => ("aborted", None),
    };
    if json {
        let encoded = serde_json::to_string(&OutcomeReport { status, text })?;
        writeln!(out, "{encoded}")
    } else if let Some(text) = text {
        writeln!(out, "{text}")
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/main_tests.rs"]
mod tests;
