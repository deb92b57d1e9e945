use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::app::App;
use crate::config::Placement;
use crate::display::number_width;
use crate::navigator::GridPos;
use crate::text_layout::{COLUMN_GAP, LayoutRow};
use crate::theme::Theme;

const INPUT_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 1;
const TEXT_PADDING: u16 = 1;
const MODE_LINE_FG: Color = Color::Black;
const STATUS_HELP_TEXT: &str =
    "C-n/C-p move | M-v focus | C-l toggle | M-g goto | C-j choose | Tab edit | Esc quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub main: Rect,
    pub display: Rect,
    pub input: Rect,
    pub status: Rect,
}

pub fn screen_areas(screen: Rect, app: &App) -> ScreenAreas {
    let display_height = app.display().height(screen.height);
    let [rest, input, status] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(screen);
    let (main, display) = match app.display().options().placement {
        Placement::AboveInput => {
            let [main, display] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(display_height)])
                    .areas(rest);
            (main, display)
        }
        Placement::Top => {
            let [display, main] =
                Layout::vertical([Constraint::Length(display_height), Constraint::Min(0)])
                    .areas(rest);
            (main, display)
        }
    };
    ScreenAreas {
        main,
        display,
        input,
        status,
    }
}

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let areas = screen_areas(frame.area(), app);

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.screen_bg)),
        frame.area(),
    );
    render_main_area(frame, areas.main, app, theme);
    if app.display().is_visible() {
        render_display(frame, areas.display, app, theme);
    }
    render_input(frame, areas.input, app, theme);

    let (status_text, status_fg) = match app.status() {
        Some(message) => (message.to_string(), theme.error_fg),
        None => (status_line_text(app), theme.muted_fg),
    };
    frame.render_widget(
        Paragraph::new(status_text).style(Style::default().bg(theme.screen_bg).fg(status_fg)),
        areas.status,
    );
}

fn status_line_text(app: &App) -> String {
    if app.is_mode_active() {
        STATUS_HELP_TEXT.to_string()
    } else {
        format!("{STATUS_HELP_TEXT} | F2 tandem: off")
    }
}

fn render_main_area(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    if area.height == 0 {
        return;
    }
    let text = match app.session() {
        Some(session) if session.is_multiple() => {
            format!("Select {} (comma separated)", session.kind())
        }
        Some(session) => format!("Select {}", session.kind()),
        None => "No active session".to_string(),
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.screen_bg).fg(theme.muted_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.screen_bg))
                    .padding(Padding::horizontal(TEXT_PADDING)),
            ),
        area,
    );
}

fn render_display(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let Some(surface) = app.surface() else {
        return;
    };
    let options = app.display().options();
    let mode_line_height = if options.hide_mode_line { 0 } else { 1 };
    let [body, mode_line] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(mode_line_height.min(area.height)),
    ])
    .areas(area);

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.display_bg)),
        body,
    );

    let focused = app.focus().point;
    let lines = display_lines(app, theme, body.width);
    let scroll = display_scroll(focused, body.height);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(theme.display_bg).fg(theme.text_fg))
            .scroll((scroll, 0)),
        body,
    );

    if mode_line_height > 0 && mode_line.height > 0 {
        let total = surface.candidates().len();
        let position = focused_ordinal(app)
            .map(|n| format!(" [{n}/{total}]"))
            .unwrap_or_default();
        let label = format!(" {total} candidates{position}");
        let fg = if app.focus().in_display() {
            theme.active_fg
        } else {
            MODE_LINE_FG
        };
        frame.render_widget(
            Paragraph::new(label).style(Style::default().bg(theme.mode_line_bg).fg(fg)),
            mode_line,
        );
    }
}

fn focused_ordinal(app: &App) -> Option<usize> {
    let surface = app.surface()?;
    let point = app.focus().point?;
    surface
        .rows()
        .get(point.row)?
        .items()?
        .get(point.col)
        .map(|index| index + 1)
}

fn display_scroll(focused: Option<GridPos>, body_height: u16) -> u16 {
    let Some(point) = focused else {
        return 0;
    };
    let visible = body_height.max(1) as usize;
    point.row.saturating_sub(visible - 1) as u16
}

fn display_lines(app: &App, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let Some(surface) = app.surface() else {
        return Vec::new();
    };
    let options = app.display().options();
    let items = surface.candidates().items();
    let numbers = app.shows_line_numbers();
    let number_cols = if numbers {
        number_width(items.len())
    } else {
        0
    };
    let widest = items
        .iter()
        .map(|c| c.text.chars().count())
        .max()
        .unwrap_or(0) as u16;
    let cell_width = if surface.columns() > 1 {
        widest.saturating_add(number_cols).saturating_add(COLUMN_GAP)
    } else {
        width
    };
    let focused = app.focus().point;
    let in_display = app.focus().in_display();

    let mut lines = Vec::with_capacity(surface.rows().len());
    let mut item_row = 0usize;
    for (row_idx, row) in surface.rows().iter().enumerate() {
        match row {
            LayoutRow::Header(title) => {
                lines.push(Line::from(Span::styled(
                    title.clone(),
                    Style::default()
                        .fg(theme.header_fg)
                        .add_modifier(Modifier::BOLD),
                )));
            }
            LayoutRow::Items(indices) => {
                let row_bg = if options.stripes && item_row % 2 == 1 {
                    theme.stripe_bg
                } else {
                    theme.display_bg
                };
                item_row += 1;
                let mut spans = Vec::new();
                for (col, index) in indices.iter().enumerate() {
                    let Some(candidate) = items.get(*index) else {
                        continue;
                    };
                    let is_point = focused == Some(GridPos { row: row_idx, col });
                    let (bg, fg) = match (is_point, in_display) {
                        (true, true) => (theme.selection_bg, theme.active_fg),
                        (true, false) => (theme.selection_bg, theme.muted_fg),
                        _ => (row_bg, theme.text_fg),
                    };
                    if numbers {
                        spans.push(Span::styled(
                            format!(
                                "{:>w$} ",
                                index + 1,
                                w = number_cols.saturating_sub(1) as usize
                            ),
                            Style::default().bg(row_bg).fg(theme.line_number_fg),
                        ));
                    }
                    let text_width = cell_width.saturating_sub(number_cols) as usize;
                    spans.push(Span::styled(
                        format!("{:<text_width$}", candidate.text),
                        Style::default().bg(bg).fg(fg),
                    ));
                }
                lines.push(Line::from(spans).style(Style::default().bg(row_bg)));
            }
        }
    }
    lines
}

fn render_input(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.input_bg)),
        area,
    );
    if area.width == 0 || area.height == 0 {
        return;
    }

    if let Some(digits) = app.line_prompt() {
        let prompt = "Goto line: ";
        frame.render_widget(
            Paragraph::new(format!("{prompt}{digits}"))
                .style(Style::default().bg(theme.input_bg).fg(theme.active_fg)),
            area,
        );
        let col = (prompt.chars().count() + digits.chars().count()) as u16;
        frame.set_cursor_position((
            area.x.saturating_add(col.min(area.width.saturating_sub(1))),
            area.y,
        ));
        return;
    }

    let Some(session) = app.session() else {
        return;
    };
    let prompt_fg = if app.focus().in_display() {
        theme.muted_fg
    } else {
        theme.active_fg
    };
    let line = Line::from(vec![
        Span::styled(
            session.prompt().to_string(),
            Style::default().fg(prompt_fg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(session.text().to_string(), Style::default().fg(theme.text_fg)),
    ]);
    let prompt_width = session.prompt().chars().count() as u16;
    let cursor_col = prompt_width.saturating_add(session.cursor() as u16);
    let scroll = cursor_col.saturating_sub(area.width.saturating_sub(1));
    frame.render_widget(
        Paragraph::new(line)
            .style(Style::default().bg(theme.input_bg))
            .scroll((0, scroll)),
        area,
    );

    if !app.focus().in_display() {
        frame.set_cursor_position((
            area.x.saturating_add(cursor_col.saturating_sub(scroll)),
            area.y,
        ));
    }
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;
