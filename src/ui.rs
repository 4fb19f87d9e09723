use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Cell, Padding, Paragraph, Row, Table},
};

use crate::app::{App, Focus};
use crate::constants::constants;
use crate::graphics::{ThumbnailWidget, fit_thumbnail};
use crate::input::TextField;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

fn panel<'a>(theme: &Theme, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(color))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, body_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(10), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());
  let [sidebar_area, main_area] = Layout::horizontal([Constraint::Length(36), Constraint::Min(40)]).areas(body_area);

  render_header(frame, theme, header_area);
  render_sidebar(frame, app, sidebar_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let title = format!(" ▶ {} ", constants().title);
  let left = Line::from(Span::styled(title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

// --- Sidebar ---

fn render_sidebar(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = panel(theme, " Search keyword & thresholds ", false).padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [query_area, slider_area, hint_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Length(6), Constraint::Min(0)]).areas(inner);

  let focused = app.focus == Focus::Query;
  render_text_field(frame, theme, &mut app.query, query_area, " Keyword ", &constants().query_placeholder, focused);
  render_slider(frame, app, slider_area);

  let hint = vec![
    Line::from(Span::styled("Enter or a handle move re-runs.", Style::default().fg(theme.muted))),
    Line::from(Span::styled("Shift+←/→ moves a handle faster.", Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(hint), hint_area);
}

fn render_text_field(
  frame: &mut Frame,
  theme: &Theme,
  field: &mut TextField,
  area: Rect,
  title: &str,
  placeholder: &str,
  focused: bool,
) {
  let block = panel(theme, title, focused).padding(Padding::horizontal(1));
  let inner_w = (area.width.saturating_sub(4) as usize).max(1);
  let cursor_col = display_width(&field.value, field.cursor);

  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let paragraph = if field.value.is_empty() {
    Paragraph::new(Span::styled(placeholder.to_string(), Style::default().fg(theme.muted)))
  } else {
    let scroll = field.scroll;
    let visible: String = field
      .value
      .chars()
      .scan(0usize, |col, c| {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= scroll)
      .take_while(|(start, _, _)| *start < scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(block), area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - field.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_slider(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let focused = matches!(app.focus, Focus::MinHandle | Focus::MaxHandle);
  let block = panel(theme, " Subscriber count ", focused).padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let range = app.slider.range();
  let (floor, ceiling) = app.slider.bounds();
  let width = inner.width as usize;
  let lo = app.slider.column(range.min, width);
  let hi = app.slider.column(range.max, width);

  let handle_style = |focus: Focus| {
    if app.focus == focus {
      Style::default().fg(theme.highlight_fg).bg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    }
  };

  let mut track: Vec<Span> = Vec::with_capacity(width);
  for col in 0..width {
    let span = if col == lo {
      Span::styled("●", handle_style(Focus::MinHandle))
    } else if col == hi {
      Span::styled("●", handle_style(Focus::MaxHandle))
    } else if col > lo && col < hi {
      Span::styled("━", Style::default().fg(theme.accent))
    } else {
      Span::styled("─", Style::default().fg(theme.border))
    };
    track.push(span);
  }

  let values = format!("{} – {}", group_thousands(range.min), group_thousands(range.max));
  let edges = format!("{:<w$}", group_thousands(floor), w = width.saturating_sub(group_thousands(ceiling).len()));
  let lines = vec![
    Line::from(Span::styled(values, Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(track),
    Line::from(vec![
      Span::styled(edges, Style::default().fg(theme.muted)),
      Span::styled(group_thousands(ceiling), Style::default().fg(theme.muted)),
    ]),
  ];
  frame.render_widget(Paragraph::new(lines), inner);
}

// --- Main area ---

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let [params_area, results_area, video_id_area, player_area] = Layout::vertical([
    Constraint::Length(4),
    Constraint::Min(6),
    Constraint::Length(3),
    Constraint::Percentage(35),
  ])
  .areas(area);

  render_params(frame, app, params_area);
  render_results(frame, app, results_area);
  let theme = app.theme();
  let focused = app.focus == Focus::VideoId;
  render_text_field(frame, theme, &mut app.video_id, video_id_area, " Video ID ", "Enter a video ID", focused);
  render_player(frame, app, player_area);
}

/// Echo of the parameters behind the rows on screen, not the live sidebar values.
fn render_params(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (query, range) = match &app.shown_params {
    Some(p) => (p.query.as_str(), p.range),
    None => (app.query.value.as_str(), app.slider.range()),
  };
  let label = |s: &'static str| Span::styled(s, Style::default().fg(theme.muted));
  let lines = vec![
    Line::from(vec![label("- Search query: "), Span::styled(query.to_string(), Style::default().fg(theme.fg))]),
    Line::from(vec![
      label("- Subscriber threshold: "),
      Span::styled(
        format!("{}-{}", group_thousands(range.min), group_thousands(range.max)),
        Style::default().fg(theme.fg),
      ),
    ]),
  ];
  let block = panel(theme, " Selected parameters ", false).padding(Padding::horizontal(1));
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Results;
  let title = match &app.shown_params {
    Some(p) => format!(" Results · {} videos for '{}' ", app.results.len(), truncate_str(&p.query, 24)),
    None => " Results ".to_string(),
  };
  let block = panel(theme, title, focused);

  if app.results.is_empty() {
    let text = match (&app.warning, app.is_running()) {
      (_, true) => "Searching…".to_string(),
      (Some(w), false) => w.clone(),
      (None, false) => "Press Enter in the sidebar to search.".to_string(),
    };
    let color = if app.warning.is_some() { theme.warning } else { theme.muted };
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).style(Style::default().fg(color)).block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  let header = Row::new(["Video ID", "Title", "Views", "Channel", "Subscribers"].map(Cell::from))
    .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));

  let rows: Vec<Row> = app
    .results
    .iter()
    .enumerate()
    .map(|(i, r)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      Row::new([
        Cell::from(r.video_id.clone()),
        Cell::from(r.title.clone()),
        Cell::from(Line::from(group_thousands(r.view_count)).alignment(Alignment::Right)),
        Cell::from(r.channel_title.clone()),
        Cell::from(Line::from(group_thousands(r.subscriber_count)).alignment(Alignment::Right)),
      ])
      .style(Style::default().fg(theme.fg))
      .bg(bg)
    })
    .collect();

  let widths = [
    Constraint::Length(12),
    Constraint::Fill(3),
    Constraint::Length(14),
    Constraint::Fill(1),
    Constraint::Length(12),
  ];
  let table = Table::new(rows, widths)
    .header(header)
    .block(block)
    .highlight_symbol("▶ ")
    .row_highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_player(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(embedded) = app.player.embedded.as_ref() else {
    let placeholder = Paragraph::new(app.player_placeholder())
      .alignment(Alignment::Center)
      .style(Style::default().fg(theme.muted))
      .block(panel(theme, " Video player ", false));
    frame.render_widget(placeholder, area);
    return;
  };

  let block = panel(theme, " Video player ", false);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [thumb_area, info_area] = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(inner);

  let needs_resize = match &app.gfx.resized_thumb {
    Some((id, cached_area, _)) => *id != embedded.video_id || *cached_area != thumb_area,
    None => true,
  };
  if needs_resize {
    let resized = fit_thumbnail(&embedded.thumbnail, thumb_area, app.player.display_mode);
    app.gfx.resized_thumb = Some((embedded.video_id.clone(), thumb_area, resized));
  }
  if let Some((_, _, ref resized)) = app.gfx.resized_thumb {
    frame.render_widget(ThumbnailWidget { image: resized, display_mode: app.player.display_mode }, thumb_area);
  }

  let inner_w = info_area.width.saturating_sub(2) as usize;
  let state = if app.player.is_playing() {
    if app.player.paused { "paused in mpv" } else { "playing in mpv" }
  } else {
    "not playing"
  };
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(embedded.video_id.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
  ];
  if let Some(row) = app.results.iter().find(|r| r.video_id == embedded.video_id) {
    lines.push(Line::from(Span::styled(truncate_str(&row.title, inner_w), Style::default().fg(theme.fg))));
    lines.push(Line::from(Span::styled(truncate_str(&row.channel_title, inner_w), Style::default().fg(theme.muted))));
    lines.push(Line::from(""));
  }
  lines.push(Line::from(vec![
    Span::styled("Status  ", Style::default().fg(theme.muted)),
    Span::styled(state, Style::default().fg(theme.fg)),
  ]));
  lines.push(Line::from(Span::styled(
    format!("[{}]", app.player.display_mode.label().to_lowercase()),
    Style::default().fg(theme.muted),
  )));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    truncate_str(&embedded.url, inner_w),
    Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
  )));

  frame.render_widget(Paragraph::new(lines).block(Block::default().padding(Padding::horizontal(1))), info_area);
}

// --- Status & footer ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ✖  {}", err), Style::default().fg(theme.error))
  } else if let Some(warning) = &app.warning {
    (format!(" ⚠  {}", warning), Style::default().fg(theme.warning))
  } else if let Some(status) = app.player.last_mpv_status() {
    (format!(" ♪ {}", status), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  let mut keys = match app.focus {
    Focus::Query => vec![("Enter", "Search"), ("Tab", "Next")],
    Focus::MinHandle | Focus::MaxHandle => vec![("←/→", "Move"), ("Home/End", "Edge"), ("Enter", "Search")],
    Focus::Results => vec![("j/k", "Navigate"), ("Enter", "Pick video")],
    Focus::VideoId => vec![("Enter", "Display video"), ("Tab", "Next")],
  };
  if app.player.is_playing() {
    if app.focus == Focus::Results {
      keys.push(("Space", if app.player.paused { "Resume" } else { "Pause" }));
    }
    keys.push(("^s", "Stop"));
  }
  keys.push(("F5", "Re-run"));
  keys.push(("^t", "Theme"));
  keys.push(("^c", "Quit"));
  keys
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_short_string_unchanged() {
    assert_eq!(truncate_str("abc", 5), "abc");
  }

  #[test]
  fn truncate_long_string_gets_ellipsis() {
    assert_eq!(truncate_str("abcdef", 4), "abc…");
  }

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("ab", 2), 2);
    assert_eq!(display_width("自動化", 2), 4);
  }

  #[test]
  fn thousands_grouping() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(200000), "200,000");
    assert_eq!(group_thousands(1234567), "1,234,567");
  }
}
