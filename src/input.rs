use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, Focus};
use crate::slider::Handle;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Single-line text input with a char-indexed cursor.
#[derive(Debug, Default, Clone)]
pub struct TextField {
  pub value: String,
  pub cursor: usize,
  /// Horizontal scroll offset in display columns, maintained by the renderer.
  pub scroll: usize,
}

impl TextField {
  pub fn with_value(value: &str) -> Self {
    Self { value: value.to_string(), cursor: value.chars().count(), scroll: 0 }
  }

  pub fn set(&mut self, value: &str) {
    *self = Self::with_value(value);
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  pub fn is_empty(&self) -> bool {
    self.value.is_empty()
  }

  /// Apply an editing key. Returns `false` for keys the field does not handle.
  pub fn edit(&mut self, code: KeyCode) -> bool {
    let len = self.value.chars().count();
    match code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_idx, c);
        self.cursor += 1;
      }
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let byte_idx = char_to_byte_index(&self.value, self.cursor);
          self.value.remove(byte_idx);
        }
      }
      KeyCode::Delete => {
        if self.cursor < len {
          let byte_idx = char_to_byte_index(&self.value, self.cursor);
          self.value.remove(byte_idx);
        }
      }
      KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
      KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
      KeyCode::Home => self.cursor = 0,
      KeyCode::End => self.cursor = len,
      _ => return false,
    }
    true
  }
}

// --- Event Handling ---

/// No Ctrl/Alt chord: the key may edit a text field. Shift still types capitals.
fn is_plain(key: &event::KeyEvent) -> bool {
  !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

  if ctrl && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('s') {
    if app.player.is_playing() {
      app.player.stop().await.context("Failed to stop playback")?;
    }
    return Ok(());
  }

  match key.code {
    KeyCode::Tab => {
      app.focus = app.focus.next();
      return Ok(());
    }
    KeyCode::BackTab => {
      app.focus = app.focus.prev();
      return Ok(());
    }
    KeyCode::F(5) => {
      app.trigger_run();
      return Ok(());
    }
    _ => {}
  }

  match app.focus {
    Focus::Query => handle_query_key(app, key),
    Focus::MinHandle => handle_slider_key(app, Handle::Min, key),
    Focus::MaxHandle => handle_slider_key(app, Handle::Max, key),
    Focus::Results => handle_results_key(app, key).await.context("Failed to handle results key event")?,
    Focus::VideoId => handle_video_id_key(app, key),
  }
  Ok(())
}

fn handle_query_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.trigger_run(),
    KeyCode::Esc => {
      if app.query.is_empty() {
        app.should_quit = true;
      } else {
        app.query.clear();
      }
    }
    KeyCode::Down => app.focus = Focus::MinHandle,
    code if is_plain(&key) => {
      app.query.edit(code);
    }
    _ => {}
  }
}

fn handle_slider_key(app: &mut App, handle: Handle, key: event::KeyEvent) {
  let fine = i64::try_from(app.slider.fine_step).unwrap_or(i64::MAX);
  let coarse = i64::try_from(app.slider.coarse_step).unwrap_or(i64::MAX);
  let step = if key.modifiers.contains(KeyModifiers::SHIFT) { coarse } else { fine };
  let before = app.slider.range();
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => app.slider.nudge(handle, -step),
    KeyCode::Right | KeyCode::Char('l') => app.slider.nudge(handle, step),
    KeyCode::PageDown => app.slider.nudge(handle, -coarse),
    KeyCode::PageUp => app.slider.nudge(handle, coarse),
    KeyCode::Home => app.slider.jump(handle, false),
    KeyCode::End => app.slider.jump(handle, true),
    KeyCode::Enter => app.trigger_run(),
    KeyCode::Up => app.focus = app.focus.prev(),
    KeyCode::Down => app.focus = app.focus.next(),
    KeyCode::Esc => app.focus = Focus::Query,
    _ => {}
  }
  // Every handle move re-runs with the new range.
  if app.slider.range() != before {
    app.trigger_run();
  }
}

async fn handle_results_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Enter => app.pick_selected_result(),
    KeyCode::Char(' ') => {
      if app.player.is_playing()
        && let Err(e) = app.player.toggle_pause().await
      {
        app.set_error(format!("Pause error: {}", e));
      }
    }
    KeyCode::Down | KeyCode::Char('j') => app.select_offset(1),
    KeyCode::Up | KeyCode::Char('k') => app.select_offset(-1),
    KeyCode::Esc => app.focus = Focus::Query,
    _ => {}
  }
  Ok(())
}

fn handle_video_id_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.trigger_embed(),
    KeyCode::Esc => {
      if app.video_id.is_empty() {
        app.focus = Focus::Query;
      } else {
        app.video_id.clear();
      }
    }
    code if is_plain(&key) => {
      app.video_id.edit(code);
    }
    _ => {}
  }
}
