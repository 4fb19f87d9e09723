use anyhow::Result;
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::TableState};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::error::DashboardError;
use crate::input::TextField;
use crate::model::{ResultRow, SubscriberRange};
use crate::pipeline::Pipeline;
use crate::player::{VideoPlayer, parse_video_id};
use crate::slider::RangeSlider;
use crate::theme::{THEMES, Theme, theme_index};
use crate::youtube::fetch_thumbnail;

// --- Types ---

/// Parameters a run was started with, echoed next to its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
  pub query: String,
  pub range: SubscriberRange,
}

pub type RunResult = (RunParams, Result<Vec<ResultRow>, DashboardError>);
pub type EmbedResult = Result<(String, DynamicImage)>;

/// Which widget receives keys. Tab order follows the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Query,
  MinHandle,
  MaxHandle,
  Results,
  VideoId,
}

impl Focus {
  const ORDER: [Focus; 5] = [Focus::Query, Focus::MinHandle, Focus::MaxHandle, Focus::Results, Focus::VideoId];

  fn position(self) -> usize {
    Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
  }

  pub fn next(self) -> Self {
    Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
  }

  pub fn prev(self) -> Self {
    Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
  }
}

/// Turn a run outcome into table rows plus an optional warning.
/// Every error kind degrades to an empty table; none is fatal.
pub fn degrade(result: Result<Vec<ResultRow>, DashboardError>) -> (Vec<ResultRow>, Option<String>) {
  match result {
    Ok(rows) if rows.is_empty() => (rows, Some("No videos found in this subscriber range.".to_string())),
    Ok(rows) => (rows, None),
    Err(e) => {
      warn!(err = %e, "pipeline: run degraded to empty result");
      (Vec::new(), Some(e.user_message()))
    }
  }
}

/// Cached thumbnail resized for the current player area.
#[derive(Default)]
pub struct GraphicsCache {
  pub resized_thumb: Option<(String, Rect, DynamicImage)>,
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) run_rx: Option<oneshot::Receiver<RunResult>>,
  pub(crate) embed_rx: Option<oneshot::Receiver<EmbedResult>>,
}

pub struct App {
  pub query: TextField,
  pub slider: RangeSlider,
  pub video_id: TextField,
  pub focus: Focus,
  pub theme_index: usize,
  pub results: Vec<ResultRow>,
  pub table_state: TableState,
  /// Parameters of the run whose rows are on screen.
  pub shown_params: Option<RunParams>,
  pub player: VideoPlayer,
  pub last_error: Option<String>,
  /// Degraded-run message, shown until the next run completes.
  pub warning: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  pub gfx: GraphicsCache,
  pipeline: Pipeline,
  pub(crate) tasks: AsyncTasks,
  /// When the last error was set, for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(pipeline: Pipeline, player: VideoPlayer, config: &Config) -> Self {
    Self {
      query: TextField::default(),
      slider: RangeSlider::subscribers(config.initial_range()),
      video_id: TextField::default(),
      focus: Focus::Query,
      theme_index: theme_index(config.theme_name.as_deref()),
      results: Vec::new(),
      table_state: TableState::default(),
      shown_params: None,
      player,
      last_error: None,
      warning: None,
      status_message: None,
      should_quit: false,
      gfx: GraphicsCache::default(),
      pipeline,
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // theme_index only ever comes from theme_index() or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  pub fn config(&self) -> Config {
    let range = self.slider.range();
    Config {
      theme_name: Some(self.theme().name.to_string()),
      subscriber_min: Some(range.min),
      subscriber_max: Some(range.max),
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config().save();
  }

  pub fn is_running(&self) -> bool {
    self.tasks.run_rx.is_some()
  }

  /// Start a full search/enrich/filter run with the current sidebar values.
  /// A pending run is superseded: its result is dropped when it arrives.
  pub fn trigger_run(&mut self) {
    let params = RunParams { query: self.query.value.clone(), range: self.slider.range() };
    info!(query = %params.query, min = params.range.min, max = params.range.max, "run triggered");
    self.clear_error();
    self.status_message = Some(format!("Searching '{}'…", params.query));

    let pipeline = self.pipeline.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = pipeline.run(&params.query, params.range).await;
      let _ = tx.send((params, result));
    });
    self.tasks.run_rx = Some(rx);
  }

  /// Embed the video named in the video-ID field. Empty input does nothing.
  pub fn trigger_embed(&mut self) {
    let video_id = match parse_video_id(&self.video_id.value) {
      Ok(Some(id)) => id,
      Ok(None) => return,
      Err(e) => {
        self.set_error(format!("Could not display video: {}", e));
        return;
      }
    };

    info!(video_id = %video_id, "embed triggered");
    self.clear_error();
    self.status_message = Some("Loading video…".to_string());
    let client = self.player.http_client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = fetch_thumbnail(&client, &video_id).await.map(|thumb| (video_id, thumb));
      let _ = tx.send(result);
    });
    self.tasks.embed_rx = Some(rx);
  }

  pub fn apply_run(&mut self, params: RunParams, result: Result<Vec<ResultRow>, DashboardError>) {
    let (rows, warning) = degrade(result);
    self.table_state.select(if rows.is_empty() { None } else { Some(0) });
    self.results = rows;
    self.warning = warning;
    self.shown_params = Some(params);
  }

  pub async fn check_pending(&mut self) -> Result<()> {
    if let Some(mut rx) = self.tasks.run_rx.take() {
      match rx.try_recv() {
        Ok((params, result)) => {
          self.status_message = None;
          self.apply_run(params, result);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.run_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.embed_rx.take() {
      match rx.try_recv() {
        Ok(Ok((video_id, thumbnail))) => {
          self.status_message = None;
          self.gfx.resized_thumb = None;
          if let Err(e) = self.player.embed(video_id, thumbnail).await {
            self.set_error(format!("Could not start player: {:#}", e));
          }
        }
        Ok(Err(e)) => {
          self.status_message = None;
          self.set_error(format!("Could not display video: {:#}", e));
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.embed_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Video task failed.".to_string());
        }
      }
    }

    Ok(())
  }

  pub fn select_offset(&mut self, delta: isize) {
    let count = self.results.len();
    if count == 0 {
      return;
    }
    let current = self.table_state.selected().unwrap_or(0);
    let next = (current as isize + delta).rem_euclid(count as isize) as usize;
    self.table_state.select(Some(next));
  }

  /// Copy the selected row's video ID into the player input.
  pub fn pick_selected_result(&mut self) {
    let Some(row) = self.table_state.selected().and_then(|i| self.results.get(i)) else { return };
    let id = row.video_id.clone();
    self.video_id.set(&id);
    self.focus = Focus::VideoId;
  }

  /// Text shown in the player region when nothing is embedded.
  pub fn player_placeholder(&self) -> &'static str {
    &constants().player_placeholder
  }
}


#[cfg(test)]
mod tests {
  use super::testing::{app, settle};
  use super::*;

  fn row(id: &str) -> ResultRow {
    ResultRow {
      video_id: id.to_string(),
      title: "t".to_string(),
      view_count: 1,
      channel_title: "c".to_string(),
      subscriber_count: 1,
    }
  }

  // --- Focus ---

  #[test]
  fn focus_cycles_both_ways() {
    assert_eq!(Focus::Query.next(), Focus::MinHandle);
    assert_eq!(Focus::VideoId.next(), Focus::Query);
    assert_eq!(Focus::Query.prev(), Focus::VideoId);
  }

  // --- degrade ---

  #[test]
  fn degrade_errors_to_empty_table_with_warning() {
    let (rows, warning) = degrade(Err(DashboardError::EmptyInput));
    assert!(rows.is_empty());
    assert_eq!(warning.as_deref(), Some("No videos found."));
  }

  #[test]
  fn degrade_keeps_rows() {
    let (rows, warning) = degrade(Ok(vec![row("a")]));
    assert_eq!(rows.len(), 1);
    assert!(warning.is_none());
  }

  #[test]
  fn degrade_empty_rows_warns() {
    let (_, warning) = degrade(Ok(Vec::new()));
    assert!(warning.is_some());
  }

  // --- runs ---

  #[tokio::test]
  async fn run_populates_table_and_echo() {
    let mut app = app();
    app.query.set("test");
    app.trigger_run();
    assert!(app.status_message.is_some());
    settle(&mut app).await;
    assert_eq!(app.results.len(), 1);
    assert_eq!(app.table_state.selected(), Some(0));
    assert_eq!(app.shown_params.as_ref().map(|p| p.query.as_str()), Some("test"));
    assert!(app.status_message.is_none());
    assert!(app.warning.is_none());
  }

  #[tokio::test]
  async fn failed_run_clears_previous_rows() {
    let mut app = app();
    app.results = vec![row("old")];
    let params = RunParams { query: "q".to_string(), range: SubscriberRange::new(0, 10) };
    app.apply_run(params, Err(DashboardError::MalformedResponse("x".to_string())));
    assert!(app.results.is_empty());
    assert_eq!(app.table_state.selected(), None);
    assert!(app.warning.as_deref().unwrap_or("").starts_with("No videos found"));
  }

  // --- player trigger ---

  #[test]
  fn empty_video_id_does_not_attempt_embed() {
    let mut app = app();
    app.trigger_embed();
    assert!(app.tasks.embed_rx.is_none());
    assert!(app.player.embedded.is_none());
    assert!(app.last_error.is_none());
    assert_eq!(app.player_placeholder(), "The video will be shown here.");
  }

  #[test]
  fn malformed_video_id_shows_error() {
    let mut app = app();
    app.video_id.set("nope");
    app.trigger_embed();
    assert!(app.tasks.embed_rx.is_none());
    assert!(app.last_error.as_deref().unwrap_or("").starts_with("Could not display video"));
  }

  // --- table ---

  #[test]
  fn selection_wraps_and_picks_id() {
    let mut app = app();
    app.apply_run(
      RunParams { query: String::new(), range: SubscriberRange::new(0, 10) },
      Ok(vec![row("aaaaaaaaaaa"), row("bbbbbbbbbbb")]),
    );
    app.select_offset(-1);
    assert_eq!(app.table_state.selected(), Some(1));
    app.pick_selected_result();
    assert_eq!(app.video_id.value, "bbbbbbbbbbb");
    assert_eq!(app.focus, Focus::VideoId);
  }
}
