use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use std::process::Stdio;
use tokio::{
  io::{AsyncBufReadExt, BufReader as TokioBufReader},
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{info, warn};

use crate::display::DisplayMode;
use crate::youtube::watch_url;

/// A video currently shown in the player region.
#[derive(Debug, Clone)]
pub struct Embedded {
  pub video_id: String,
  pub url: String,
  pub thumbnail: DynamicImage,
}

/// Validate a user-entered video ID.
///
/// Returns `Ok(None)` for empty input (nothing to embed), the trimmed ID when
/// it has YouTube's 11-character shape, and an error otherwise. Whitespace-only
/// input is an attempt and therefore an error.
pub fn parse_video_id(input: &str) -> Result<Option<String>> {
  if input.is_empty() {
    return Ok(None);
  }
  let id = input.trim();
  let valid = id.len() == 11 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
  if !valid {
    return Err(anyhow!("'{}' is not a valid YouTube video ID", input));
  }
  Ok(Some(id.to_string()))
}

/// Player region: the thumbnail of the embedded video plus an `mpv` window.
pub struct VideoPlayer {
  pub http_client: Client,
  pub display_mode: DisplayMode,
  pub embedded: Option<Embedded>,
  pub paused: bool,
  current_process: Option<TokioChild>,
  mpv_monitor_handle: Option<JoinHandle<()>>,
  mpv_status_rx: Option<mpsc::Receiver<String>>,
  last_mpv_status: Option<String>,
  ipc_socket_path: Option<String>,
}

impl VideoPlayer {
  pub fn new(http_client: Client, display_mode: DisplayMode) -> Self {
    Self {
      http_client,
      display_mode,
      embedded: None,
      paused: false,
      current_process: None,
      mpv_monitor_handle: None,
      mpv_status_rx: None,
      last_mpv_status: None,
      ipc_socket_path: None,
    }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  /// Drain mpv's status lines and notice when the user closed its window.
  pub fn check_mpv_status(&mut self) {
    if let Some(rx) = &mut self.mpv_status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_mpv_status = Some(status);
      }
    }
    self.reap_exited();
  }

  /// Forget an mpv process that has exited on its own. The thumbnail stays.
  fn reap_exited(&mut self) {
    let Some(child) = self.current_process.as_mut() else { return };
    match child.try_wait() {
      Ok(None) => return,
      Ok(Some(status)) => info!(%status, "player: mpv exited"),
      Err(e) => warn!(err = %e, "player: lost track of mpv"),
    }
    self.current_process = None;
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
    }
    self.mpv_status_rx = None;
    self.last_mpv_status = None;
    self.paused = false;
    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
  }

  pub fn last_mpv_status(&self) -> Option<&str> {
    self.last_mpv_status.as_deref()
  }

  /// Show `video_id` in the player region and open it in `mpv`.
  ///
  /// The thumbnail stays embedded even if `mpv` cannot be started; the
  /// launch error is returned for the status line.
  pub async fn embed(&mut self, video_id: String, thumbnail: DynamicImage) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;
    let url = watch_url(&video_id);
    self.embedded = Some(Embedded { video_id, url: url.clone(), thumbnail });
    self.launch(&url).await
  }

  async fn launch(&mut self, url: &str) -> Result<()> {
    let socket_path = std::env::temp_dir().join(format!("nichetube-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Stale socket from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args([
      "--force-window=immediate",
      "--term-status-msg=${time-pos/full} / ${duration/full} | ${media-title} | ${percent-pos}%",
      &format!("--input-ipc-server={}", socket_path_str),
      url,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Piped but undrained stderr would block mpv.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    self.mpv_status_rx = Some(rx);

    let monitor_handle = tokio::spawn(async move {
      let mut lines = TokioBufReader::new(stdout).lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    info!(url = %url, "player: mpv started");
    self.current_process = Some(child);
    self.mpv_monitor_handle = Some(monitor_handle);
    self.ipc_socket_path = Some(socket_path_str);
    self.paused = false;
    Ok(())
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let cmd = b"{\"command\":[\"cycle\",\"pause\"]}\n";
    let written = stream.try_write(cmd).context("Failed to send pause command to mpv")?;
    if written < cmd.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, cmd.len()));
    }
    self.paused = !self.paused;
    Ok(())
  }

  /// Kill `mpv`. The embedded thumbnail is kept.
  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.mpv_status_rx = None;
    self.last_mpv_status = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
      info!("player: mpv stopped");
    }
    self.paused = false;

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_id_means_nothing_to_embed() {
    assert!(parse_video_id("").unwrap().is_none());
  }

  #[test]
  fn whitespace_only_id_is_an_error() {
    let err = parse_video_id("   ").unwrap_err();
    assert!(err.to_string().contains("not a valid YouTube video ID"));
  }

  #[test]
  fn well_formed_id_is_trimmed() {
    assert_eq!(parse_video_id(" dQw4w9WgXcQ ").unwrap().as_deref(), Some("dQw4w9WgXcQ"));
    assert_eq!(parse_video_id("a-b_c-d_e-f").unwrap().as_deref(), Some("a-b_c-d_e-f"));
  }

  #[test]
  fn malformed_id_is_an_error() {
    assert!(parse_video_id("short").is_err());
    assert!(parse_video_id("dQw4w9WgXcQx").is_err());
    assert!(parse_video_id("dQw4w9WgX?Q").is_err());
    let err = parse_video_id("https://youtu.be/x").unwrap_err();
    assert!(err.to_string().contains("not a valid YouTube video ID"));
  }

  #[tokio::test]
  async fn exited_mpv_is_no_longer_playing() {
    let mut player = VideoPlayer::new(Client::new(), DisplayMode::Ascii);
    player.current_process = Some(Command::new("true").spawn().unwrap());
    player.paused = true;
    player.last_mpv_status = Some("00:01 / 03:00".to_string());
    assert!(player.is_playing());

    for _ in 0..100 {
      player.check_mpv_status();
      if !player.is_playing() {
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(!player.is_playing());
    assert!(!player.paused);
    assert!(player.last_mpv_status().is_none());
  }

  #[tokio::test]
  async fn new_player_is_idle() {
    let mut player = VideoPlayer::new(Client::new(), DisplayMode::Ascii);
    assert!(!player.is_playing());
    assert!(player.embedded.is_none());
    player.stop().await.unwrap();
    player.toggle_pause().await.unwrap();
    assert!(!player.paused);
  }
}
