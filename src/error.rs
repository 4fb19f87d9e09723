use thiserror::Error;

/// Failure kinds of a search/enrichment run.
///
/// The presentation layer turns every kind into a warning and an empty table;
/// none of them end the session.
#[derive(Debug, Error)]
pub enum DashboardError {
  #[error("no candidate videos to enrich")]
  EmptyInput,

  #[error("request to the video platform failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("video platform returned {status}: {message}")]
  Platform { status: u16, message: String },

  #[error("malformed response from the video platform: {0}")]
  MalformedResponse(String),
}

impl DashboardError {
  /// Short message for the status line.
  pub fn user_message(&self) -> String {
    match self {
      DashboardError::EmptyInput => "No videos found.".to_string(),
      DashboardError::Transport(_) => "No videos found (could not reach YouTube).".to_string(),
      DashboardError::Platform { status, .. } => format!("No videos found (YouTube API error {}).", status),
      DashboardError::MalformedResponse(_) => "No videos found (unexpected response from YouTube).".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_kind_degrades_to_no_videos_found() {
    let errs = [
      DashboardError::EmptyInput,
      DashboardError::Platform { status: 403, message: "quotaExceeded".to_string() },
      DashboardError::MalformedResponse("bad json".to_string()),
    ];
    for err in errs {
      assert!(err.user_message().starts_with("No videos found"), "{}", err);
    }
  }

  #[test]
  fn platform_message_carries_status() {
    let err = DashboardError::Platform { status: 400, message: "keyInvalid".to_string() };
    assert!(err.user_message().contains("400"));
    assert_eq!(err.to_string(), "video platform returned 400: keyInvalid");
  }
}
