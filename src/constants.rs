//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so there is no runtime file
//! I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,
  pub title: String,

  // YouTube Data API
  pub api_base_url: String,
  pub watch_url_prefix: String,
  pub thumbnail_url_prefix: String,
  pub max_results: u32,
  pub http_timeout_secs: u64,

  // Subscriber-count slider
  pub subscriber_floor: u64,
  pub subscriber_ceiling: u64,
  pub default_subscriber_min: u64,
  pub default_subscriber_max: u64,
  pub slider_fine_step: u64,
  pub slider_coarse_step: u64,

  // Text
  pub query_placeholder: String,
  pub player_placeholder: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time and covered by a unit test below.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.app_name, "nichetube");
    assert!(c.max_results <= 50);
  }

  #[test]
  fn slider_defaults_lie_within_domain() {
    let c = constants();
    assert!(c.subscriber_floor <= c.default_subscriber_min);
    assert!(c.default_subscriber_min < c.default_subscriber_max);
    assert!(c.default_subscriber_max <= c.subscriber_ceiling);
    assert!(c.slider_fine_step <= c.slider_coarse_step);
  }
}
