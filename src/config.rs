use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::constants;
use crate::model::SubscriberRange;

/// User preferences persisted to `prefs.toml` in the config directory.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Initial slider position; falls back to the built-in default.
  pub subscriber_min: Option<u64>,
  pub subscriber_max: Option<u64>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", &constants().app_name) {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file) {
        return Self::parse(&content);
      }
    }
    Self::default()
  }

  fn parse(content: &str) -> Self {
    match toml::from_str(content) {
      Ok(config) => config,
      Err(e) => {
        warn!(err = %e, "config: ignoring unreadable prefs.toml");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", &constants().app_name) {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Starting subscriber range, clamped into the slider domain.
  pub fn initial_range(&self) -> SubscriberRange {
    let c = constants();
    let min = self.subscriber_min.unwrap_or(c.default_subscriber_min).clamp(c.subscriber_floor, c.subscriber_ceiling);
    let max = self.subscriber_max.unwrap_or(c.default_subscriber_max).clamp(c.subscriber_floor, c.subscriber_ceiling);
    if min <= max {
      SubscriberRange::new(min, max)
    } else {
      SubscriberRange::new(c.default_subscriber_min, c.default_subscriber_max)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_full_prefs() {
    let config = Config::parse("theme_name = \"paper\"\nsubscriber_min = 100\nsubscriber_max = 5000\n");
    assert_eq!(config.theme_name.as_deref(), Some("paper"));
    assert_eq!(config.initial_range(), SubscriberRange::new(100, 5000));
  }

  #[test]
  fn unreadable_prefs_fall_back_to_default() {
    assert_eq!(Config::parse("theme_name = ["), Config::default());
  }

  #[test]
  fn default_range_comes_from_constants() {
    let c = constants();
    assert_eq!(
      Config::default().initial_range(),
      SubscriberRange::new(c.default_subscriber_min, c.default_subscriber_max)
    );
  }

  #[test]
  fn inverted_prefs_range_is_replaced() {
    let config = Config { theme_name: None, subscriber_min: Some(9_000), subscriber_max: Some(10) };
    let c = constants();
    assert_eq!(config.initial_range(), SubscriberRange::new(c.default_subscriber_min, c.default_subscriber_max));
  }

  #[test]
  fn prefs_range_is_clamped_to_ceiling() {
    let config = Config { theme_name: None, subscriber_min: Some(10), subscriber_max: Some(u64::MAX) };
    assert_eq!(config.initial_range().max, constants().subscriber_ceiling);
  }
}
