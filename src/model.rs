//! Records flowing through one pipeline run. Nothing here outlives a run.

/// A video surfaced by the keyword search, not yet filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  pub video_id: String,
  pub channel_id: String,
}

/// Subscriber statistics for one channel.
/// `subscriber_count` is `None` when the channel hides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
  pub channel_id: String,
  pub subscriber_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStats {
  pub video_id: String,
  pub title: String,
  pub channel_title: String,
  pub view_count: u64,
}

/// Final displayed record: Candidate ⋈ ChannelStats ⋈ VideoStats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
  pub video_id: String,
  pub title: String,
  pub view_count: u64,
  pub channel_title: String,
  pub subscriber_count: u64,
}

/// Closed-open subscriber interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberRange {
  pub min: u64,
  pub max: u64,
}

impl SubscriberRange {
  pub fn new(min: u64, max: u64) -> Self {
    Self { min, max }
  }

  pub fn contains(&self, subscribers: u64) -> bool {
    self.min <= subscribers && subscribers < self.max
  }
}
