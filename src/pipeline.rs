//! Search → enrich → filter. One run issues at most three sequential calls.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DashboardError;
use crate::model::{Candidate, ResultRow, SubscriberRange};
use crate::youtube::VideoPlatform;

/// Keyword search, capped at `max_results`. An empty response is an empty vec.
pub async fn collect_candidates(
  platform: &dyn VideoPlatform,
  query: &str,
  max_results: u32,
) -> Result<Vec<Candidate>, DashboardError> {
  let candidates = platform.search(query, max_results).await?;
  info!(query = %query, count = candidates.len(), "search: collected candidates");
  Ok(candidates)
}

/// Distinct values in first-seen order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
  let mut seen = HashSet::new();
  values.filter(|v| seen.insert(*v)).map(str::to_string).collect()
}

/// Join candidates onto channel subscriber counts, keep the range, then join
/// video statistics for the survivors. Row order follows the candidate order.
pub async fn enrich_and_filter(
  platform: &dyn VideoPlatform,
  candidates: &[Candidate],
  range: SubscriberRange,
) -> Result<Vec<ResultRow>, DashboardError> {
  if candidates.is_empty() {
    return Err(DashboardError::EmptyInput);
  }

  let channel_ids = distinct(candidates.iter().map(|c| c.channel_id.as_str()));
  let subscribers: HashMap<String, u64> = platform
    .channel_stats(&channel_ids)
    .await?
    .into_iter()
    .filter_map(|stats| match stats.subscriber_count {
      Some(count) => Some((stats.channel_id, count)),
      None => {
        debug!(channel_id = %stats.channel_id, "enrich: subscriber count hidden, dropping channel");
        None
      }
    })
    .collect();

  let survivors: Vec<(&Candidate, u64)> = candidates
    .iter()
    .filter_map(|c| subscribers.get(&c.channel_id).map(|&n| (c, n)))
    .filter(|&(_, n)| range.contains(n))
    .collect();

  info!(
    channels = channel_ids.len(),
    with_counts = subscribers.len(),
    survivors = survivors.len(),
    min = range.min,
    max = range.max,
    "enrich: subscriber filter applied"
  );

  if survivors.is_empty() {
    return Ok(Vec::new());
  }

  let video_ids = distinct(survivors.iter().map(|(c, _)| c.video_id.as_str()));
  let videos: HashMap<String, _> =
    platform.video_stats(&video_ids).await?.into_iter().map(|v| (v.video_id.clone(), v)).collect();

  let rows: Vec<ResultRow> = survivors
    .into_iter()
    .filter_map(|(candidate, subscriber_count)| {
      videos.get(&candidate.video_id).map(|v| ResultRow {
        video_id: candidate.video_id.clone(),
        title: v.title.clone(),
        view_count: v.view_count,
        channel_title: v.channel_title.clone(),
        subscriber_count,
      })
    })
    .collect();

  info!(rows = rows.len(), "enrich: joined video statistics");
  Ok(rows)
}

/// The full search/enrich/filter workflow over an injected platform client.
#[derive(Clone)]
pub struct Pipeline {
  platform: Arc<dyn VideoPlatform>,
  max_results: u32,
}

impl Pipeline {
  pub fn new(platform: Arc<dyn VideoPlatform>, max_results: u32) -> Self {
    Self { platform, max_results }
  }

  /// One stateless run: nothing from earlier runs is reused.
  pub async fn run(&self, query: &str, range: SubscriberRange) -> Result<Vec<ResultRow>, DashboardError> {
    let candidates = collect_candidates(self.platform.as_ref(), query, self.max_results).await?;
    enrich_and_filter(self.platform.as_ref(), &candidates, range).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{ChannelStats, VideoStats};
  use async_trait::async_trait;
  use std::sync::Mutex;

  #[derive(Debug, Clone, PartialEq)]
  enum Call {
    Search(String, u32),
    Channels(Vec<String>),
    Videos(Vec<String>),
  }

  /// In-memory platform: fixed catalogue, records every call.
  #[derive(Default)]
  struct FakePlatform {
    candidates: Vec<Candidate>,
    channels: Vec<ChannelStats>,
    videos: Vec<VideoStats>,
    fail_channels: bool,
    calls: Mutex<Vec<Call>>,
  }

  impl FakePlatform {
    fn calls(&self) -> Vec<Call> {
      self.calls.lock().unwrap().clone()
    }

    fn video_calls(&self) -> usize {
      self.calls().iter().filter(|c| matches!(c, Call::Videos(_))).count()
    }
  }

  #[async_trait]
  impl VideoPlatform for FakePlatform {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Candidate>, DashboardError> {
      self.calls.lock().unwrap().push(Call::Search(query.to_string(), max_results));
      Ok(self.candidates.iter().take(max_results as usize).cloned().collect())
    }

    async fn channel_stats(&self, channel_ids: &[String]) -> Result<Vec<ChannelStats>, DashboardError> {
      self.calls.lock().unwrap().push(Call::Channels(channel_ids.to_vec()));
      if self.fail_channels {
        return Err(DashboardError::Platform { status: 403, message: "quotaExceeded".to_string() });
      }
      Ok(self.channels.iter().filter(|c| channel_ids.contains(&c.channel_id)).cloned().collect())
    }

    async fn video_stats(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, DashboardError> {
      self.calls.lock().unwrap().push(Call::Videos(video_ids.to_vec()));
      Ok(self.videos.iter().filter(|v| video_ids.contains(&v.video_id)).cloned().collect())
    }
  }

  fn candidate(video: &str, channel: &str) -> Candidate {
    Candidate { video_id: video.to_string(), channel_id: channel.to_string() }
  }

  fn channel(id: &str, subs: Option<u64>) -> ChannelStats {
    ChannelStats { channel_id: id.to_string(), subscriber_count: subs }
  }

  fn video(id: &str, views: u64) -> VideoStats {
    VideoStats {
      video_id: id.to_string(),
      title: format!("title {}", id),
      channel_title: format!("channel of {}", id),
      view_count: views,
    }
  }

  fn catalogue() -> FakePlatform {
    FakePlatform {
      candidates: vec![
        candidate("v1", "big"),
        candidate("v2", "small"),
        candidate("v3", "mid"),
        candidate("v4", "hidden"),
        candidate("v5", "small"),
      ],
      channels: vec![
        channel("big", Some(2_000_000)),
        channel("small", Some(150)),
        channel("mid", Some(4_999)),
        channel("hidden", None),
      ],
      videos: vec![video("v1", 900), video("v2", 800), video("v3", 700), video("v4", 600), video("v5", 500)],
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn scenario_keeps_only_channel_inside_range() {
    let fake = FakePlatform {
      candidates: vec![candidate("a", "c50"), candidate("b", "c200")],
      channels: vec![channel("c50", Some(50)), channel("c200", Some(200))],
      videos: vec![video("a", 10), video("b", 20)],
      ..Default::default()
    };
    let candidates = collect_candidates(&fake, "test", 50).await.unwrap();
    let rows = enrich_and_filter(&fake, &candidates, SubscriberRange::new(100, 5000)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].video_id, "b");
    assert_eq!(rows[0].subscriber_count, 200);
    assert_eq!(rows[0].view_count, 20);
    assert_eq!(fake.calls()[0], Call::Search("test".to_string(), 50));
  }

  #[tokio::test]
  async fn rows_satisfy_range_and_are_subset_of_input() {
    let fake = catalogue();
    let range = SubscriberRange::new(100, 5_000);
    let candidates = fake.candidates.clone();
    let rows = enrich_and_filter(&fake, &candidates, range).await.unwrap();

    let ids: Vec<&str> = rows.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["v2", "v3", "v5"]);
    for row in &rows {
      assert!(range.contains(row.subscriber_count));
      assert!(candidates.iter().any(|c| c.video_id == row.video_id));
    }
  }

  #[tokio::test]
  async fn channel_ids_are_requested_once_each() {
    let fake = catalogue();
    let candidates = fake.candidates.clone();
    enrich_and_filter(&fake, &candidates, SubscriberRange::new(0, 10)).await.unwrap();
    assert_eq!(
      fake.calls()[0],
      Call::Channels(vec!["big".to_string(), "small".to_string(), "mid".to_string(), "hidden".to_string()])
    );
  }

  #[tokio::test]
  async fn video_stats_requested_only_for_survivors() {
    let fake = catalogue();
    let candidates = fake.candidates.clone();
    enrich_and_filter(&fake, &candidates, SubscriberRange::new(1_000_000, 3_000_000)).await.unwrap();
    assert_eq!(fake.calls()[1], Call::Videos(vec!["v1".to_string()]));
  }

  #[tokio::test]
  async fn no_usable_channel_records_skips_video_call() {
    let fake = FakePlatform {
      candidates: vec![candidate("a", "x"), candidate("b", "y")],
      channels: vec![channel("x", None)],
      videos: vec![video("a", 1), video("b", 2)],
      ..Default::default()
    };
    let candidates = fake.candidates.clone();
    let rows = enrich_and_filter(&fake, &candidates, SubscriberRange::new(0, u64::MAX)).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(fake.video_calls(), 0);
  }

  #[tokio::test]
  async fn empty_filter_result_skips_video_call() {
    let fake = catalogue();
    let candidates = fake.candidates.clone();
    let rows = enrich_and_filter(&fake, &candidates, SubscriberRange::new(5_000, 10_000)).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(fake.video_calls(), 0);
  }

  #[tokio::test]
  async fn video_missing_from_stats_is_excluded() {
    let mut fake = catalogue();
    fake.videos.retain(|v| v.video_id != "v3");
    let candidates = fake.candidates.clone();
    let rows = enrich_and_filter(&fake, &candidates, SubscriberRange::new(100, 5_000)).await.unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["v2", "v5"]);
  }

  #[tokio::test]
  async fn empty_candidates_is_empty_input_without_calls() {
    let fake = catalogue();
    let err = enrich_and_filter(&fake, &[], SubscriberRange::new(0, 10)).await.unwrap_err();
    assert!(matches!(err, DashboardError::EmptyInput));
    assert!(fake.calls().is_empty());
  }

  #[tokio::test]
  async fn empty_search_short_circuits_run() {
    let fake = Arc::new(FakePlatform::default());
    let pipeline = Pipeline::new(fake.clone(), 50);
    let err = pipeline.run("nothing", SubscriberRange::new(0, 10)).await.unwrap_err();
    assert!(matches!(err, DashboardError::EmptyInput));
    assert_eq!(fake.calls(), vec![Call::Search("nothing".to_string(), 50)]);
  }

  #[tokio::test]
  async fn platform_error_propagates_typed() {
    let fake = FakePlatform { fail_channels: true, ..catalogue() };
    let candidates = fake.candidates.clone();
    let err = enrich_and_filter(&fake, &candidates, SubscriberRange::new(0, 10)).await.unwrap_err();
    assert!(matches!(err, DashboardError::Platform { status: 403, .. }));
    assert_eq!(fake.video_calls(), 0);
  }

  #[tokio::test]
  async fn rerun_with_same_parameters_is_identical() {
    let fake = Arc::new(catalogue());
    let pipeline = Pipeline::new(fake.clone(), 50);
    let range = SubscriberRange::new(100, 5_000);
    let first = pipeline.run("q", range).await.unwrap();
    let second = pipeline.run("q", range).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fake.calls().len(), 6);
  }

  #[tokio::test]
  async fn run_passes_result_cap_to_search() {
    let fake = Arc::new(catalogue());
    let pipeline = Pipeline::new(fake.clone(), 2);
    let rows = pipeline.run("q", SubscriberRange::new(0, u64::MAX)).await.unwrap();
    assert_eq!(fake.calls()[0], Call::Search("q".to_string(), 2));
    assert_eq!(rows.len(), 2);
  }
}
