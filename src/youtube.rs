use anyhow::{Context, anyhow};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::constants::constants;
use crate::error::DashboardError;
use crate::model::{Candidate, ChannelStats, VideoStats};

/// Field mask for `channels.list`: only the id and the subscriber count.
const CHANNEL_FIELDS: &str = "items(id,statistics(subscriberCount))";

/// Field mask for `videos.list`: id, title, channel title and view count.
const VIDEO_FIELDS: &str = "items(id,snippet(title,channelTitle),statistics(viewCount))";

/// The three platform capabilities one pipeline run needs.
///
/// Implemented by [`YouTubeClient`] against the Data API; tests substitute a
/// fake that records calls.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
  /// Keyword search ordered by view count, restricted to videos.
  async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Candidate>, DashboardError>;

  /// Subscriber counts for a batch of channels (one request).
  async fn channel_stats(&self, channel_ids: &[String]) -> Result<Vec<ChannelStats>, DashboardError>;

  /// Title, channel title and view count for a batch of videos (one request).
  async fn video_stats(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, DashboardError>;
}

// --- API Models ---

#[derive(Debug, Deserialize)]
struct SearchListResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: SearchItemId,
  snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
  #[serde(rename = "videoId")]
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
  #[serde(rename = "channelId")]
  channel_id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
  #[serde(default)]
  items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
  id: String,
  statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
struct ChannelStatistics {
  #[serde(rename = "subscriberCount")]
  subscriber_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
  #[serde(default)]
  items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
  id: String,
  snippet: VideoSnippet,
  statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
  title: String,
  #[serde(rename = "channelTitle")]
  channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatistics {
  #[serde(rename = "viewCount")]
  view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
  error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  message: String,
}

// --- Parsing ---

fn decode<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T, DashboardError> {
  serde_json::from_str(body).map_err(|e| DashboardError::MalformedResponse(format!("{}: {}", what, e)))
}

/// The API encodes counts as decimal strings.
fn parse_count(raw: &str, field: &str, id: &str) -> Result<u64, DashboardError> {
  raw
    .trim()
    .parse()
    .map_err(|_| DashboardError::MalformedResponse(format!("{} for {} is not an integer: {:?}", field, id, raw)))
}

pub fn parse_search_response(body: &str) -> Result<Vec<Candidate>, DashboardError> {
  let list: SearchListResponse = decode(body, "search.list")?;
  Ok(
    list
      .items
      .into_iter()
      .filter_map(|item| match item.id.video_id {
        Some(video_id) => Some(Candidate { video_id, channel_id: item.snippet.channel_id }),
        None => {
          debug!(channel_id = %item.snippet.channel_id, "search: skipping non-video item");
          None
        }
      })
      .collect(),
  )
}

pub fn parse_channel_response(body: &str) -> Result<Vec<ChannelStats>, DashboardError> {
  let list: ChannelListResponse = decode(body, "channels.list")?;
  list
    .items
    .into_iter()
    .map(|item| {
      let subscriber_count = match item.statistics.and_then(|s| s.subscriber_count) {
        Some(raw) => Some(parse_count(&raw, "subscriberCount", &item.id)?),
        None => None,
      };
      Ok(ChannelStats { channel_id: item.id, subscriber_count })
    })
    .collect()
}

pub fn parse_video_response(body: &str) -> Result<Vec<VideoStats>, DashboardError> {
  let list: VideoListResponse = decode(body, "videos.list")?;
  let mut videos = Vec::with_capacity(list.items.len());
  for item in list.items {
    let Some(raw) = item.statistics.and_then(|s| s.view_count) else {
      debug!(video_id = %item.id, "videos: no public view count, dropping");
      continue;
    };
    let view_count = parse_count(&raw, "viewCount", &item.id)?;
    videos.push(VideoStats {
      video_id: item.id,
      title: item.snippet.title,
      channel_title: item.snippet.channel_title,
      view_count,
    });
  }
  Ok(videos)
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
  match serde_json::from_str::<ApiErrorResponse>(body) {
    Ok(parsed) => parsed.error.message,
    Err(_) => body.chars().take(200).collect(),
  }
}

// --- Client ---

/// YouTube Data API v3 client. Holds the API key for the process lifetime.
pub struct YouTubeClient {
  http: Client,
  base: Url,
  api_key: String,
}

impl YouTubeClient {
  pub fn new(http: Client, api_key: String, base_url: &str) -> anyhow::Result<Self> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;
    Ok(Self { http, base, api_key })
  }

  fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Url {
    let mut url = self.base.clone();
    let path = format!("{}/{}", self.base.path().trim_end_matches('/'), resource);
    url.set_path(&path);
    url.query_pairs_mut().extend_pairs(params).append_pair("key", &self.api_key);
    url
  }

  async fn get(&self, url: Url) -> Result<String, DashboardError> {
    let response = self.http.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      return Err(DashboardError::Platform { status: status.as_u16(), message: api_error_message(&body) });
    }
    Ok(body)
  }

  fn search_url(&self, query: &str, max_results: u32) -> Url {
    let max = max_results.clamp(1, constants().max_results).to_string();
    self.endpoint(
      "search",
      &[("q", query), ("part", "id,snippet"), ("order", "viewCount"), ("type", "video"), ("maxResults", max.as_str())],
    )
  }

  fn channels_url(&self, channel_ids: &[String]) -> Url {
    let ids = channel_ids.join(",");
    self.endpoint("channels", &[("id", ids.as_str()), ("part", "statistics"), ("fields", CHANNEL_FIELDS)])
  }

  fn videos_url(&self, video_ids: &[String]) -> Url {
    let ids = video_ids.join(",");
    self.endpoint("videos", &[("id", ids.as_str()), ("part", "snippet,statistics"), ("fields", VIDEO_FIELDS)])
  }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
  async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Candidate>, DashboardError> {
    let body = self.get(self.search_url(query, max_results)).await?;
    parse_search_response(&body)
  }

  async fn channel_stats(&self, channel_ids: &[String]) -> Result<Vec<ChannelStats>, DashboardError> {
    let body = self.get(self.channels_url(channel_ids)).await?;
    parse_channel_response(&body)
  }

  async fn video_stats(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, DashboardError> {
    let body = self.get(self.videos_url(video_ids)).await?;
    parse_video_response(&body)
  }
}

// --- Player helpers ---

pub fn watch_url(video_id: &str) -> String {
  format!("{}{}", constants().watch_url_prefix, video_id)
}

pub async fn fetch_thumbnail(client: &Client, video_id: &str) -> anyhow::Result<DynamicImage> {
  let prefix = &constants().thumbnail_url_prefix;
  let thumbnail_urls = [
    format!("{}{}/maxresdefault.jpg", prefix, video_id),
    format!("{}{}/sddefault.jpg", prefix, video_id),
    format!("{}{}/hqdefault.jpg", prefix, video_id),
    format!("{}{}/0.jpg", prefix, video_id),
  ];

  for url in &thumbnail_urls {
    if let Ok(response) = client.get(url).send().await
      && response.status().is_success()
    {
      let image_bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
      let image = image::load_from_memory(&image_bytes)
        .with_context(|| format!("Failed to decode image from memory (URL: {})", url))?;
      return Ok(image);
    }
  }
  Err(anyhow!("No video with ID {} (no thumbnail available)", video_id))
}
