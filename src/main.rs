mod app;
mod config;
mod constants;
mod credentials;
mod display;
mod error;
mod graphics;
mod input;
mod logging;
mod model;
mod pipeline;
mod player;
mod slider;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

use app::App;
use config::Config;
use constants::constants;
use display::CliDisplayMode;
use pipeline::Pipeline;
use player::VideoPlayer;
use youtube::YouTubeClient;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Display mode: 'auto', 'direct', or 'ascii' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// JSON file holding the API key (default: ./secret.json)
  #[arg(long)]
  secret: Option<PathBuf>,

  /// Run one search, print the table to stdout and exit
  #[arg(long)]
  print: bool,

  /// Initial search keyword
  #[arg(short, long)]
  query: Option<String>,

  /// Lower subscriber bound (inclusive)
  #[arg(long)]
  min: Option<u64>,

  /// Upper subscriber bound (exclusive)
  #[arg(long)]
  max: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = logging::init_tracing();

  let api_key = credentials::load_api_key(args.secret.as_deref()).context("Cannot start without a YouTube API key")?;
  let http = reqwest::Client::builder()
    .timeout(Duration::from_secs(constants().http_timeout_secs))
    .build()
    .context("Failed to build HTTP client")?;
  let youtube = YouTubeClient::new(http.clone(), api_key, &constants().api_base_url)?;
  let pipeline = Pipeline::new(Arc::new(youtube), constants().max_results);

  let mut config = Config::load();
  config.subscriber_min = args.min.or(config.subscriber_min);
  config.subscriber_max = args.max.or(config.subscriber_max);

  if args.print {
    return print_once(&pipeline, args.query.as_deref().unwrap_or_default(), &config).await;
  }

  let display_mode = display::resolve_display_mode(args.display_mode);
  info!(mode = display_mode.label(), "starting dashboard");
  let mut app = App::new(pipeline, VideoPlayer::new(http, display_mode), &config);
  if let Some(query) = &args.query {
    app.query.set(query);
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.config().save();
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  // The page shows results for the initial values straight away.
  app.trigger_run();

  loop {
    app.check_pending().await?;
    app.player.check_mpv_status();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.player.stop().await?;
  Ok(())
}

/// Headless mode: one pipeline run, results as tab-separated lines.
async fn print_once(pipeline: &Pipeline, query: &str, config: &Config) -> Result<()> {
  let range = config.initial_range();
  println!("- Search query: {}", query);
  println!("- Subscriber threshold: {}-{}", range.min, range.max);

  let (rows, warning) = app::degrade(pipeline.run(query, range).await);
  if let Some(warning) = warning {
    eprintln!("{}", warning);
    return Ok(());
  }
  println!("Video ID\tTitle\tViews\tChannel\tSubscribers");
  for row in rows {
    println!(
      "{}\t{}\t{}\t{}\t{}",
      row.video_id,
      row.title,
      ui::group_thousands(row.view_count),
      row.channel_title,
      ui::group_thousands(row.subscriber_count)
    );
  }
  Ok(())
}
