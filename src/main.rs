use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use swcache::cache::SqliteStore;
use swcache::config::Config;
use swcache::event::{Event, Reply};
use swcache::lifecycle::ActivationReport;
use swcache::net::{HttpNetwork, Request};
use swcache::notify::{PushPayload, SyncOutcome};
use swcache::worker::{unanswered, Worker};

#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(about = "Offline-first request interception cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/swcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write logs to a daily rolling file in this directory instead of stderr
  #[arg(long)]
  log_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Pre-populate the static bucket from the asset manifest
  Install,
  /// Delete stale buckets and start serving the configured generation
  Activate,
  /// Show lifecycle phase and bucket names
  Status,
  /// Run requests through the interceptor, concurrently
  Fetch {
    /// Root-relative paths or absolute URLs
    #[arg(required = true)]
    targets: Vec<String>,
    /// Send an HTML Accept header, as a page navigation would
    #[arg(long)]
    html: bool,
    #[arg(long, default_value = "GET")]
    method: String,
  },
  /// Remove one runtime-cached response
  Evict { target: String },
  /// Run a background resync task
  Sync {
    #[arg(default_value = "sync-data")]
    tag: String,
  },
  /// Render a push payload as a notification
  Push { text: Option<String> },
  /// Print where a notification click navigates
  Click,
}

fn init_tracing(log_dir: Option<&PathBuf>) -> WorkerGuard {
  let (writer, guard) = match log_dir {
    Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "swcache.log")),
    None => tracing_appender::non_blocking(std::io::stderr()),
  };

  let filter = EnvFilter::try_from_env("SWCACHE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(log_dir.is_none())
    .init();

  guard
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing(args.log_dir.as_ref());

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let store = Arc::new(SqliteStore::open(config.cache.database.as_deref())?);
  let network = Arc::new(HttpNetwork::new(Duration::from_secs(
    config.network.timeout_secs,
  ))?);
  let worker = Arc::new(Worker::new(store, network, &config).await?);

  match args.command {
    Command::Install => {
      if let Reply::Installed {
        outcome,
        activation,
      } = worker.dispatch(Event::Install).await?
      {
        println!("installed {} assets", outcome.assets);
        match activation {
          Some(Ok(report)) => print_activation(&report),
          Some(Err(e)) => return Err(eyre!("Installed, but activation failed: {}", e)),
          None => println!("waiting for activation (drain rollout)"),
        }
      }
    }
    Command::Activate => {
      if let Reply::Activated(report) = worker.dispatch(Event::Activate).await? {
        print_activation(&report);
      }
    }
    Command::Status => {
      let status = worker.status().await?;
      println!("phase:      {:?}", status.phase);
      println!("configured: {}", status.configured.static_bucket());
      match &status.active {
        Some(active) => println!("active:     {}", active.static_bucket()),
        None => println!("active:     -"),
      }
      for bucket in &status.buckets {
        println!("bucket:     {}", bucket);
      }
    }
    Command::Fetch {
      targets,
      html,
      method,
    } => {
      let method: Method = method
        .to_uppercase()
        .parse()
        .map_err(|e| eyre!("Invalid method {}: {}", method, e))?;

      let requests = targets
        .iter()
        .map(|target| {
          let url = worker.resolve(target)?;
          let request = if html {
            Request::navigate(url)
          } else {
            Request::get(url)
          };
          Ok(request.with_method(method.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

      // Each request is an independent task
      let tasks = requests.into_iter().map(|request| {
        let worker = worker.clone();
        tokio::spawn(async move {
          let served = match worker.dispatch(Event::Fetch(request.clone())).await {
            Ok(Reply::Fetched(Some(served))) => Ok(served),
            _ => worker.forward(&request).await,
          };
          (request, served)
        })
      });

      for joined in futures::future::join_all(tasks).await {
        let (request, served) = joined.map_err(|e| eyre!("Request task failed: {}", e))?;
        match served {
          Ok(served) => println!(
            "{} {} {} [{}] {} bytes",
            served.response.status,
            served.response.status_text,
            request.url,
            served.source.label(),
            served.response.body.len()
          ),
          Err(e) => {
            let response = unanswered(&e);
            println!(
              "{} {} {} [unanswered] {}",
              response.status, response.status_text, request.url, e
            );
          }
        }
      }
    }
    Command::Evict { target } => {
      let request = Request::get(worker.resolve(&target)?);
      if worker.evict(&request).await? {
        println!("evicted {}", request.url);
      } else {
        println!("not cached: {}", request.url);
      }
    }
    Command::Sync { tag } => {
      match worker.dispatch(Event::Sync(tag.clone())).await? {
        Reply::Synced(SyncOutcome::Ran { runs }) => println!("{}: ran (run {})", tag, runs),
        Reply::Synced(SyncOutcome::Ignored) => println!("{}: not a registered sync tag", tag),
        _ => {}
      }
    }
    Command::Push { text } => {
      if let Reply::Notify(notification) = worker.dispatch(Event::Push(PushPayload { text })).await? {
        println!("{}", serde_json::to_string_pretty(&notification)?);
      }
    }
    Command::Click => {
      if let Reply::Navigate(target) = worker.dispatch(Event::NotificationClick).await? {
        println!("{}", target);
      }
    }
  }

  Ok(())
}

fn print_activation(report: &ActivationReport) {
  println!("activated");
  for bucket in &report.deleted {
    println!("  deleted {}", bucket);
  }
  for failure in &report.failed {
    println!("  could not delete {}: {}", failure.bucket, failure.message);
  }
}
