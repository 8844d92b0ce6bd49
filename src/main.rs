use std::sync::Arc;

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{signal, sync::Notify};
use tracing::{info, warn};

mod api;
mod cache;
mod config;
mod directory;
mod error;
mod fetch;
mod media;
mod metadata;
mod provider;
mod resolver;
mod video_id;

pub use error::{Error, Result};

use crate::{
  cache::{SystemClock, TtlCache},
  config::Config,
  directory::ProviderDirectory,
  fetch::HttpFetch,
  resolver::Resolver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt::init();

  let config = Config::from_env();
  let resolver = build_resolver(&config)?;
  let app = api::router(Arc::new(resolver));

  info!("listening on {}", config.bind_addr);

  let draining = Arc::new(Notify::new());
  let server = axum::Server::try_bind(&config.bind_addr)
    .with_context(|| format!("binding to {}", config.bind_addr))?
    .serve(app.into_make_service())
    .with_graceful_shutdown({
      let draining = draining.clone();
      async move { draining.notified().await }
    });

  // in-flight requests get `shutdown_timeout` to finish after a signal
  let drain_deadline = async {
    shutdown_signal().await;
    draining.notify_one();
    tokio::time::sleep(config.shutdown_timeout).await;
  };

  tokio::select! {
    res = server => res.context("running server")?,
    _ = drain_deadline => {
      warn!("requests still in flight after {:?}, exiting", config.shutdown_timeout);
    }
  }

  Ok(())
}

fn build_resolver(config: &Config) -> Result<Resolver> {
  let fetch = Arc::new(HttpFetch::new()?);
  let clock = Arc::new(SystemClock);

  let directory =
    ProviderDirectory::new(fetch.clone(), clock.clone(), StdRng::from_entropy())
      .with_remote_url(config.directory_url.clone())
      .with_remote_ttl(config.directory_ttl)
      .with_timeout(config.provider_timeout);

  let cache = config.cache_ttl.map(|ttl| TtlCache::new(ttl, clock));

  Ok(
    Resolver::new(fetch, directory)
      .with_cache(cache)
      .with_timeout(config.provider_timeout)
      .with_candidate_limit(config.candidate_limit),
  )
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      warn!("failed to install Ctrl+C handler: {}", e);
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        warn!("failed to install SIGTERM handler: {}", e);
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!("shutting down");
}
