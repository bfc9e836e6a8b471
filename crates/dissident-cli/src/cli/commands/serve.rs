//! `serve` - run the DNS gate until interrupted.

use anyhow::Result;
use dissident_engine::{FanoutObserver, QueryCounters, QueryObserver};
use std::sync::Arc;
use tracing::info;

use super::Context;
use crate::cli::args::ServeArgs;

/// Execute the serve command.
pub async fn execute(ctx: Context, args: ServeArgs) -> Result<()> {
    let mut config = ctx.load_config()?;

    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if !args.upstream.is_empty() {
        config.upstream = args.upstream;
    }

    let counters = Arc::new(QueryCounters::new());
    let observer = FanoutObserver::new().with(counters.clone());

    #[cfg(feature = "metrics")]
    let (observer, metrics_guard) = match args.metrics_endpoint.as_deref() {
        Some(endpoint) => {
            let guard = dissident_srv::metrics::init_metrics(endpoint)?;
            info!(endpoint, "exporting metrics over OTLP");
            let otel = dissident_srv::metrics::OtelObserver::new(config.server_label());
            (observer.with(Arc::new(otel)), Some(guard))
        }
        None => (observer, None),
    };

    let observer: Arc<dyn QueryObserver> = Arc::new(observer);

    let outcome = tokio::select! {
        result = dissident_srv::server::run(&config, observer) => result.map_err(Into::into),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupt received, shutting down");
            Ok(())
        }
    };

    let totals = counters.snapshot();
    info!(
        requests = totals.requests,
        allowed = totals.allowed,
        blocked = totals.blocked,
        "query totals"
    );

    #[cfg(feature = "metrics")]
    if let Some(guard) = metrics_guard {
        if let Err(e) = guard.shutdown() {
            tracing::warn!(error = %e, "metrics shutdown failed");
        }
    }
    outcome
}
