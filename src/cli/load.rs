//! `curator <endpoint>`: stream a collection as JSON lines.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::Serialize;
use std::io::Write;

use super::args::LoadArgs;
use crate::config::LoaderConfig;
use crate::facets::FacetSelection;
use crate::fetcher::HttpPageFetcher;
use crate::loader::{Loader, LoaderStatus, Phase};
use crate::traits::PageFetcher;

/// Apply `--facet` filters to the endpoint.
pub fn endpoint_for(args: &LoadArgs) -> String {
    if args.facets.is_empty() {
        return args.endpoint.clone();
    }
    let mut selection = FacetSelection::from_url(&args.endpoint);
    for facet in &args.facets {
        selection.select(facet.clone());
    }
    selection.apply_to(&args.endpoint)
}

/// Fetch pages over HTTP and write every item to stdout.
pub async fn handle_load_command(args: LoadArgs, mut config: LoaderConfig) -> Result<()> {
    if let Some(base) = &args.base_url {
        config.base_url = Some(base.clone());
    }
    let fetcher = HttpPageFetcher::from_config(config.fetcher_config())
        .wrap_err("failed to set up the page fetcher")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let status =
        stream_collection::<serde_json::Value, _, _>(&args, &config, fetcher, &mut out).await?;

    tracing::info!(
        items = status.item_count,
        pages = status.pages_loaded,
        has_more = status.has_more(),
        "Done"
    );
    Ok(())
}

/// Drive a loader for `args` and write each item as one JSON line to `out`
/// as soon as its page arrives.
///
/// Fails up front when the endpoint cannot be resolved, and later when a
/// page still cannot be loaded after `args.retries` retries; items already
/// written stay written. Errors that retrying cannot fix are not retried.
pub async fn stream_collection<T, F, W>(
    args: &LoadArgs,
    config: &LoaderConfig,
    fetcher: F,
    out: &mut W,
) -> Result<LoaderStatus>
where
    T: Serialize + Clone + Send + 'static,
    F: PageFetcher<T> + 'static,
    W: Write,
{
    let endpoint = endpoint_for(args);
    config.check_endpoint(&endpoint)?;
    let loader: Loader<T, F> = Loader::with_config(endpoint.clone(), fetcher, config);
    let page_target = if args.all {
        config.page_limit
    } else {
        Some(args.pages.unwrap_or(1))
    };

    tracing::info!(endpoint = %endpoint, pages = ?page_target, "Loading collection");

    let mut written = 0usize;
    let mut status = loader.status();
    loop {
        if page_target.is_some_and(|target| status.pages_loaded >= target) {
            break;
        }

        status = loader.load_next_page().await;
        let mut attempts = 0;
        while status.phase == Phase::Errored
            && attempts < args.retries
            && loader.last_error().is_some_and(|e| e.is_retryable())
        {
            attempts += 1;
            tracing::warn!(attempt = attempts, of = args.retries, "Retrying page");
            status = loader.retry_page().await;
        }

        written += write_items(&loader.items_from(written), out)?;

        match status.phase {
            Phase::Idle => continue,
            Phase::Exhausted => break,
            Phase::Errored => {
                let err = loader
                    .last_error()
                    .map(|e| format!("{} ({})", e.user_message(), e))
                    .unwrap_or_else(|| "page fetch failed".to_string());
                return Err(eyre!(err)).wrap_err_with(|| {
                    format!("stopped after {} items from {}", written, endpoint)
                });
            }
            // load_next_page only returns once the request settles
            Phase::Loading => break,
        }
    }

    out.flush()?;
    Ok(status)
}

fn write_items<T: Serialize, W: Write>(items: &[T], out: &mut W) -> Result<usize> {
    for item in items {
        serde_json::to_writer(&mut *out, item)?;
        out.write_all(b"\n")?;
    }
    Ok(items.len())
}
