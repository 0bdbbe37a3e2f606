//! Incident watching loop: wires the config, API client, fetch cache and
//! push channel together and tails incident changes to the log.

use std::time::Duration;

use api_client::ApiClient;
use config::Opts;
use eyre::Result;
use fetch::FetchCache;
use incidents::{ChangeTokenWatcher, IncidentStore, IncidentsQuery, poll_incidents};
use realtime::{INCIDENT_COMMENT, PushChannel, PushListener};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Delay between session handshake attempts at startup.
const HANDSHAKE_RETRY_DELAY: Duration = Duration::from_secs(5);

pub(crate) async fn run(opts: Opts) -> Result<()> {
    let api = ApiClient::with_timeout(
        opts.api.base_url.clone(),
        opts.api.api_key.clone(),
        Duration::from_secs(opts.api.timeout_secs),
    )?;

    // block until the backend accepts our credentials
    loop {
        match api.establish_session().await {
            Ok(_session) => break,
            Err(e) => {
                error!(error = %e, "session handshake failed, retrying");
                sleep(HANDSHAKE_RETRY_DELAY).await;
            }
        }
    }

    let channel = PushChannel::new();
    let _push = PushListener::new(opts.push.ws_url.clone(), channel.clone())
        .with_reconnect_delay(Duration::from_secs(opts.push.reconnect_delay_secs))
        .spawn();

    let store = IncidentStore::new(api, FetchCache::new());
    let query = IncidentsQuery {
        candidate: if opts.watch.candidates { None } else { Some(false) },
        limit: opts.watch.page_size,
        cel: opts.watch.cel.clone(),
        ..Default::default()
    };

    let mut listing = store.incidents(&query);
    let _changes = poll_incidents(&channel, &listing);
    let comment_tokens = ChangeTokenWatcher::new(&channel, INCIDENT_COMMENT);
    let mut comment_rx = comment_tokens.subscribe();

    info!(key = ?listing.key(), "watching incident listing");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received, exiting");
                return Ok(());
            }
            _ = listing.changed() => {
                let state = listing.state();
                if let Some(error) = &state.error {
                    warn!(%error, "incident listing fetch failed");
                }
                if let Some(page) = &state.data {
                    info!(total = page.count, shown = page.items.len(), "incident listing refreshed");
                    for incident in &page.items {
                        info!(
                            id = %incident.id,
                            name = %incident.user_generated_name,
                            status = ?incident.status,
                            severity = ?incident.severity,
                            alerts = incident.alerts_count,
                            "incident"
                        );
                    }
                }
            }
            result = comment_rx.changed() => {
                if result.is_ok() {
                    info!(token = %*comment_rx.borrow(), "incident comment activity");
                }
            }
        }
    }
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
