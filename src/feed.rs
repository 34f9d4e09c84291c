use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::backend;
use crate::config::BackendConfig;
use crate::filterizer::join_filtered;
use crate::state::{Delta, ProviderCommand};
use crate::ticket::join_ticket;

/// Live provider: one thread drains commands and hands every request to the
/// fetch pool so slow endpoints never block the next command.
pub fn spawn_provider(cfg: BackendConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let cfg = Arc::new(cfg);
        let pool = Arc::new(build_fetch_pool(cfg.fetch_parallelism));
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Backend {} ({} fetch threads)",
            cfg.base_url, cfg.fetch_parallelism
        )));

        for cmd in cmd_rx {
            let tx = tx.clone();
            let cfg = cfg.clone();
            let inner_pool = pool.clone();
            let job = move || run_command(&cfg, &inner_pool, &tx, cmd);
            match &*pool {
                Some(pool) => pool.spawn(job),
                None => {
                    thread::spawn(job);
                }
            }
        }
        tracing::info!("provider command channel closed");
    });
}

fn run_command(
    cfg: &BackendConfig,
    pool: &Option<rayon::ThreadPool>,
    tx: &Sender<Delta>,
    cmd: ProviderCommand,
) {
    match cmd {
        ProviderCommand::FetchCountries { token } => {
            let result = backend::fetch_countries(cfg).map_err(|err| report("countries", err));
            let _ = tx.send(Delta::SetCountries { token, result });
        }
        ProviderCommand::FetchLeagues { token, country } => {
            let result =
                backend::fetch_leagues(cfg, &country).map_err(|err| report("leagues", err));
            let _ = tx.send(Delta::SetLeagues {
                token,
                country,
                result,
            });
        }
        ProviderCommand::FetchFixtures { token, query } => {
            let result =
                backend::fetch_fixtures(cfg, &query).map_err(|err| report("fixtures", err));
            if let Ok(fixtures) = &result {
                tracing::info!(query = %query.describe(), count = fixtures.len(), "fixtures loaded");
            }
            let _ = tx.send(Delta::SetFixtures { token, result });
        }
        ProviderCommand::FetchAnalysis { token, fixture_id } => {
            let result =
                backend::fetch_analysis(cfg, fixture_id).map_err(|err| report("analysis", err));
            let _ = tx.send(Delta::SetAnalysis {
                token,
                fixture_id,
                result,
            });
        }
        ProviderCommand::BuildTicket { token, request } => {
            let result = backend::fetch_ticket_lines(cfg, &request)
                .and_then(|lines| {
                    with_fetch_pool(pool, || {
                        join_ticket(lines, |id| backend::fetch_fixture_detail(cfg, id))
                    })
                })
                .map_err(|err| report("ticket", err));
            let _ = tx.send(Delta::SetTicket { token, result });
        }
        ProviderCommand::RunFilterizer { token, query } => {
            let result = backend::fetch_filtered_odds(cfg, &query)
                .and_then(|hits| {
                    with_fetch_pool(pool, || {
                        join_filtered(query, &hits, |id| backend::fetch_fixture_detail(cfg, id))
                    })
                })
                .map_err(|err| report("filterizer", err));
            let _ = tx.send(Delta::SetFilterizer { token, result });
        }
        ProviderCommand::ProbeImages { urls } => {
            for url in urls {
                let ok = backend::probe_image(cfg, &url);
                let _ = tx.send(Delta::ImageStatus { url, ok });
            }
        }
    }
}

fn report(what: &str, err: anyhow::Error) -> String {
    tracing::warn!(request = what, error = %format!("{err:#}"), "backend request failed");
    format!("{err:#}")
}

pub(crate) fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
