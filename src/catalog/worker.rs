use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::warn;

use super::client::{CatalogClient, CatalogError, filter_episodes};
use super::model::{Account, Episode, Home, Plan};

/// Requests the UI thread hands off to the catalog worker.
#[derive(Debug)]
pub enum CatalogCmd {
    /// Reload both home rails.
    RefreshHome,
    /// Fetch every episode and filter by the query.
    Search(String),
    /// Like or unlike an episode for the configured user.
    SetLike { episode_id: String, liked: bool },
    /// Queue generation of a new episode from the prompt.
    Generate { prompt: String },
    /// Reload account details (plan, tokens, cards).
    RefreshAccount,
    /// Fetch the subscription plans.
    FetchPlans,
    /// Subscribe the configured user to a plan.
    Subscribe { plan_id: String },
    /// Stop the worker thread.
    Shutdown,
}

/// Outcomes reported back to the UI thread.
#[derive(Debug)]
pub enum CatalogEvent {
    Home(Home),
    SearchResults {
        query: String,
        episodes: Vec<Episode>,
    },
    EpisodeUpdated(Episode),
    GenerateQueued(Episode),
    Account(Account),
    Plans(Vec<Plan>),
    Failed {
        action: &'static str,
        error: CatalogError,
    },
}

/// Owner handle for the worker thread. All service traffic happens on that
/// thread; the UI only ever exchanges messages with it.
pub struct CatalogHandle {
    tx: Sender<CatalogCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl CatalogHandle {
    pub fn start(client: CatalogClient) -> (Self, Receiver<CatalogEvent>) {
        let (tx, rx) = mpsc::channel::<CatalogCmd>();
        let (event_tx, event_rx) = mpsc::channel::<CatalogEvent>();
        let join = spawn_catalog_worker(client, rx, event_tx);
        (
            Self {
                tx,
                join: Mutex::new(Some(join)),
            },
            event_rx,
        )
    }

    pub fn send(&self, cmd: CatalogCmd) {
        let _ = self.tx.send(cmd);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(CatalogCmd::Shutdown);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

fn spawn_catalog_worker(
    client: CatalogClient,
    rx: Receiver<CatalogCmd>,
    events: Sender<CatalogEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = rx.recv() {
            let event = match cmd {
                CatalogCmd::RefreshHome => match client.fetch_home() {
                    Ok(home) => CatalogEvent::Home(home),
                    Err(e) => fail("loading home", e),
                },
                CatalogCmd::Search(query) => match client.fetch_episodes() {
                    Ok(all) => CatalogEvent::SearchResults {
                        episodes: filter_episodes(&all, &query),
                        query,
                    },
                    Err(e) => fail("searching", e),
                },
                CatalogCmd::SetLike { episode_id, liked } => {
                    let result = if liked {
                        client.like(&episode_id)
                    } else {
                        client.unlike(&episode_id)
                    };
                    match result {
                        Ok(episode) => CatalogEvent::EpisodeUpdated(episode),
                        Err(e) => fail("updating like", e),
                    }
                }
                CatalogCmd::Generate { prompt } => match client.generate(&prompt) {
                    Ok(episode) => CatalogEvent::GenerateQueued(episode),
                    Err(e) => fail("generating", e),
                },
                CatalogCmd::RefreshAccount => match client.fetch_account() {
                    Ok(account) => CatalogEvent::Account(account),
                    Err(e) => fail("loading account", e),
                },
                CatalogCmd::FetchPlans => match client.fetch_plans() {
                    Ok(plans) => CatalogEvent::Plans(plans),
                    Err(e) => fail("loading plans", e),
                },
                CatalogCmd::Subscribe { plan_id } => match client.subscribe(&plan_id) {
                    Ok(account) => CatalogEvent::Account(account),
                    Err(e) => fail("subscribing", e),
                },
                CatalogCmd::Shutdown => break,
            };

            if events.send(event).is_err() {
                break;
            }
        }
    })
}

fn fail(action: &'static str, error: CatalogError) -> CatalogEvent {
    warn!("catalog request failed while {action}: {error}");
    CatalogEvent::Failed { action, error }
}
