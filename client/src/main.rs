//! ShareLinks entry-point: loads settings, wires adapters and runs the
//! shell on stdin/stdout.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use sharelinks::domain::ports::{IdentityProvider, LinkStore, UserProfileRepository};
use sharelinks::domain::{AccountService, BoardOptions, LinkBoard};
use sharelinks::inbound::cli::Shell;
use sharelinks::outbound::firestore::{
    AccessTokenSource, FirestoreClient, FirestoreConfig, FirestoreLinkStore,
    FirestoreProfileRepository,
};
use sharelinks::outbound::identity_toolkit::{IdentityToolkitConfig, IdentityToolkitProvider};
use sharelinks::outbound::memory::{
    InMemoryIdentityProvider, InMemoryLinkStore, InMemoryProfileRepository,
};
use sharelinks::settings::{Backend, HostedBackend, Settings};

/// Board behaviour chosen by settings.
#[derive(Debug, Clone, Copy)]
struct BoardTuning {
    options: BoardOptions,
    interval: Option<Duration>,
}

/// Application bootstrap.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = Settings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let tuning = BoardTuning {
        options: settings.board_options(),
        interval: settings.reconcile_interval(),
    };
    info!(options = ?tuning.options, "board options");
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    match settings.backend().wrap_err("invalid settings")? {
        Backend::Hosted(hosted) => run_hosted(hosted, clock, tuning).await,
        Backend::InMemory => run_in_memory(clock, tuning).await,
        Backend::Incomplete { missing } => {
            warn!(?missing, "hosted backend not configured; using in-memory adapters");
            run_in_memory(clock, tuning).await
        }
    }
}

async fn run_hosted(
    hosted: HostedBackend,
    clock: Arc<dyn Clock>,
    tuning: BoardTuning,
) -> Result<()> {
    info!(project_id = %hosted.project_id, "using hosted backend");
    let identity = Arc::new(
        IdentityToolkitProvider::new(IdentityToolkitConfig {
            endpoint: hosted.identity_endpoint,
            api_key: hosted.api_key,
            timeout: hosted.request_timeout,
        })
        .wrap_err("failed to build identity client")?,
    );
    let tokens: Arc<dyn AccessTokenSource> = identity.clone();
    let firestore = Arc::new(
        FirestoreClient::new(
            &FirestoreConfig {
                endpoint: hosted.firestore_endpoint,
                project_id: hosted.project_id,
                timeout: hosted.request_timeout,
            },
            tokens,
        )
        .wrap_err("failed to build document store client")?,
    );
    let store = Arc::new(FirestoreLinkStore::new(
        Arc::clone(&firestore),
        Arc::clone(&clock),
    ));
    let profiles = Arc::new(FirestoreProfileRepository::new(firestore));
    let accounts = AccountService::new(identity, profiles, clock);
    serve(LinkBoard::new(store, accounts), tuning).await
}

async fn run_in_memory(clock: Arc<dyn Clock>, tuning: BoardTuning) -> Result<()> {
    info!("using in-memory backend; nothing is persisted");
    let store = Arc::new(InMemoryLinkStore::new(Arc::clone(&clock)));
    let accounts = AccountService::new(
        Arc::new(InMemoryIdentityProvider::new()),
        Arc::new(InMemoryProfileRepository::new()),
        clock,
    );
    serve(LinkBoard::new(store, accounts), tuning).await
}

async fn serve<S, P, R>(controller: LinkBoard<S, P, R>, tuning: BoardTuning) -> Result<()>
where
    S: LinkStore + 'static,
    P: IdentityProvider + 'static,
    R: UserProfileRepository + 'static,
{
    let board = Arc::new(controller.with_options(tuning.options));
    if let Err(err) = board.start().await {
        warn!(error = %err, "initial load failed; the board will show a notice");
    }
    let ticker = tuning.interval.map(|every| board.spawn_periodic_reconcile(every));

    let shell = Shell::new(Arc::clone(&board));
    let outcome = shell
        .run(BufReader::new(tokio::io::stdin()), &mut io::stdout())
        .await
        .wrap_err("shell I/O failed");

    if let Some(handle) = ticker {
        handle.abort();
    }
    outcome
}
