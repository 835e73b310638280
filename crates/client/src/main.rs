use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideabox_client::config::ClientConfig;
use ideabox_client::guard::GuardDecision;
use ideabox_client::navigation::Route;
use ideabox_client::orchestrator::Tab;
use ideabox_client::IdeaBoxClient;

/// Signs in (with `IDEABOX_USER`, or the stored session) and lists the
/// board. Pass `favourite` to list only the ideas you voted for.
#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ideabox_client=info,ideabox=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let client = match IdeaBoxClient::connect(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start client");
            return ExitCode::FAILURE;
        }
    };

    // --- Sign-in ---
    let decision = match std::env::var("IDEABOX_USER") {
        Ok(name) => {
            let login = client.login_view();
            login.enter();
            match login.submit(&name).await {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::error!(error = %e, "Display name rejected");
                    return ExitCode::FAILURE;
                }
            }
        }
        Err(_) => client.guard.navigate(Route::IdeaBox).await,
    };
    if decision == GuardDecision::Deny {
        tracing::error!("Not signed in; set IDEABOX_USER to log in");
        return ExitCode::from(2);
    }

    // --- Board ---
    let tab = match std::env::args().nth(1).as_deref() {
        Some("favourite") => Tab::FavouriteIdeas,
        _ => Tab::AllIdeas,
    };

    let board = client.board();
    let mut loaded = board.load().await;
    if loaded.is_ok() && tab == Tab::FavouriteIdeas {
        loaded = board.select_tab(tab).await;
    }
    if let Err(e) = loaded {
        tracing::error!(error = %e, "Failed to load board");
        board.teardown();
        return ExitCode::FAILURE;
    }

    let voted = client.store.voted_for();
    for idea in client.store.ideas() {
        tracing::info!(
            id = %idea.id,
            status = %idea.status,
            votes = idea.vote_count,
            comments = idea.comments.len(),
            voted = voted.contains(&idea.id),
            "{}",
            idea.title
        );
    }
    tracing::info!(
        identity = ?client.session.identity(),
        count = client.store.ideas().len(),
        ?tab,
        "Board loaded",
    );

    board.teardown();
    ExitCode::SUCCESS
}
