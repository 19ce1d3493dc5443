use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod advise;
mod generate;

#[derive(Debug, Parser)]
#[command(name = "wayfarer_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one itinerary from a trip request JSON file and print it.
    Generate {
        /// Trip request JSON (same shape as the API's POST /itineraries body).
        #[arg(long)]
        request: PathBuf,

        #[arg(long, default_value = "cli")]
        user_id: String,

        /// Build and print the prompt without calling the model.
        #[arg(long)]
        dry_run: bool,

        /// Record the trip request and the itinerary in the database.
        #[arg(long)]
        persist: bool,

        /// Exit with an error when any location stays unresolved.
        #[arg(long)]
        fail_on_unresolved: bool,
    },
    /// Check a stored itinerary document against the weather forecast.
    Advise {
        #[arg(long)]
        itinerary: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = wayfarer_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Generate {
            request,
            user_id,
            dry_run,
            persist,
            fail_on_unresolved,
        } => {
            generate::run(
                &settings,
                generate::GenerateArgs {
                    request: &request,
                    user_id: &user_id,
                    dry_run,
                    persist,
                    fail_on_unresolved,
                },
            )
            .await
        }
        Command::Advise { itinerary } => advise::run(&settings, &itinerary).await,
    }
}

fn init_sentry(settings: &wayfarer_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
