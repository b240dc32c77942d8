use clap::Parser;
use steeple::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steeple=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path, name }) => {
            steeple::cli::init::run(path, name).await?;
        }
        Some(Commands::Serve { host, port }) => {
            steeple::cli::serve::run(&cli.config, host, port).await?;
        }
        Some(Commands::Migrate) => {
            steeple::cli::migrate::run(&cli.config).await?;
        }
        Some(Commands::CreateUser {
            email,
            name,
            password,
        }) => {
            steeple::cli::create_user::run(&cli.config, &email, &name, password).await?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
