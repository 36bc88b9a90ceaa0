use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    ChatCommand, CommentCommand, ConfigCommand, HistoryCommand, ItemCommand, OfferCommand,
    TradeCommand, UserCommand,
};
use swoptrader::config::Config;
use swoptrader::db::{init_db, SqliteCacheProvider};
use swoptrader_core::{DataSources, Repositories};

#[derive(Parser)]
#[command(name = "swop")]
#[command(version)]
#[command(about = "Trade items with people nearby, online or offline", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Ignore configured remotes and use only the local cache
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse, search and list items
    Item(ItemCommand),

    /// Make and manage trade offers
    Offer(OfferCommand),

    /// Complete trades
    Trade(TradeCommand),

    /// Chat about offers
    Chat(ChatCommand),

    /// Comment on items
    Comment(CommentCommand),

    /// Manage user profiles
    User(UserCommand),

    /// Completed trades and ratings
    History(HistoryCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swoptrader=warn,swoptrader_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let pool = init_db(&config.database_path.value).await?;
    let sources = if cli.offline {
        DataSources::offline().with_write_ack(config.write_policy.value)
    } else {
        config.data_sources()
    };
    let repos = Repositories::new(&sources, &SqliteCacheProvider::new(pool));

    match command {
        Commands::Item(cmd) => cmd.run(&repos, &config).await,
        Commands::Offer(cmd) => cmd.run(&repos, &config).await,
        Commands::Trade(cmd) => cmd.run(&repos).await,
        Commands::Chat(cmd) => cmd.run(&repos, &config).await,
        Commands::Comment(cmd) => cmd.run(&repos, &config).await,
        Commands::User(cmd) => cmd.run(&repos, &config).await,
        Commands::History(cmd) => cmd.run(&repos, &config).await,
        Commands::Config(cmd) => cmd.run(&config),
    }
}
