use clap::{Args, Subcommand};

use super::{format_time, print_json, OutputFormat};
use swoptrader::config::Config;
use swoptrader_core::Repositories;

#[derive(Args)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub command: HistorySubcommand,
}

#[derive(Subcommand)]
pub enum HistorySubcommand {
    /// Completed trades, newest first
    List {
        /// User ID (default: the configured user)
        #[arg(long)]
        user: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rate a completed trade
    Rate {
        /// Trade history ID
        id: String,

        /// 1 to 5 stars
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        stars: u8,

        #[arg(long, default_value = "")]
        comment: String,
    },
}

impl HistoryCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            HistorySubcommand::List { user, format } => {
                let user = match user {
                    Some(user) => user.as_str(),
                    None => config.require_user()?,
                };
                let trades = repos.history.list_for_user(user).await?;
                match format {
                    OutputFormat::Json => print_json(&trades)?,
                    OutputFormat::Text => {
                        if trades.is_empty() {
                            println!("No completed trades.");
                        }
                        for trade in &trades {
                            let items: Vec<&str> = trade
                                .items_traded
                                .iter()
                                .map(|i| i.item_name.as_str())
                                .collect();
                            let rating = trade
                                .rating
                                .as_ref()
                                .map(|r| format!("  {}/5", r.rating))
                                .unwrap_or_default();
                            println!(
                                "{}  {}  {}  +{} pts  {:.2} kg CO2{}",
                                trade.id,
                                format_time(trade.completed_at),
                                items.join(", "),
                                trade.trade_score_earned,
                                trade.carbon_saved,
                                rating
                            );
                        }
                    }
                }
                Ok(())
            }

            HistorySubcommand::Rate { id, stars, comment } => {
                let me = config.require_user()?;
                let trade = repos.history.rate(id, *stars, comment, me).await?;
                println!("Rated trade {} with {} star(s)", trade.id, stars);
                Ok(())
            }
        }
    }
}
