use clap::{Args, Subcommand};

use swoptrader_core::{Repositories, TradeService};

#[derive(Args)]
pub struct TradeCommand {
    #[command(subcommand)]
    pub command: TradeSubcommand,
}

#[derive(Subcommand)]
pub enum TradeSubcommand {
    /// Complete the trade for an offer: close the meetup, accept the offer,
    /// record history and credit both traders
    Complete {
        /// Offer ID
        offer: String,
    },
}

impl TradeCommand {
    pub async fn run(&self, repos: &Repositories) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TradeSubcommand::Complete { offer } => {
                let report = TradeService::new(repos).complete_trade(offer).await?;
                print!("{}", report);
                if let Some(history) = &report.history {
                    println!("History: {}", history.id);
                }
                if !report.is_complete() {
                    return Err(format!(
                        "{} step(s) failed; completed steps were kept",
                        report.failures().len()
                    )
                    .into());
                }
                Ok(())
            }
        }
    }
}
