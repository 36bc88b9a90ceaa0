use clap::{Args, Subcommand};

use super::OutputFormat;
use swoptrader::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("database_path: {}", config.database_path.value.display());
                        println!("  source: {}", config.database_path.source);
                        println!();

                        println!("user_id: {}", or_unset(&config.user_id.value));
                        println!("  source: {}", config.user_id.source);
                        println!();

                        println!("write_policy: {}", config.write_policy.value);
                        println!("  source: {}", config.write_policy.source);
                        println!();

                        println!("api.base_url: {}", or_unset(&config.api.base_url));
                        let token = config.api.token.as_ref().map(|_| "********".to_string());
                        println!("api.token: {}", or_unset(&token));
                        println!();

                        println!("firestore.project_id: {}", or_unset(&config.firestore.project_id));
                        println!("firestore.host: {}", or_unset(&config.firestore.host));
                    }
                }
                Ok(())
            }
        }
    }
}
