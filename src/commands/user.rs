use clap::{Args, Subcommand};

use super::{print_json, OutputFormat};
use swoptrader::config::Config;
use swoptrader_core::{Repositories, User};

#[derive(Args)]
pub struct UserCommand {
    #[command(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Show a user's profile (default: the configured user)
    Show {
        /// User ID
        id: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a profile
    Create {
        name: String,

        email: String,

        /// Use this ID instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },

    /// Look a user up by email
    Find {
        email: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn print_user(user: &User, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => print_json(user)?,
        OutputFormat::Text => print!("{}", user),
    }
    Ok(())
}

impl UserCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            UserSubcommand::Show { id, format } => {
                let id = match id {
                    Some(id) => id.as_str(),
                    None => config.require_user()?,
                };
                let user = repos
                    .users
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("User not found: {}", id))?;
                print_user(&user, format)
            }

            UserSubcommand::Create { name, email, id } => {
                if !email.contains('@') {
                    return Err(format!("Invalid email: {}", email).into());
                }
                let mut user = User::new(name.trim(), email.trim());
                if let Some(id) = id {
                    user = user.with_id(id);
                }
                let user = repos.users.save(user).await?;
                println!("Created user:");
                print!("{}", user);
                Ok(())
            }

            UserSubcommand::Find { email, format } => {
                let user = repos
                    .users
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| format!("No user with email {}", email))?;
                print_user(&user, format)
            }
        }
    }
}
