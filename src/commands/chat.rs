use clap::{Args, Subcommand};
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

use super::{format_time, print_json, OutputFormat};
use swoptrader::config::Config;
use swoptrader_core::{ChatMessage, MessageType, Repositories};

#[derive(Args)]
pub struct ChatCommand {
    #[command(subcommand)]
    pub command: ChatSubcommand,
}

#[derive(Subcommand)]
pub enum ChatSubcommand {
    /// Your chats, most recent first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Open (or create) the chat for an offer
    Open {
        /// Offer ID
        offer: String,
    },

    /// Send a message
    Send {
        /// Chat ID
        chat: String,

        text: String,

        /// Message type (text, image, offer, location, system)
        #[arg(long = "type", value_name = "TYPE", default_value = "text")]
        message_type: String,
    },

    /// Messages of a chat, oldest first
    Messages {
        /// Chat ID
        chat: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark a chat as read
    Read {
        /// Chat ID
        chat: String,
    },

    /// Print messages as they arrive (Ctrl-C to stop)
    Watch {
        /// Chat ID
        chat: String,

        /// Seconds between refreshes from the remotes
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

fn print_message(message: &ChatMessage) {
    println!(
        "[{}] {}: {}",
        format_time(message.timestamp),
        message.sender_id,
        message.text
    );
}

impl ChatCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chats = &repos.chats;

        match &self.command {
            ChatSubcommand::List { format } => {
                let me = config.require_user()?;
                let list = chats.list_for_user(me).await?;
                match format {
                    OutputFormat::Json => print_json(&list)?,
                    OutputFormat::Text => {
                        if list.is_empty() {
                            println!("No chats.");
                        }
                        for chat in &list {
                            let others: Vec<&str> = chat
                                .participant_ids
                                .iter()
                                .map(String::as_str)
                                .filter(|p| *p != me)
                                .collect();
                            println!(
                                "{}  with {}  ({} unread)  {}",
                                chat.id,
                                others.join(", "),
                                chat.unread_for(me),
                                chat.last_message
                            );
                        }
                    }
                }
                Ok(())
            }

            ChatSubcommand::Open { offer } => {
                let offer = repos
                    .offers
                    .get(offer)
                    .await?
                    .ok_or_else(|| format!("Offer not found: {}", offer))?;
                let chat = chats.get_or_create_for_offer(&offer).await?;
                println!("{}", chat.id);
                Ok(())
            }

            ChatSubcommand::Send {
                chat,
                text,
                message_type,
            } => {
                let message_type: MessageType = message_type.parse()?;
                let message = chats
                    .send_message(chat, config.require_user()?, text, message_type)
                    .await?;
                print_message(&message);
                Ok(())
            }

            ChatSubcommand::Messages { chat, format } => {
                let messages = chats.list_messages(chat).await?;
                match format {
                    OutputFormat::Json => print_json(&messages)?,
                    OutputFormat::Text => messages.iter().for_each(print_message),
                }
                Ok(())
            }

            ChatSubcommand::Read { chat } => {
                let count = chats.mark_read(chat, config.require_user()?).await?;
                println!("Marked {} message(s) read", count);
                Ok(())
            }

            ChatSubcommand::Watch { chat, interval } => {
                let mut updates = chats.observe_messages(chat);
                let mut refresh = tokio::time::interval(Duration::from_secs((*interval).max(1)));
                let mut seen = HashSet::new();

                loop {
                    let messages = tokio::select! {
                        snapshot = updates.next() => match snapshot {
                            Some(snapshot) => snapshot?,
                            None => break,
                        },
                        // Other writers (another process, the remotes) do not
                        // notify this cache, so re-read on a timer too.
                        _ = refresh.tick() => match chats.list_messages(chat).await {
                            Ok(messages) => messages,
                            Err(e) => {
                                warn!("Refresh failed: {}", e);
                                continue;
                            }
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    };

                    for message in messages {
                        if seen.insert(message.id.clone()) {
                            print_message(&message);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
