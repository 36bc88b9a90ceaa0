use clap::{Args, Subcommand};

use super::{format_time, print_json, OutputFormat};
use swoptrader::config::Config;
use swoptrader_core::{Comment, Repositories};

#[derive(Args)]
pub struct CommentCommand {
    #[command(subcommand)]
    pub command: CommentSubcommand,
}

#[derive(Subcommand)]
pub enum CommentSubcommand {
    /// Comments on an item, oldest first, with their replies
    List {
        /// Item ID
        item: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Comment on an item
    Add {
        /// Item ID
        item: String,

        text: String,

        /// Reply to this comment instead of the item
        #[arg(long)]
        reply_to: Option<String>,
    },

    /// Change a comment's text
    Edit {
        /// Comment ID
        id: String,

        text: String,
    },

    /// Delete a comment
    Delete {
        /// Comment ID
        id: String,
    },

    /// Like a comment
    Like {
        /// Comment ID
        id: String,
    },
}

fn print_comment(comment: &Comment, indent: &str) {
    let edited = if comment.is_edited { " (edited)" } else { "" };
    println!(
        "{}[{}] {}{}: {}  ({} like(s), {})",
        indent,
        format_time(comment.created_at),
        comment.author_name,
        edited,
        comment.content,
        comment.likes,
        comment.id
    );
}

impl CommentCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let comments = &repos.comments;

        match &self.command {
            CommentSubcommand::List { item, format } => {
                let top_level = comments.list_for_item(item).await?;
                match format {
                    OutputFormat::Json => print_json(&top_level)?,
                    OutputFormat::Text => {
                        if top_level.is_empty() {
                            println!("No comments.");
                        }
                        for comment in &top_level {
                            print_comment(comment, "");
                            for reply in comments.list_replies(&comment.id).await? {
                                print_comment(&reply, "    ");
                            }
                        }
                    }
                }
                Ok(())
            }

            CommentSubcommand::Add {
                item,
                text,
                reply_to,
            } => {
                if text.trim().is_empty() {
                    return Err("Comment cannot be empty".into());
                }
                let me = config.require_user()?;
                let author_name = repos
                    .users
                    .get(me)
                    .await?
                    .map(|user| user.name)
                    .unwrap_or_else(|| me.to_string());

                let mut comment = Comment::new(item, me, author_name, text.trim());
                if let Some(parent) = reply_to {
                    comment = comment.reply_to(parent);
                }

                let comment = comments.add(comment).await?;
                println!("Added comment {}", comment.id);
                Ok(())
            }

            CommentSubcommand::Edit { id, text } => {
                let comment = comments.edit(id, text).await?;
                print_comment(&comment, "");
                Ok(())
            }

            CommentSubcommand::Delete { id } => {
                comments.delete(id).await?;
                println!("Deleted comment {}", id);
                Ok(())
            }

            CommentSubcommand::Like { id } => {
                let likes = comments.like(id).await?;
                println!("{} now has {} like(s)", id, likes);
                Ok(())
            }
        }
    }
}
