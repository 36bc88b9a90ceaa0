use clap::{Args, Subcommand};

use super::{format_time, print_json, OutputFormat};
use swoptrader::config::Config;
use swoptrader_core::{Item, ItemCategory, ItemCondition, Location, Repositories};

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// List available items, newest first
    List {
        /// Only items owned by this user
        #[arg(long)]
        owner: Option<String>,

        /// Maximum number of items
        #[arg(long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an item's details
    Show {
        /// Item ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Search available items by name, description or wanted trades
    Search {
        /// Text to look for (case-insensitive)
        text: String,

        /// Restrict to a category (e.g. electronics, home-garden)
        #[arg(long)]
        category: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Available items near a location, nearest first
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search radius in kilometres
        #[arg(long, default_value_t = 25.0)]
        radius: f64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List a new item as the configured user
    Create {
        /// Name of the item
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Category (default: other)
        #[arg(long)]
        category: Option<String>,

        /// Condition (default: good)
        #[arg(long)]
        condition: Option<String>,

        /// Image URL (can be repeated)
        #[arg(long = "image", value_name = "URL")]
        images: Vec<String>,

        /// Something you would trade it for (can be repeated)
        #[arg(long = "want", value_name = "TEXT")]
        wants: Vec<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long, default_value = "")]
        address: String,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: String,
    },

    /// Record a view of an item
    View {
        /// Item ID
        id: String,
    },
}

fn print_items(items: &[Item], format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => print_json(items)?,
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No items found.");
                return Ok(());
            }
            for item in items {
                let distance = item
                    .distance
                    .map(|d| format!("  {:.1} km", d))
                    .unwrap_or_default();
                println!(
                    "{}  {} [{} / {}]{}",
                    item.id, item.name, item.category, item.condition, distance
                );
            }
        }
    }
    Ok(())
}

impl ItemCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let items = &repos.items;

        match &self.command {
            ItemSubcommand::List {
                owner,
                limit,
                format,
            } => {
                let mut list = match owner {
                    Some(owner) => items.list_by_owner(owner).await?,
                    None => items.list_available(*limit).await?,
                };
                if let Some(limit) = limit {
                    list.truncate(*limit);
                }
                print_items(&list, format)
            }

            ItemSubcommand::Show { id, format } => {
                let item = items
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Item not found: {}", id))?;
                match format {
                    OutputFormat::Json => print_json(&item)?,
                    OutputFormat::Text => {
                        print!("{}", item);
                        println!("Listed: {}", format_time(item.created_at));
                    }
                }
                Ok(())
            }

            ItemSubcommand::Search {
                text,
                category,
                format,
            } => {
                let category = category
                    .as_deref()
                    .map(str::parse::<ItemCategory>)
                    .transpose()?;
                let found = items.search(text, category).await?;
                print_items(&found, format)
            }

            ItemSubcommand::Nearby {
                lat,
                lon,
                radius,
                format,
            } => {
                let here = Location::new(*lat, *lon, "");
                let nearby = items.list_nearby(&here, *radius).await?;
                print_items(&nearby, format)
            }

            ItemSubcommand::Create {
                name,
                description,
                category,
                condition,
                images,
                wants,
                lat,
                lon,
                address,
            } => {
                if name.trim().is_empty() {
                    return Err("Item name cannot be empty".into());
                }
                let owner = config.require_user()?;

                let mut item = Item::new(name.trim(), owner)
                    .with_images(images.clone())
                    .with_desired_trades(wants.clone());
                if let Some(description) = description {
                    item = item.with_description(description);
                }
                if let Some(category) = category {
                    item = item.with_category(category.parse::<ItemCategory>()?);
                }
                if let Some(condition) = condition {
                    item = item.with_condition(condition.parse::<ItemCondition>()?);
                }
                if let (Some(lat), Some(lon)) = (lat, lon) {
                    item = item.with_location(Location::new(*lat, *lon, address));
                }

                let created = items.save(item).await?;
                println!("Created item:");
                print!("{}", created);
                Ok(())
            }

            ItemSubcommand::Delete { id } => {
                items.delete(id).await?;
                println!("Deleted item {}", id);
                Ok(())
            }

            ItemSubcommand::View { id } => {
                let views = items.increment_view_count(id).await?;
                println!("{} now has {} view(s)", id, views);
                Ok(())
            }
        }
    }
}
