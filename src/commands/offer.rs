use clap::{Args, Subcommand};

use super::{format_time, parse_time, print_json, OutputFormat};
use swoptrader::config::Config;
use swoptrader_core::{
    Meetup, MeetupLocation, MeetupLocationType, MeetupStatus, MeetupType, Offer, OfferStatus,
    Repositories,
};

#[derive(Args)]
pub struct OfferCommand {
    #[command(subcommand)]
    pub command: OfferSubcommand,
}

#[derive(Subcommand)]
pub enum OfferSubcommand {
    /// Offers made to you
    Received {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Offers you made
    Sent {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Pitch your items for someone else's item
    Create {
        /// ID of the item you want
        item: String,

        /// ID of an item you offer (can be repeated)
        #[arg(long = "offer", value_name = "ITEM_ID")]
        offered: Vec<String>,

        /// Cash added to the offer
        #[arg(long)]
        cash: Option<f64>,

        #[arg(long)]
        message: Option<String>,
    },

    /// Change an offer's status (pending, accepted, rejected, ...)
    Status {
        /// Offer ID
        id: String,

        status: String,
    },

    /// Schedule a meetup for an offer
    Meetup {
        /// Offer ID
        id: String,

        /// Place name
        #[arg(long)]
        place: String,

        #[arg(long, default_value = "")]
        address: String,

        /// When, as "YYYY-MM-DD HH:MM" (UTC) or RFC 3339
        #[arg(long)]
        at: String,

        /// pickup or delivery
        #[arg(long = "type", value_name = "TYPE")]
        meetup_type: Option<String>,

        /// Kind of place (public-place, police-station, ...)
        #[arg(long)]
        location_type: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change a meetup's status
    MeetupStatus {
        /// Meetup ID
        id: String,

        status: String,
    },
}

fn print_offers(offers: &[Offer], format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => print_json(offers)?,
        OutputFormat::Text => {
            if offers.is_empty() {
                println!("No offers.");
            }
            for offer in offers {
                println!(
                    "{}  [{}]  {} -> {} for {}  ({})",
                    offer.id,
                    offer.status,
                    offer.from_user_id,
                    offer.to_user_id,
                    offer.requested_item_id,
                    format_time(offer.created_at)
                );
            }
        }
    }
    Ok(())
}

impl OfferCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            OfferSubcommand::Received { format } => {
                let offers = repos.offers.list_received(config.require_user()?).await?;
                print_offers(&offers, format)
            }

            OfferSubcommand::Sent { format } => {
                let offers = repos.offers.list_sent(config.require_user()?).await?;
                print_offers(&offers, format)
            }

            OfferSubcommand::Create {
                item,
                offered,
                cash,
                message,
            } => {
                let me = config.require_user()?;
                // Recipient is filled in from the requested item's owner.
                let mut offer = Offer::new(me, "", item).with_offered_items(offered.clone());
                if let Some(cash) = cash {
                    offer = offer.with_cash(*cash);
                }
                if let Some(message) = message {
                    offer = offer.with_message(message);
                }

                let created = repos.offers.create(offer).await?;
                println!("Created offer:");
                print!("{}", created);
                Ok(())
            }

            OfferSubcommand::Status { id, status } => {
                let status: OfferStatus = status.parse()?;
                match repos.offers.update_status(id, status).await? {
                    Some(offer) => println!("Offer {} is now {}", offer.id, offer.status),
                    None => println!("Offer {} set to {} (not cached locally)", id, status),
                }
                Ok(())
            }

            OfferSubcommand::Meetup {
                id,
                place,
                address,
                at,
                meetup_type,
                location_type,
                notes,
            } => {
                let offer = repos
                    .offers
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Offer not found: {}", id))?;

                let location = MeetupLocation {
                    name: place.clone(),
                    address: address.clone(),
                    location_type: location_type
                        .as_deref()
                        .map(str::parse::<MeetupLocationType>)
                        .transpose()?
                        .unwrap_or_default(),
                    ..MeetupLocation::default()
                };

                let mut meetup =
                    Meetup::new(&offer.id, offer.participant_ids(), location, parse_time(at)?);
                if let Some(meetup_type) = meetup_type {
                    meetup = meetup.with_type(meetup_type.parse::<MeetupType>()?);
                }
                if let Some(notes) = notes {
                    meetup = meetup.with_notes(notes);
                }

                let meetup = repos.meetups.save(meetup).await?;
                let offer = repos.offers.attach_meetup(&offer.id, meetup.clone()).await?;
                println!(
                    "Scheduled meetup {} at {} on {}",
                    meetup.id,
                    meetup.location.name,
                    format_time(meetup.scheduled_at)
                );
                print!("{}", offer);
                Ok(())
            }

            OfferSubcommand::MeetupStatus { id, status } => {
                let status: MeetupStatus = status.parse()?;
                match repos.meetups.update_status(id, status).await? {
                    Some(meetup) => println!("Meetup {} is now {}", meetup.id, meetup.status),
                    None => println!("Meetup {} set to {} (not cached locally)", id, status),
                }
                Ok(())
            }
        }
    }
}
