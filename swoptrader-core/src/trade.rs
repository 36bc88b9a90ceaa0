//! Trade completion: closes an accepted offer and credits both traders.

use std::fmt;
use tracing::{info, warn};

use crate::models::{
    now_millis, Item, Meetup, MeetupStatus, Offer, OfferStatus, TradeHistory, TradedItem, User,
};
use crate::repository::{
    ItemRepository, MeetupRepository, OfferRepository, Repositories, TradeHistoryRepository,
    UserRepository,
};
use crate::scoring::{calculate_carbon_saved, calculate_trade_score};
use crate::sync::SyncError;

#[derive(Debug, thiserror::Error)]
pub enum TradeError {
    #[error("Offer '{0}' not found")]
    OfferNotFound(String),
    #[error("Item '{0}' not found")]
    ItemNotFound(String),
    #[error("User '{0}' not found")]
    UserNotFound(String),
    #[error("Offer '{offer_id}' cannot be completed: {reason}")]
    NotCompletable { offer_id: String, reason: String },
    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStep {
    CompleteMeetup,
    AcceptOffer,
    ComputeImpact,
    RecordHistory,
    UpdateScores,
    SaveUsers,
}

impl fmt::Display for TradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStep::CompleteMeetup => "complete meetup",
            TradeStep::AcceptOffer => "accept offer",
            TradeStep::ComputeImpact => "compute impact",
            TradeStep::RecordHistory => "record history",
            TradeStep::UpdateScores => "update scores",
            TradeStep::SaveUsers => "save users",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    Failed(String),
}

/// What happened at each step of a trade completion.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCompletionReport {
    pub offer_id: String,
    pub steps: Vec<(TradeStep, StepOutcome)>,
    pub carbon_saved: f64,
    pub trade_score: i64,
    pub history: Option<TradeHistory>,
}

impl TradeCompletionReport {
    fn new(offer_id: &str) -> Self {
        Self {
            offer_id: offer_id.to_string(),
            steps: Vec::new(),
            carbon_saved: 0.0,
            trade_score: 0,
            history: None,
        }
    }

    fn record(&mut self, step: TradeStep, result: Result<StepOutcome, SyncError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(offer_id = %self.offer_id, "Trade step '{}' failed: {}", step, e);
                StepOutcome::Failed(e.to_string())
            }
        };
        self.steps.push((step, outcome));
    }

    pub fn outcome(&self, step: TradeStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    pub fn failures(&self) -> Vec<(TradeStep, &str)> {
        self.steps
            .iter()
            .filter_map(|(step, outcome)| match outcome {
                StepOutcome::Failed(message) => Some((*step, message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}

impl fmt::Display for TradeCompletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trade for offer {}", self.offer_id)?;
        for (step, outcome) in &self.steps {
            match outcome {
                StepOutcome::Done => writeln!(f, "  [ok]   {}", step)?,
                StepOutcome::Skipped(why) => writeln!(f, "  [skip] {} ({})", step, why)?,
                StepOutcome::Failed(why) => writeln!(f, "  [fail] {}: {}", step, why)?,
            }
        }
        writeln!(f, "Carbon saved: {:.2} kg", self.carbon_saved)?;
        writeln!(f, "Trade score: {}", self.trade_score)
    }
}

struct TradeParties {
    offer: Offer,
    requested: Item,
    offered: Vec<Item>,
    sender: User,
    recipient: User,
}

#[derive(Clone)]
pub struct TradeService {
    items: ItemRepository,
    users: UserRepository,
    offers: OfferRepository,
    meetups: MeetupRepository,
    history: TradeHistoryRepository,
}

impl TradeService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            items: repos.items.clone(),
            users: repos.users.clone(),
            offers: repos.offers.clone(),
            meetups: repos.meetups.clone(),
            history: repos.history.clone(),
        }
    }

    async fn load(&self, offer_id: &str) -> Result<TradeParties, TradeError> {
        let offer = self
            .offers
            .get(offer_id)
            .await?
            .ok_or_else(|| TradeError::OfferNotFound(offer_id.to_string()))?;
        self.ensure_completable(&offer).await?;

        let requested = self.load_item(&offer.requested_item_id).await?;
        let mut offered = Vec::with_capacity(offer.offered_item_ids.len());
        for id in &offer.offered_item_ids {
            offered.push(self.load_item(id).await?);
        }

        let sender = self.load_user(&offer.from_user_id).await?;
        let recipient = self.load_user(&offer.to_user_id).await?;

        Ok(TradeParties {
            offer,
            requested,
            offered,
            sender,
            recipient,
        })
    }

    /// Rejects offers that were closed without a trade or already completed.
    async fn ensure_completable(&self, offer: &Offer) -> Result<(), TradeError> {
        let not_completable = |reason: String| TradeError::NotCompletable {
            offer_id: offer.id.clone(),
            reason,
        };

        match offer.status {
            OfferStatus::Rejected | OfferStatus::Cancelled | OfferStatus::Expired => {
                return Err(not_completable(format!("offer is {}", offer.status)));
            }
            OfferStatus::Pending | OfferStatus::Accepted | OfferStatus::Countered => {}
        }

        if offer
            .meetup
            .as_ref()
            .is_some_and(|m| m.status == MeetupStatus::Completed)
        {
            return Err(not_completable("meetup already completed".to_string()));
        }

        if let Some(history) = self.history.find_for_offer(&offer.id).await? {
            return Err(not_completable(format!("already recorded as {}", history.id)));
        }
        Ok(())
    }

    async fn load_item(&self, id: &str) -> Result<Item, TradeError> {
        self.items
            .get(id)
            .await?
            .ok_or_else(|| TradeError::ItemNotFound(id.to_string()))
    }

    async fn load_user(&self, id: &str) -> Result<User, TradeError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| TradeError::UserNotFound(id.to_string()))
    }

    /// Marks the meetup completed, accepts the offer, records the trade and
    /// credits both users.
    ///
    /// Only loading the offer, its items and both users can fail the call,
    /// as can an offer that is rejected, cancelled, expired or already
    /// completed.
    /// Every later step runs even if an earlier one failed; nothing is
    /// rolled back, and the report says which steps did not go through.
    pub async fn complete_trade(&self, offer_id: &str) -> Result<TradeCompletionReport, TradeError> {
        let TradeParties {
            mut offer,
            requested,
            offered,
            mut sender,
            mut recipient,
        } = self.load(offer_id).await?;

        let mut report = TradeCompletionReport::new(offer_id);
        let now = now_millis();

        let meetup = self.complete_meetup(&mut offer, now).await;
        let meetup_id = match &meetup {
            Ok(Some(meetup)) => Some(meetup.id.clone()),
            _ => offer.meetup.as_ref().map(|m| m.id.clone()),
        };
        report.record(
            TradeStep::CompleteMeetup,
            meetup.map(|m| match m {
                Some(_) => StepOutcome::Done,
                None => StepOutcome::Skipped("no meetup scheduled".to_string()),
            }),
        );

        offer.status = OfferStatus::Accepted;
        let accepted = self.offers.save(offer.clone()).await;
        report.record(TradeStep::AcceptOffer, accepted.map(|_| StepOutcome::Done));

        let carbon = calculate_carbon_saved(&requested, &offered);
        let score = calculate_trade_score(&requested, &offered);
        report.carbon_saved = carbon;
        report.trade_score = score;
        report.record(TradeStep::ComputeImpact, Ok(StepOutcome::Done));

        let mut history = TradeHistory::new(&offer.id, offer.participant_ids(), now);
        history.items_traded = traded_items(&offer, &requested, &offered);
        history.meetup_id = meetup_id;
        history.carbon_saved = carbon;
        history.trade_score_earned = score;
        let recorded = match self.history.save(history).await {
            Ok(history) => {
                report.history = Some(history);
                Ok(StepOutcome::Done)
            }
            Err(e) => Err(e),
        };
        report.record(TradeStep::RecordHistory, recorded);

        sender.apply_trade(score, carbon);
        recipient.apply_trade(score, carbon);
        report.record(TradeStep::UpdateScores, Ok(StepOutcome::Done));

        let mut user_failures = Vec::new();
        for user in [sender, recipient] {
            let id = user.id.clone();
            if let Err(e) = self.users.save(user).await {
                user_failures.push(format!("{}: {}", id, e));
            }
        }
        let users_saved = if user_failures.is_empty() {
            StepOutcome::Done
        } else {
            warn!(offer_id, "Failed to save users: {}", user_failures.join("; "));
            StepOutcome::Failed(user_failures.join("; "))
        };
        report.record(TradeStep::SaveUsers, Ok(users_saved));

        info!(
            offer_id,
            carbon_saved = carbon,
            trade_score = score,
            complete = report.is_complete(),
            "Trade completed"
        );
        Ok(report)
    }

    /// Completes the embedded meetup and the meetup document, if any.
    /// Returns the meetup that was completed.
    async fn complete_meetup(
        &self,
        offer: &mut Offer,
        now: i64,
    ) -> Result<Option<Meetup>, SyncError> {
        if let Some(embedded) = offer.meetup.as_mut() {
            embedded.complete(now);
        }

        let document = match self.meetups.find_for_offer(&offer.id).await? {
            Some(meetup) => Some(meetup),
            None => offer.meetup.clone(),
        };

        match document {
            Some(mut meetup) => {
                meetup.complete(now);
                Ok(Some(self.meetups.save(meetup).await?))
            }
            None => Ok(None),
        }
    }
}

/// The requested item goes to the offer's sender; each offered item goes
/// to the recipient.
fn traded_items(offer: &Offer, requested: &Item, offered: &[Item]) -> Vec<TradedItem> {
    let to_sender = std::iter::once((requested, &offer.from_user_id));
    let to_recipient = offered.iter().map(|item| (item, &offer.to_user_id));

    to_sender
        .chain(to_recipient)
        .map(|(item, new_owner)| TradedItem {
            item_id: item.id.clone(),
            user_id: new_owner.clone(),
            item_name: item.name.clone(),
            item_image: item.primary_image().unwrap_or_default().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemCategory, ItemCondition, MeetupLocation, MeetupStatus};
    use crate::repository::DataSources;
    use crate::store::MemoryDocumentStore;
    use crate::sync::{MemoryCacheProvider, WriteAckPolicy};
    use std::sync::Arc;

    struct Fixture {
        repos: Repositories,
        store: Arc<MemoryDocumentStore>,
        offer: Offer,
        alice: User,
        bob: User,
    }

    /// Alice offers her books for Bob's camera.
    async fn fixture(write_ack: WriteAckPolicy, with_meetup: bool) -> Fixture {
        let store = Arc::new(MemoryDocumentStore::new());
        let sources = DataSources::offline()
            .with_store(store.clone())
            .with_write_ack(write_ack);
        let repos = Repositories::new(&sources, &MemoryCacheProvider);

        let alice = repos
            .users
            .save(User::new("Alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = repos
            .users
            .save(User::new("Bob", "bob@example.com"))
            .await
            .unwrap();

        let camera = repos
            .items
            .save(
                Item::new("Camera", &bob.id)
                    .with_category(ItemCategory::Electronics)
                    .with_condition(ItemCondition::Good)
                    .with_images(vec!["https://img/camera.jpg".into()]),
            )
            .await
            .unwrap();
        let books = repos
            .items
            .save(
                Item::new("Books", &alice.id)
                    .with_category(ItemCategory::Books)
                    .with_condition(ItemCondition::New),
            )
            .await
            .unwrap();

        let mut offer = repos
            .offers
            .save(Offer::new(&alice.id, &bob.id, &camera.id).with_offered_items(vec![books.id]))
            .await
            .unwrap();

        if with_meetup {
            let meetup = repos
                .meetups
                .save(Meetup::new(
                    &offer.id,
                    offer.participant_ids(),
                    MeetupLocation::default(),
                    now_millis(),
                ))
                .await
                .unwrap();
            offer = repos.offers.attach_meetup(&offer.id, meetup).await.unwrap();
        }

        Fixture {
            repos,
            store,
            offer,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_complete_trade_runs_every_step() {
        let f = fixture(WriteAckPolicy::LocalFirst, true).await;
        let service = TradeService::new(&f.repos);

        let report = service.complete_trade(&f.offer.id).await.unwrap();

        assert!(report.is_complete(), "{}", report);
        let steps: Vec<TradeStep> = report.steps.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            steps,
            vec![
                TradeStep::CompleteMeetup,
                TradeStep::AcceptOffer,
                TradeStep::ComputeImpact,
                TradeStep::RecordHistory,
                TradeStep::UpdateScores,
                TradeStep::SaveUsers,
            ]
        );

        // camera 15+3+5, books 5+5+5
        assert_eq!(report.trade_score, 38);
        // (3.0 * 1.0 + 0.5 * 1.5) * 1.1
        assert!((report.carbon_saved - 4.125).abs() < 1e-9);

        let offer = f.repos.offers.get(&f.offer.id).await.unwrap().unwrap();
        assert_eq!(offer.status, OfferStatus::Accepted);
        assert_eq!(
            offer.meetup.as_ref().map(|m| m.status),
            Some(MeetupStatus::Completed)
        );
        let meetup = f
            .repos
            .meetups
            .find_for_offer(&f.offer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meetup.status, MeetupStatus::Completed);
        assert!(meetup.completed_at.is_some());

        for user_id in [&f.alice.id, &f.bob.id] {
            let user = f.repos.users.get(user_id).await.unwrap().unwrap();
            assert_eq!(user.trade_score, 38);
            assert!((user.carbon_saved - 4.125).abs() < 1e-9);
            assert_eq!(user.level, 1);
        }
    }

    #[tokio::test]
    async fn test_history_attributes_items_to_new_owners() {
        let f = fixture(WriteAckPolicy::LocalFirst, false).await;
        let service = TradeService::new(&f.repos);

        let report = service.complete_trade(&f.offer.id).await.unwrap();

        assert_eq!(
            report.outcome(TradeStep::CompleteMeetup),
            Some(&StepOutcome::Skipped("no meetup scheduled".to_string()))
        );
        let history = report.history.unwrap();
        assert_eq!(history.items_traded.len(), 2);
        assert_eq!(history.items_traded[0].item_name, "Camera");
        assert_eq!(history.items_traded[0].user_id, f.alice.id);
        assert_eq!(history.items_traded[0].item_image, "https://img/camera.jpg");
        assert_eq!(history.items_traded[1].item_name, "Books");
        assert_eq!(history.items_traded[1].user_id, f.bob.id);
        assert_eq!(history.trade_score_earned, 38);

        let for_bob = f.repos.history.list_for_user(&f.bob.id).await.unwrap();
        assert_eq!(for_bob.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_steps_do_not_stop_later_steps() {
        let f = fixture(WriteAckPolicy::RemoteConfirmed, true).await;
        f.store.set_offline(true);
        let service = TradeService::new(&f.repos);

        let report = service.complete_trade(&f.offer.id).await.unwrap();

        assert!(!report.is_complete());
        let failed: Vec<TradeStep> = report.failures().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            failed,
            vec![
                TradeStep::CompleteMeetup,
                TradeStep::AcceptOffer,
                TradeStep::RecordHistory,
                TradeStep::SaveUsers,
            ]
        );
        assert_eq!(report.outcome(TradeStep::UpdateScores), Some(&StepOutcome::Done));

        // local writes are kept, nothing is rolled back
        let offer = f.repos.offers.get(&f.offer.id).await.unwrap().unwrap();
        assert_eq!(offer.status, OfferStatus::Accepted);
        let alice = f.repos.users.get(&f.alice.id).await.unwrap().unwrap();
        assert_eq!(alice.trade_score, 38);
    }

    #[tokio::test]
    async fn test_local_first_absorbs_cloud_outage() {
        let f = fixture(WriteAckPolicy::LocalFirst, true).await;
        f.store.set_offline(true);
        let service = TradeService::new(&f.repos);

        let report = service.complete_trade(&f.offer.id).await.unwrap();
        assert!(report.is_complete(), "{}", report);
    }

    async fn assert_credited_once(f: &Fixture) {
        let alice = f.repos.users.get(&f.alice.id).await.unwrap().unwrap();
        assert_eq!(alice.trade_score, 38);
        let history = f.repos.history.list_for_user(&f.alice.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_completed_meetup_blocks_second_completion() {
        let f = fixture(WriteAckPolicy::LocalFirst, true).await;
        let service = TradeService::new(&f.repos);
        service.complete_trade(&f.offer.id).await.unwrap();

        let again = service.complete_trade(&f.offer.id).await;
        assert!(matches!(again, Err(TradeError::NotCompletable { .. })));
        assert_credited_once(&f).await;
    }

    #[tokio::test]
    async fn test_recorded_history_blocks_second_completion() {
        let f = fixture(WriteAckPolicy::LocalFirst, false).await;
        let service = TradeService::new(&f.repos);
        service.complete_trade(&f.offer.id).await.unwrap();

        let again = service.complete_trade(&f.offer.id).await;
        match again {
            Err(TradeError::NotCompletable { offer_id, reason }) => {
                assert_eq!(offer_id, f.offer.id);
                assert!(reason.starts_with("already recorded"), "{}", reason);
            }
            other => panic!("expected NotCompletable, got {:?}", other.map(|r| r.offer_id)),
        }
        assert_credited_once(&f).await;
    }

    #[tokio::test]
    async fn test_closed_offers_are_not_completable() {
        let f = fixture(WriteAckPolicy::LocalFirst, false).await;
        let service = TradeService::new(&f.repos);

        for status in [OfferStatus::Rejected, OfferStatus::Cancelled, OfferStatus::Expired] {
            f.repos
                .offers
                .update_status(&f.offer.id, status)
                .await
                .unwrap();

            assert!(matches!(
                service.complete_trade(&f.offer.id).await,
                Err(TradeError::NotCompletable { .. })
            ));
            let offer = f.repos.offers.get(&f.offer.id).await.unwrap().unwrap();
            assert_eq!(offer.status, status);
        }

        let alice = f.repos.users.get(&f.alice.id).await.unwrap().unwrap();
        assert_eq!(alice.trade_score, 0);
        assert!(f.repos.history.list_for_user(&f.alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_records_abort_before_any_step() {
        let f = fixture(WriteAckPolicy::LocalFirst, false).await;
        let service = TradeService::new(&f.repos);

        assert!(matches!(
            service.complete_trade("offer_missing").await,
            Err(TradeError::OfferNotFound(_))
        ));

        let orphan = f
            .repos
            .offers
            .save(Offer::new(&f.alice.id, &f.bob.id, "item_missing"))
            .await
            .unwrap();
        assert!(matches!(
            service.complete_trade(&orphan.id).await,
            Err(TradeError::ItemNotFound(_))
        ));
        let untouched = f.repos.offers.get(&orphan.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, OfferStatus::Pending);
    }
}
