use crate::broadcast::{Broadcaster, Event};
use crate::campaign::{self, Campaign};
use crate::database::Database;
use crate::error::Error;
use crate::participant::{self, Participant, ParticipantBody};

use super::DrawCoordinator;

/// Selects one winner for the campaign's current prize.
///
/// The draw token is claimed for the whole operation so a double-click or a
/// second admin screen cannot start an overlapping draw for the same
/// campaign. If persisting the win fails the token is still released and the
/// error surfaces to the operator; the draw is not retried, since a retry
/// could pick a different participant for what the audience saw as a single
/// event.
#[tracing::instrument(skip(db, broadcaster, draws))]
pub async fn draw_winner(
    db: &dyn Database,
    broadcaster: &Broadcaster,
    draws: &DrawCoordinator,
    campaign: &Campaign,
) -> Result<Participant, Error> {
    let _guard = draws.begin(campaign.id)?;

    let prize = campaign::manager::current_prize(campaign).ok_or(Error::NoMorePrizes {
        campaign_id: campaign.id,
    })?;

    let mut eligible = db
        .participants()
        .fetch_eligible_participants_by_campaign(campaign.id)
        .await?;
    if eligible.is_empty() {
        return Err(Error::NoEligibleParticipants {
            campaign_id: campaign.id,
        });
    }

    let index = draws.pick(eligible.len());
    let selected = eligible.swap_remove(index);

    let winner = participant::manager::mark_won(db, selected.id, prize.name.clone()).await?;

    broadcaster.publish(
        campaign.id,
        &Event::WinnerSelected(ParticipantBody::render(winner.clone())),
    );

    Ok(winner)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use tokio::sync::mpsc;

    use super::*;
    use crate::broadcast::SessionId;
    use crate::campaign::{CampaignId, CampaignKind, Prize};
    use crate::database::test::MockDatabase;
    use crate::draw::WinnerPicker;
    use crate::participant::{ParticipantId, ParticipantStatus};

    struct SequencePicker {
        picks: Mutex<VecDeque<usize>>,
    }

    impl SequencePicker {
        fn new(picks: Vec<usize>) -> SequencePicker {
            SequencePicker {
                picks: Mutex::new(picks.into()),
            }
        }
    }

    impl WinnerPicker for SequencePicker {
        fn pick(&self, pool_size: usize) -> usize {
            self.picks.lock().unwrap().pop_front().unwrap() % pool_size
        }
    }

    fn sample_campaign(prizes: Vec<(&str, i32)>, current_prize_index: i32) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: CampaignId::new(),
            name: "Year End Party".to_string(),
            kind: CampaignKind::InPerson,
            prizes: prizes
                .into_iter()
                .map(|(name, quantity)| Prize {
                    name: name.to_string(),
                    quantity,
                })
                .collect(),
            current_prize_index,
            created_at: now,
            modified_at: now,
        }
    }

    fn sample_participant(campaign_id: CampaignId, name: &str) -> Participant {
        let now = Utc::now();
        Participant {
            id: ParticipantId::new(),
            campaign_id,
            name: name.to_string(),
            contact: None,
            status: ParticipantStatus::CheckedIn,
            won_prize: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// A stateful mock over a shared participant list, so draws observe each
    /// other's effects like they would against real storage.
    fn stateful_db(pool: Arc<Mutex<Vec<Participant>>>) -> MockDatabase {
        let mut db = MockDatabase::new();

        let fetch_pool = Arc::clone(&pool);
        db.participants.on_fetch_eligible_participants_by_campaign = Box::new(move |_| {
            Ok(fetch_pool
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.status == ParticipantStatus::CheckedIn)
                .cloned()
                .collect())
        });

        let fetch_by_id_pool = Arc::clone(&pool);
        db.participants.on_fetch_participant_by_id = Box::new(move |participant_id| {
            Ok(fetch_by_id_pool
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == participant_id)
                .cloned())
        });

        let update_pool = Arc::clone(&pool);
        db.participants.on_update_participant_won =
            Box::new(move |mut participant, prize_name| {
                participant.status = ParticipantStatus::Won;
                participant.won_prize = Some(prize_name);
                let mut pool = update_pool.lock().unwrap();
                let stored = pool
                    .iter_mut()
                    .find(|p| p.id == participant.id)
                    .expect("participant disappeared");
                *stored = participant.clone();
                Ok(participant)
            });

        db
    }

    #[tokio::test]
    async fn draw_marks_the_picked_participant_and_broadcasts() {
        let campaign = sample_campaign(vec![("Bike", 1)], 0);
        let pool = Arc::new(Mutex::new(vec![
            sample_participant(campaign.id, "P1"),
            sample_participant(campaign.id, "P2"),
            sample_participant(campaign.id, "P3"),
        ]));
        let db = stateful_db(Arc::clone(&pool));

        let broadcaster = Broadcaster::new();
        let (sender, mut receiver) = mpsc::unbounded_channel();
        broadcaster.join(SessionId::new(), campaign.id, sender);

        let draws = DrawCoordinator::with_picker(Box::new(SequencePicker::new(vec![1])));
        let winner = draw_winner(&db, &broadcaster, &draws, &campaign)
            .await
            .unwrap();

        assert_eq!(winner.name, "P2");
        assert_eq!(winner.status, ParticipantStatus::Won);
        assert_eq!(winner.won_prize, Some("Bike".to_string()));

        let payload = receiver.try_recv().unwrap();
        assert!(payload.contains("winner_selected"), "payload: {}", payload);
        assert!(payload.contains("Bike"), "payload: {}", payload);
    }

    #[tokio::test]
    async fn draw_with_no_eligible_participants_is_rejected() {
        let campaign = sample_campaign(vec![("Bike", 1)], 0);
        let db = stateful_db(Arc::new(Mutex::new(vec![])));

        let broadcaster = Broadcaster::new();
        let draws = DrawCoordinator::new();
        let result = draw_winner(&db, &broadcaster, &draws, &campaign).await;

        assert_eq!(
            result.unwrap_err(),
            Error::NoEligibleParticipants {
                campaign_id: campaign.id
            }
        );
    }

    #[tokio::test]
    async fn draw_past_the_prize_sequence_is_rejected() {
        let campaign = sample_campaign(vec![("Bike", 1)], 1);
        let db = MockDatabase::new();

        let broadcaster = Broadcaster::new();
        let draws = DrawCoordinator::new();
        let result = draw_winner(&db, &broadcaster, &draws, &campaign).await;

        assert_eq!(
            result.unwrap_err(),
            Error::NoMorePrizes {
                campaign_id: campaign.id
            }
        );
    }

    #[tokio::test]
    async fn concurrent_draw_on_the_same_campaign_is_rejected() {
        let campaign = sample_campaign(vec![("Bike", 1)], 0);
        let db = MockDatabase::new();

        let broadcaster = Broadcaster::new();
        let draws = DrawCoordinator::new();

        // first draw still in flight
        let _guard = draws.begin(campaign.id).unwrap();

        let result = draw_winner(&db, &broadcaster, &draws, &campaign).await;

        assert_eq!(
            result.unwrap_err(),
            Error::DrawInProgress {
                campaign_id: campaign.id
            }
        );
    }

    #[tokio::test]
    async fn draw_on_another_campaign_proceeds_while_one_is_in_flight() {
        let blocked = sample_campaign(vec![("Bike", 1)], 0);
        let open = sample_campaign(vec![("Phone", 1)], 0);
        let pool = Arc::new(Mutex::new(vec![sample_participant(open.id, "P1")]));
        let db = stateful_db(pool);

        let broadcaster = Broadcaster::new();
        let draws = DrawCoordinator::with_picker(Box::new(SequencePicker::new(vec![0])));
        let _guard = draws.begin(blocked.id).unwrap();

        let winner = draw_winner(&db, &broadcaster, &draws, &open).await.unwrap();

        assert_eq!(winner.name, "P1");
    }

    #[tokio::test]
    async fn failed_persistence_surfaces_and_releases_the_token() {
        let campaign = sample_campaign(vec![("Bike", 1)], 0);
        let participant = sample_participant(campaign.id, "P1");

        let mut db = MockDatabase::new();
        let fetched = participant.clone();
        db.participants.on_fetch_eligible_participants_by_campaign =
            Box::new(move |_| Ok(vec![fetched.clone()]));
        let fetched = participant.clone();
        db.participants.on_fetch_participant_by_id =
            Box::new(move |_| Ok(Some(fetched.clone())));
        db.participants.on_update_participant_won =
            Box::new(|_, _| Err(Error::ConcurrentModificationDetected));

        let broadcaster = Broadcaster::new();
        let draws = DrawCoordinator::with_picker(Box::new(SequencePicker::new(vec![0, 0])));

        let result = draw_winner(&db, &broadcaster, &draws, &campaign).await;
        assert_eq!(result.unwrap_err(), Error::ConcurrentModificationDetected);

        // the token must be free again for the operator's next attempt
        assert!(draws.begin(campaign.id).is_ok());
    }

    #[tokio::test]
    async fn two_prize_scenario_draws_through_the_sequence() {
        let mut campaign = sample_campaign(vec![("Bike", 1), ("Phone", 2)], 0);
        let pool = Arc::new(Mutex::new(vec![
            sample_participant(campaign.id, "P1"),
            sample_participant(campaign.id, "P2"),
            sample_participant(campaign.id, "P3"),
        ]));
        let db = stateful_db(Arc::clone(&pool));

        let broadcaster = Broadcaster::new();
        let draws = DrawCoordinator::with_picker(Box::new(SequencePicker::new(vec![2, 0])));

        let first = draw_winner(&db, &broadcaster, &draws, &campaign)
            .await
            .unwrap();
        assert_eq!(first.won_prize, Some("Bike".to_string()));

        let remaining: Vec<_> = pool
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.status == ParticipantStatus::CheckedIn)
            .cloned()
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|p| p.id != first.id));

        campaign.current_prize_index = 1;
        let second = draw_winner(&db, &broadcaster, &draws, &campaign)
            .await
            .unwrap();
        assert_eq!(second.won_prize, Some("Phone".to_string()));
        assert_ne!(second.id, first.id);
    }
}
