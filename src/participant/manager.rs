use chrono::Utc;

use crate::broadcast::{Broadcaster, Event};
use crate::campaign::Campaign;
use crate::database::Database;
use crate::error::Error;

use super::{Participant, ParticipantBody, ParticipantId, ParticipantStatus};

#[tracing::instrument(skip(db, broadcaster))]
pub async fn register_participant(
    db: &dyn Database,
    broadcaster: &Broadcaster,
    campaign: &Campaign,
    name: String,
    contact: Option<String>,
) -> Result<Participant, Error> {
    let contact = contact.filter(|contact| !contact.is_empty());
    if let Some(contact) = &contact {
        let existing = db
            .participants()
            .fetch_participant_by_campaign_and_contact(campaign.id, contact)
            .await?;
        if existing.is_some() {
            return Err(Error::DuplicateContact {
                campaign_id: campaign.id,
                contact: contact.clone(),
            });
        }
    }

    let now = Utc::now();
    let participant = Participant {
        id: ParticipantId::new(),
        campaign_id: campaign.id,
        name,
        contact,
        status: ParticipantStatus::CheckedIn,
        won_prize: None,
        created_at: now,
        modified_at: now,
    };

    db.participants().insert_participant(&participant).await?;

    broadcaster.publish(
        campaign.id,
        &Event::ParticipantJoined(ParticipantBody::render(participant.clone())),
    );

    Ok(participant)
}

#[tracing::instrument(skip(db))]
pub async fn get_participants(
    db: &dyn Database,
    campaign: &Campaign,
) -> Result<Vec<Participant>, Error> {
    let participants = db
        .participants()
        .fetch_participants_by_campaign(campaign.id)
        .await?;

    Ok(participants)
}

#[tracing::instrument(skip(db))]
pub async fn get_eligible_participants(
    db: &dyn Database,
    campaign: &Campaign,
) -> Result<Vec<Participant>, Error> {
    let participants = db
        .participants()
        .fetch_eligible_participants_by_campaign(campaign.id)
        .await?;

    Ok(participants)
}

#[tracing::instrument(skip(db))]
pub async fn mark_won(
    db: &dyn Database,
    participant_id: ParticipantId,
    prize_name: String,
) -> Result<Participant, Error> {
    let participant = db
        .participants()
        .fetch_participant_by_id(participant_id)
        .await?
        .ok_or(Error::ParticipantDoesNotExist { participant_id })?;

    if participant.status == ParticipantStatus::Won {
        return Err(Error::ParticipantAlreadyWon {
            participant_id,
            won_prize: participant.won_prize.unwrap_or_default(),
        });
    }

    let participant = db
        .participants()
        .update_participant_won(participant, prize_name)
        .await?;

    Ok(participant)
}

#[tracing::instrument(skip(db, broadcaster))]
pub async fn remove_participant(
    db: &dyn Database,
    broadcaster: &Broadcaster,
    campaign: &Campaign,
    participant_id: ParticipantId,
) -> Result<(), Error> {
    let participant = db
        .participants()
        .fetch_participant_by_campaign_and_id(campaign.id, participant_id)
        .await?
        .ok_or(Error::ParticipantDoesNotExist { participant_id })?;

    db.participants().delete_participant(participant.id).await?;

    broadcaster.publish(campaign.id, &Event::ParticipantDeleted { id: participant.id });

    Ok(())
}
