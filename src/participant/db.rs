use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::options::FindOptions;

use crate::campaign::CampaignId;
use crate::database::MongoParticipantStore;
use crate::error::Error;

use super::{Participant, ParticipantId, ParticipantStatus};

#[async_trait]
pub trait ParticipantStore {
    async fn insert_participant(&self, participant: &Participant) -> Result<(), Error>;

    async fn fetch_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Participant>, Error>;

    async fn fetch_eligible_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Participant>, Error>;

    async fn fetch_participant_by_id(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<Participant>, Error>;

    async fn fetch_participant_by_campaign_and_id(
        &self,
        campaign_id: CampaignId,
        participant_id: ParticipantId,
    ) -> Result<Option<Participant>, Error>;

    async fn fetch_participant_by_campaign_and_contact(
        &self,
        campaign_id: CampaignId,
        contact: &str,
    ) -> Result<Option<Participant>, Error>;

    async fn update_participant_won(
        &self,
        mut participant: Participant,
        prize_name: String,
    ) -> Result<Participant, Error>;

    async fn reset_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, Error>;

    async fn delete_participant(&self, participant_id: ParticipantId) -> Result<(), Error>;

    async fn delete_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, Error>;
}

#[async_trait]
impl ParticipantStore for MongoParticipantStore {
    #[tracing::instrument(skip(self))]
    async fn insert_participant(&self, participant: &Participant) -> Result<(), Error> {
        self.insert_one(participant, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Participant>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": 1, "_id": 1 })
            .build();
        let participants: Vec<Participant> = self
            .find(bson::doc! { "campaign_id": campaign_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(participants)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_eligible_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Participant>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": 1, "_id": 1 })
            .build();
        let participants: Vec<Participant> = self
            .find(
                bson::doc! {
                    "campaign_id": campaign_id,
                    "status": bson::to_bson(&ParticipantStatus::CheckedIn)?,
                },
                options,
            )
            .await?
            .try_collect()
            .await?;

        Ok(participants)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_participant_by_id(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<Participant>, Error> {
        let participant: Option<Participant> = self
            .find_one(bson::doc! { "_id": participant_id }, None)
            .await?;

        Ok(participant)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_participant_by_campaign_and_id(
        &self,
        campaign_id: CampaignId,
        participant_id: ParticipantId,
    ) -> Result<Option<Participant>, Error> {
        let participant: Option<Participant> = self
            .find_one(
                bson::doc! { "_id": participant_id, "campaign_id": campaign_id },
                None,
            )
            .await?;

        Ok(participant)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_participant_by_campaign_and_contact(
        &self,
        campaign_id: CampaignId,
        contact: &str,
    ) -> Result<Option<Participant>, Error> {
        let participant: Option<Participant> = self
            .find_one(
                bson::doc! { "campaign_id": campaign_id, "contact": contact },
                None,
            )
            .await?;

        Ok(participant)
    }

    #[tracing::instrument(skip(self))]
    async fn update_participant_won(
        &self,
        mut participant: Participant,
        prize_name: String,
    ) -> Result<Participant, Error> {
        let now = Utc::now();
        let old_modified_at = bson::DateTime::from_chrono(participant.modified_at);
        let new_modified_at = bson::DateTime::from_chrono(now);

        // the status filter makes the won-once guard hold even if two draws
        // race past the manager's check
        let result = self
            .update_one(
                bson::doc! {
                    "_id": participant.id,
                    "modified_at": old_modified_at,
                    "status": bson::to_bson(&ParticipantStatus::CheckedIn)?,
                },
                bson::doc! { "$set": {
                    "status": bson::to_bson(&ParticipantStatus::Won)?,
                    "won_prize": prize_name.as_str(),
                    "modified_at": new_modified_at,
                } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        participant.modified_at = now;
        participant.status = ParticipantStatus::Won;
        participant.won_prize = Some(prize_name);

        Ok(participant)
    }

    #[tracing::instrument(skip(self))]
    async fn reset_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, Error> {
        let now = bson::DateTime::from_chrono(Utc::now());

        let result = self
            .update_many(
                bson::doc! {
                    "campaign_id": campaign_id,
                    "status": bson::to_bson(&ParticipantStatus::Won)?,
                },
                bson::doc! {
                    "$set": {
                        "status": bson::to_bson(&ParticipantStatus::CheckedIn)?,
                        "modified_at": now,
                    },
                    "$unset": { "won_prize": "" },
                },
                None,
            )
            .await?;

        Ok(result.modified_count)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_participant(&self, participant_id: ParticipantId) -> Result<(), Error> {
        let result = self
            .delete_one(bson::doc! { "_id": participant_id }, None)
            .await?;

        if result.deleted_count == 0 {
            return Err(Error::ParticipantDoesNotExist { participant_id });
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_participants_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, Error> {
        let result = self
            .delete_many(bson::doc! { "campaign_id": campaign_id }, None)
            .await?;

        Ok(result.deleted_count)
    }
}
