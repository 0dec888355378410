use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson;

use crate::database::MongoCampaignStore;
use crate::error::Error;

use super::{Campaign, CampaignId, Prize};

// the Send + Sync supertrait keeps assert_campaign_exists callable through
// &dyn CampaignStore, since the generated default method bounds on Self: Sync
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error>;

    async fn assert_campaign_exists(&self, campaign_id: CampaignId) -> Result<Campaign, Error> {
        self.fetch_campaign_by_id(campaign_id)
            .await?
            .ok_or(Error::CampaignDoesNotExist { campaign_id })
    }

    async fn update_campaign(
        &self,
        mut campaign: Campaign,
        name: Option<String>,
        prizes: Option<Vec<Prize>>,
    ) -> Result<Campaign, Error>;

    async fn update_campaign_prize_cursor(
        &self,
        mut campaign: Campaign,
        index: i32,
    ) -> Result<Campaign, Error>;

    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error>;
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, Error> {
        let campaigns: Vec<Campaign> = self.find(bson::doc! {}, None).await?.try_collect().await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign: Option<Campaign> =
            self.find_one(bson::doc! { "_id": campaign_id }, None).await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(
        &self,
        mut campaign: Campaign,
        name: Option<String>,
        prizes: Option<Vec<Prize>>,
    ) -> Result<Campaign, Error> {
        let now = Utc::now();
        let old_modified_at = bson::DateTime::from_chrono(campaign.modified_at);
        let new_modified_at = bson::DateTime::from_chrono(now);

        let mut fields = bson::doc! { "modified_at": new_modified_at };
        if let Some(name) = &name {
            fields.insert("name", name.as_str());
        }
        if let Some(prizes) = &prizes {
            fields.insert("prizes", bson::to_bson(prizes)?);
        }

        let result = self
            .update_one(
                bson::doc! { "_id": campaign.id, "modified_at": old_modified_at },
                bson::doc! { "$set": fields },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        campaign.modified_at = now;
        if let Some(name) = name {
            campaign.name = name;
        }
        if let Some(prizes) = prizes {
            campaign.prizes = prizes;
        }

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign_prize_cursor(
        &self,
        mut campaign: Campaign,
        index: i32,
    ) -> Result<Campaign, Error> {
        let now = Utc::now();
        let old_modified_at = bson::DateTime::from_chrono(campaign.modified_at);
        let new_modified_at = bson::DateTime::from_chrono(now);

        let result = self
            .update_one(
                bson::doc! { "_id": campaign.id, "modified_at": old_modified_at },
                bson::doc! { "$set": { "current_prize_index": index, "modified_at": new_modified_at } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        campaign.modified_at = now;
        campaign.current_prize_index = index;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        let result = self.delete_one(bson::doc! { "_id": campaign_id }, None).await?;

        if result.deleted_count == 0 {
            return Err(Error::CampaignDoesNotExist { campaign_id });
        }

        Ok(())
    }
}
