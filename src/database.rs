use async_trait::async_trait;
use mongodb::Collection;

use crate::campaign::db::CampaignStore;
use crate::campaign::Campaign;
use crate::error::Error;
use crate::participant::db::ParticipantStore;
use crate::participant::Participant;

pub type MongoCampaignStore = Collection<Campaign>;
pub type MongoParticipantStore = Collection<Participant>;

#[async_trait]
pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;
    fn participants(&self) -> &dyn ParticipantStore;
    async fn drop(&self) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaigns: Collection<Campaign>,
    participants: Collection<Participant>,
    db: mongodb::Database,
}

impl MongoDatabase {
    pub fn new(db: mongodb::Database) -> MongoDatabase {
        MongoDatabase {
            campaigns: db.collection("campaigns"),
            participants: db.collection("participants"),
            db,
        }
    }
}

#[async_trait]
impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn participants(&self) -> &dyn ParticipantStore {
        &self.participants
    }

    async fn drop(&self) -> Result<(), Error> {
        self.db.drop(None).await?;
        Ok(())
    }
}
