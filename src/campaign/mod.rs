use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type CampaignId = TypedId<Campaign>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub name: String,
    pub kind: CampaignKind,
    pub prizes: Vec<Prize>,
    // draw cursor into `prizes`; persisted so a draw session survives restart
    pub current_prize_index: i32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl TypedIdMarker for Campaign {
    fn tag() -> &'static str {
        "CPN"
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum CampaignKind {
    #[serde(rename = "OFFLINE")]
    InPerson,
    #[serde(rename = "ONLINE")]
    Remote,
}

/// One entry in a campaign's ordered prize sequence. The quantity is shown to
/// the audience but is not decremented by a draw; the cursor alone decides
/// which prize is up.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Prize {
    pub name: String,
    pub quantity: i32,
}
