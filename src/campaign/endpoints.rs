use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Error;
use crate::participant::ParticipantBody;

use super::{manager, Campaign, CampaignId, CampaignKind, Prize};

#[derive(Clone, Debug, Deserialize)]
pub struct CreateCampaignBody {
    pub name: String,
    pub kind: CampaignKind,
    #[serde(default)]
    pub prizes: Vec<PrizeBody>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateCampaignBody {
    pub name: Option<String>,
    pub prizes: Option<Vec<PrizeBody>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrizeBody {
    pub name: String,
    pub quantity: i32,
}

impl PrizeBody {
    pub fn render(prize: &Prize) -> PrizeBody {
        PrizeBody {
            name: prize.name.clone(),
            quantity: prize.quantity,
        }
    }
}

impl From<PrizeBody> for Prize {
    fn from(body: PrizeBody) -> Prize {
        Prize {
            name: body.name,
            quantity: body.quantity,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub name: String,
    pub kind: CampaignKind,
    pub prizes: Vec<PrizeBody>,
    pub current_prize_index: i32,
    pub current_prize: Option<PrizeBody>,
    pub participants: Vec<ParticipantBody>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CampaignBody {
    pub async fn render(db: &dyn Database, campaign: Campaign) -> Result<CampaignBody, Error> {
        let participants = db
            .participants()
            .fetch_participants_by_campaign(campaign.id)
            .await?;

        Ok(CampaignBody {
            id: campaign.id,
            current_prize: manager::current_prize(&campaign).map(PrizeBody::render),
            prizes: campaign.prizes.iter().map(PrizeBody::render).collect(),
            name: campaign.name,
            kind: campaign.kind,
            current_prize_index: campaign.current_prize_index,
            participants: participants.into_iter().map(ParticipantBody::render).collect(),
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        })
    }
}

#[post("/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: Data<Box<dyn Database>>,
    body: Json<CreateCampaignBody>,
) -> Result<Json<CampaignBody>, Error> {
    let body = body.into_inner();

    let campaign = manager::create_campaign(
        &***db,
        body.name,
        body.kind,
        body.prizes.into_iter().map(Prize::from).collect(),
    )
    .await?;

    Ok(Json(CampaignBody::render(&***db, campaign).await?))
}

#[get("/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn get_campaigns(db: Data<Box<dyn Database>>) -> Result<Json<Vec<CampaignBody>>, Error> {
    let campaigns = manager::get_campaigns(&***db).await?;

    let mut body = Vec::with_capacity(campaigns.len());
    for campaign in campaigns {
        body.push(CampaignBody::render(&***db, campaign).await?);
    }

    Ok(Json(body))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let campaign = manager::get_campaign_by_id(&***db, campaign_id).await?;

    Ok(Json(CampaignBody::render(&***db, campaign).await?))
}

#[put("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
    body: Json<UpdateCampaignBody>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let body = body.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    let campaign = manager::update_campaign(
        &***db,
        campaign,
        body.name,
        body.prizes
            .map(|prizes| prizes.into_iter().map(Prize::from).collect()),
    )
    .await?;

    Ok(Json(CampaignBody::render(&***db, campaign).await?))
}

#[delete("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn delete_campaign(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<HttpResponse, Error> {
    let campaign_id = params.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    manager::delete_campaign(&***db, campaign).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[post("/campaigns/{campaign_id}/advance-prize")]
#[tracing::instrument(skip(db))]
pub async fn advance_prize_in_campaign(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    let campaign = manager::advance_prize(&***db, campaign).await?;

    Ok(Json(CampaignBody::render(&***db, campaign).await?))
}

#[post("/campaigns/{campaign_id}/reset")]
#[tracing::instrument(skip(db))]
pub async fn reset_campaign(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    let campaign = manager::reset_campaign(&***db, campaign).await?;

    Ok(Json(CampaignBody::render(&***db, campaign).await?))
}
