use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::broadcast::Broadcaster;
use crate::campaign::CampaignId;
use crate::database::Database;
use crate::error::Error;

use super::{manager, Participant, ParticipantId, ParticipantStatus};

#[derive(Clone, Debug, Deserialize)]
pub struct CreateParticipantBody {
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListParticipantsQuery {
    #[serde(default)]
    pub eligible: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ParticipantBody {
    pub id: ParticipantId,
    pub campaign_id: CampaignId,
    pub name: String,
    pub contact: Option<String>,
    pub status: ParticipantStatus,
    pub won_prize: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ParticipantBody {
    pub fn render(participant: Participant) -> ParticipantBody {
        ParticipantBody {
            id: participant.id,
            campaign_id: participant.campaign_id,
            name: participant.name,
            contact: participant.contact,
            status: participant.status,
            won_prize: participant.won_prize,
            created_at: participant.created_at,
            modified_at: participant.modified_at,
        }
    }
}

#[post("/campaigns/{campaign_id}/participants")]
#[tracing::instrument(skip(db, broadcaster))]
pub async fn register_participant_in_campaign(
    db: Data<Box<dyn Database>>,
    broadcaster: Data<Broadcaster>,
    params: Path<CampaignId>,
    body: Json<CreateParticipantBody>,
) -> Result<Json<ParticipantBody>, Error> {
    let campaign_id = params.into_inner();
    let body = body.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    let participant = manager::register_participant(
        &***db,
        &**broadcaster,
        &campaign,
        body.name,
        body.contact,
    )
    .await?;

    Ok(Json(ParticipantBody::render(participant)))
}

#[get("/campaigns/{campaign_id}/participants")]
#[tracing::instrument(skip(db))]
pub async fn get_participants_in_campaign(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
    query: Query<ListParticipantsQuery>,
) -> Result<Json<Vec<ParticipantBody>>, Error> {
    let campaign_id = params.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    let participants = if query.eligible {
        manager::get_eligible_participants(&***db, &campaign).await?
    } else {
        manager::get_participants(&***db, &campaign).await?
    };

    Ok(Json(
        participants.into_iter().map(ParticipantBody::render).collect(),
    ))
}

#[delete("/campaigns/{campaign_id}/participants/{participant_id}")]
#[tracing::instrument(skip(db, broadcaster))]
pub async fn remove_participant_in_campaign(
    db: Data<Box<dyn Database>>,
    broadcaster: Data<Broadcaster>,
    params: Path<(CampaignId, ParticipantId)>,
) -> Result<HttpResponse, Error> {
    let (campaign_id, participant_id) = params.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    manager::remove_participant(&***db, &**broadcaster, &campaign, participant_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
