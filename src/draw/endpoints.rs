use actix_web::post;
use actix_web::web::{Data, Json, Path};

use crate::broadcast::Broadcaster;
use crate::campaign::CampaignId;
use crate::database::Database;
use crate::error::Error;
use crate::participant::ParticipantBody;

use super::{manager, DrawCoordinator};

#[post("/campaigns/{campaign_id}/draw")]
#[tracing::instrument(skip(db, broadcaster, draws))]
pub async fn draw_winner_in_campaign(
    db: Data<Box<dyn Database>>,
    broadcaster: Data<Broadcaster>,
    draws: Data<DrawCoordinator>,
    params: Path<CampaignId>,
) -> Result<Json<ParticipantBody>, Error> {
    let campaign_id = params.into_inner();

    let campaign = db.campaigns().assert_campaign_exists(campaign_id).await?;
    let winner = manager::draw_winner(&***db, &**broadcaster, &**draws, &campaign).await?;

    Ok(Json(ParticipantBody::render(winner)))
}
