use std::convert::TryFrom;

use chrono::Utc;

use crate::database::Database;
use crate::error::Error;

use super::{Campaign, CampaignId, CampaignKind, Prize};

fn validate_prizes(prizes: &[Prize]) -> Result<(), Error> {
    for prize in prizes {
        if prize.quantity < 0 {
            return Err(Error::NegativePrizeQuantity {
                prize_name: prize.name.clone(),
                quantity: prize.quantity,
            });
        }
    }

    Ok(())
}

#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: &dyn Database,
    name: String,
    kind: CampaignKind,
    prizes: Vec<Prize>,
) -> Result<Campaign, Error> {
    validate_prizes(&prizes)?;

    let now = Utc::now();
    let campaign = Campaign {
        id: CampaignId::new(),
        name,
        kind,
        prizes,
        current_prize_index: 0,
        created_at: now,
        modified_at: now,
    };

    db.campaigns().insert_campaign(&campaign).await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaigns(db: &dyn Database) -> Result<Vec<Campaign>, Error> {
    let campaigns = db.campaigns().fetch_campaigns().await?;

    Ok(campaigns)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: &dyn Database,
    campaign_id: CampaignId,
) -> Result<Campaign, Error> {
    let campaign = db
        .campaigns()
        .fetch_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignDoesNotExist { campaign_id })?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: &dyn Database,
    campaign: Campaign,
    name: Option<String>,
    prizes: Option<Vec<Prize>>,
) -> Result<Campaign, Error> {
    if let Some(prizes) = &prizes {
        validate_prizes(prizes)?;
    }

    let campaign = db.campaigns().update_campaign(campaign, name, prizes).await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn delete_campaign(db: &dyn Database, campaign: Campaign) -> Result<(), Error> {
    // participants are owned by the campaign and go with it
    db.participants()
        .delete_participants_by_campaign(campaign.id)
        .await?;
    db.campaigns().delete_campaign(campaign.id).await?;

    Ok(())
}

/// The prize at the campaign's cursor, or `None` once the cursor has walked
/// past the end of the sequence (or the prize list shrank underneath it).
pub fn current_prize(campaign: &Campaign) -> Option<&Prize> {
    usize::try_from(campaign.current_prize_index)
        .ok()
        .and_then(|index| campaign.prizes.get(index))
}

#[tracing::instrument(skip(db))]
pub async fn advance_prize(db: &dyn Database, campaign: Campaign) -> Result<Campaign, Error> {
    let next_index = campaign.current_prize_index + 1;
    if next_index as usize >= campaign.prizes.len() {
        return Err(Error::NoMorePrizes {
            campaign_id: campaign.id,
        });
    }

    let campaign = db
        .campaigns()
        .update_campaign_prize_cursor(campaign, next_index)
        .await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn reset_campaign(db: &dyn Database, campaign: Campaign) -> Result<Campaign, Error> {
    db.participants()
        .reset_participants_by_campaign(campaign.id)
        .await?;

    let campaign = db.campaigns().update_campaign_prize_cursor(campaign, 0).await?;

    Ok(campaign)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::database::test::MockDatabase;

    fn sample_campaign(current_prize_index: i32) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: CampaignId::new(),
            name: "Year End Party".to_string(),
            kind: CampaignKind::InPerson,
            prizes: vec![
                Prize {
                    name: "Bike".to_string(),
                    quantity: 1,
                },
                Prize {
                    name: "Phone".to_string(),
                    quantity: 2,
                },
            ],
            current_prize_index,
            created_at: now,
            modified_at: now,
        }
    }

    #[tokio::test]
    async fn can_create_campaign() {
        let mut db = MockDatabase::new();
        let called_insert = Arc::new(Mutex::new(false));
        let called_insert_clone = Arc::clone(&called_insert);
        db.campaigns.on_insert_campaign = Box::new(move |campaign| {
            *called_insert_clone.lock().unwrap() = true;
            assert_eq!(campaign.name, "Year End Party".to_string());
            assert_eq!(campaign.current_prize_index, 0);
            assert_eq!(campaign.created_at, campaign.modified_at);
            Ok(())
        });

        let campaign = create_campaign(
            &db,
            "Year End Party".into(),
            CampaignKind::InPerson,
            vec![Prize {
                name: "Bike".to_string(),
                quantity: 1,
            }],
        )
        .await
        .unwrap();

        assert_eq!(campaign.name, "Year End Party".to_string());
        assert_eq!(campaign.prizes.len(), 1);
        assert!(
            *called_insert.lock().unwrap(),
            "db.insert_campaign was not called"
        );
    }

    #[tokio::test]
    async fn create_campaign_rejects_negative_prize_quantity() {
        let db = MockDatabase::new();

        let result = create_campaign(
            &db,
            "Year End Party".into(),
            CampaignKind::InPerson,
            vec![Prize {
                name: "Bike".to_string(),
                quantity: -5,
            }],
        )
        .await;

        assert_eq!(
            result.unwrap_err(),
            Error::NegativePrizeQuantity {
                prize_name: "Bike".to_string(),
                quantity: -5,
            }
        );
    }

    #[tokio::test]
    async fn update_campaign_rejects_negative_prize_quantity() {
        let db = MockDatabase::new();

        let result = update_campaign(
            &db,
            sample_campaign(0),
            None,
            Some(vec![Prize {
                name: "Phone".to_string(),
                quantity: -1,
            }]),
        )
        .await;

        assert_eq!(
            result.unwrap_err(),
            Error::NegativePrizeQuantity {
                prize_name: "Phone".to_string(),
                quantity: -1,
            }
        );
    }

    #[tokio::test]
    async fn get_campaign_by_id_returns_error_if_doesnt_exist() {
        let mut db = MockDatabase::new();
        let test_campaign_id = CampaignId::new();
        db.campaigns.on_fetch_campaign_by_id = Box::new(|_| Ok(None));

        let campaign_result = get_campaign_by_id(&db, test_campaign_id).await;

        assert_eq!(
            campaign_result.unwrap_err(),
            Error::CampaignDoesNotExist {
                campaign_id: test_campaign_id
            }
        );
    }

    #[test]
    fn current_prize_follows_the_cursor() {
        let campaign = sample_campaign(1);

        assert_eq!(current_prize(&campaign).unwrap().name, "Phone");
    }

    #[test]
    fn current_prize_is_none_past_the_end() {
        let campaign = sample_campaign(2);

        assert!(current_prize(&campaign).is_none());
    }

    #[tokio::test]
    async fn advance_prize_moves_the_cursor() {
        let mut db = MockDatabase::new();
        db.campaigns.on_update_campaign_prize_cursor = Box::new(|mut campaign, index| {
            assert_eq!(index, 1);
            campaign.current_prize_index = index;
            Ok(campaign)
        });

        let campaign = advance_prize(&db, sample_campaign(0)).await.unwrap();

        assert_eq!(campaign.current_prize_index, 1);
    }

    #[tokio::test]
    async fn advance_prize_at_the_last_prize_reports_no_more_prizes() {
        let db = MockDatabase::new();
        let campaign = sample_campaign(1);
        let campaign_id = campaign.id;

        let result = advance_prize(&db, campaign).await;

        assert_eq!(result.unwrap_err(), Error::NoMorePrizes { campaign_id });
    }

    #[tokio::test]
    async fn reset_campaign_resets_participants_and_cursor() {
        let mut db = MockDatabase::new();
        let called_reset = Arc::new(Mutex::new(false));
        let called_reset_clone = Arc::clone(&called_reset);
        db.participants.on_reset_participants_by_campaign = Box::new(move |_| {
            *called_reset_clone.lock().unwrap() = true;
            Ok(3)
        });
        db.campaigns.on_update_campaign_prize_cursor = Box::new(|mut campaign, index| {
            assert_eq!(index, 0);
            campaign.current_prize_index = index;
            Ok(campaign)
        });

        let campaign = reset_campaign(&db, sample_campaign(1)).await.unwrap();

        assert_eq!(campaign.current_prize_index, 0);
        assert!(
            *called_reset.lock().unwrap(),
            "db.reset_participants_by_campaign was not called"
        );
    }

    #[tokio::test]
    async fn delete_campaign_cascades_to_participants() {
        let mut db = MockDatabase::new();
        let called_cascade = Arc::new(Mutex::new(false));
        let called_cascade_clone = Arc::clone(&called_cascade);
        db.participants.on_delete_participants_by_campaign = Box::new(move |_| {
            *called_cascade_clone.lock().unwrap() = true;
            Ok(2)
        });
        db.campaigns.on_delete_campaign = Box::new(|_| Ok(()));

        delete_campaign(&db, sample_campaign(0)).await.unwrap();

        assert!(
            *called_cascade.lock().unwrap(),
            "db.delete_participants_by_campaign was not called"
        );
    }
}
