use chrono::Utc;

use crate::campaign::{Campaign, CampaignKind, Prize};
use crate::database::Database;
use crate::error::Error;
use crate::participant::{Participant, ParticipantStatus};

pub async fn seed(db: &dyn Database) -> Result<(), Error> {
    db.drop().await?;

    let campaign_id = "CPN-3B5A0E0C-4C25-4AF7-9D6B-2C1F8B17D9A1".parse().unwrap();
    let participant1_id = "PCT-7D1E6F1B-54C7-4A0E-93A8-6E7C2B8F4D22".parse().unwrap();
    let participant2_id = "PCT-A4C2D9E8-1B36-4F5D-8A07-9C3E5D1B6F84".parse().unwrap();
    let participant3_id = "PCT-0F8B3C6D-92E1-4A7B-B5D4-3E6A1C9F7D05".parse().unwrap();

    let now = Utc::now();
    let campaign = Campaign {
        id: campaign_id,
        name: "Year End Party 2026".to_string(),
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
            Prize {
                name: "Voucher".to_string(),
                quantity: 5,
            },
        ],
        current_prize_index: 0,
        created_at: now,
        modified_at: now,
    };

    let participants = vec![
        Participant {
            id: participant1_id,
            campaign_id,
            name: "Linh Tran".to_string(),
            contact: Some("0901234567".to_string()),
            status: ParticipantStatus::CheckedIn,
            won_prize: None,
            created_at: now,
            modified_at: now,
        },
        Participant {
            id: participant2_id,
            campaign_id,
            name: "Minh Pham".to_string(),
            contact: Some("0907654321".to_string()),
            status: ParticipantStatus::CheckedIn,
            won_prize: None,
            created_at: now,
            modified_at: now,
        },
        Participant {
            id: participant3_id,
            campaign_id,
            name: "An Nguyen".to_string(),
            contact: None,
            status: ParticipantStatus::CheckedIn,
            won_prize: None,
            created_at: now,
            modified_at: now,
        },
    ];

    db.campaigns().insert_campaign(&campaign).await?;
    for participant in &participants {
        db.participants().insert_participant(participant).await?;
    }

    Ok(())
}
