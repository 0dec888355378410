use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use crate::campaign::CampaignId;
use crate::participant::{ParticipantBody, ParticipantId};
use crate::typedid::{TypedId, TypedIdMarker};

pub mod endpoints;
pub use endpoints::*;

pub type SessionId = TypedId<LiveSession>;

/// Marker for a connected big-screen/viewer WebSocket session.
pub struct LiveSession;

impl TypedIdMarker for LiveSession {
    fn tag() -> &'static str {
        "SES"
    }
}

/// Campaign-scoped events fanned out to every viewer in the room. Late
/// joiners do not receive past events; clients refetch state over REST after
/// connecting.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    ParticipantJoined(ParticipantBody),
    ParticipantDeleted { id: ParticipantId },
    WinnerSelected(ParticipantBody),
    StartSpin { duration: u64 },
}

/// Maps each campaign to the set of currently connected sessions and
/// delivers events to every member of the room.
pub struct Broadcaster {
    rooms: Mutex<HashMap<CampaignId, HashMap<SessionId, UnboundedSender<String>>>>,
}

impl Broadcaster {
    pub fn new() -> Broadcaster {
        Broadcaster {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Adds the session to the campaign's room. A session follows one
    /// campaign at a time; joining again moves it.
    pub fn join(&self, session_id: SessionId, campaign_id: CampaignId, sender: UnboundedSender<String>) {
        let mut rooms = self.rooms.lock().unwrap();
        for members in rooms.values_mut() {
            members.remove(&session_id);
        }
        rooms.entry(campaign_id).or_default().insert(session_id, sender);
    }

    /// Removes the session from whatever room it belonged to.
    pub fn leave(&self, session_id: SessionId) {
        let mut rooms = self.rooms.lock().unwrap();
        rooms.retain(|_, members| {
            members.remove(&session_id);
            !members.is_empty()
        });
    }

    /// Serializes the event once and delivers it to every session currently
    /// in the campaign's room. Sessions whose channel has closed are pruned.
    pub fn publish(&self, campaign_id: CampaignId, event: &Event) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                error!("failed to serialize event for campaign {}: {}", campaign_id, err);
                return;
            }
        };

        let mut rooms = self.rooms.lock().unwrap();
        if let Some(members) = rooms.get_mut(&campaign_id) {
            members.retain(|session_id, sender| {
                let delivered = sender.send(payload.clone()).is_ok();
                if !delivered {
                    debug!("session {} is gone, dropping from room", session_id);
                }
                delivered
            });
        }
    }
}
