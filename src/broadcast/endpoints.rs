use std::sync::Arc;

use actix_web::web::{Data, Payload};
use actix_web::{get, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use crate::campaign::CampaignId;

use super::{Broadcaster, Event, SessionId};

/// Control messages a viewer or admin screen may send over the socket.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    JoinCampaign {
        campaign_id: CampaignId,
    },
    // synchronizes the spin animation across screens; does not pick a winner
    TriggerSpin {
        campaign_id: CampaignId,
        duration: u64,
    },
}

#[get("/ws")]
pub async fn live_session(
    req: HttpRequest,
    stream: Payload,
    broadcaster: Data<Broadcaster>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    let session_id = SessionId::new();
    debug!("session {} connected", session_id);
    actix_web::rt::spawn(drive_session(
        session_id,
        session,
        msg_stream,
        broadcaster.into_inner(),
    ));

    Ok(response)
}

async fn drive_session(
    session_id: SessionId,
    mut session: Session,
    mut msg_stream: MessageStream,
    broadcaster: Arc<Broadcaster>,
) {
    let (sender, mut outbound) = mpsc::unbounded_channel::<String>();

    loop {
        tokio::select! {
            Some(payload) = outbound.recv() => {
                if session.text(payload).await.is_err() {
                    break;
                }
            }
            message = msg_stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(session_id, &sender, &broadcaster, &text);
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!("session {} protocol error: {}", session_id, err);
                        break;
                    }
                }
            }
        }
    }

    broadcaster.leave(session_id);
    debug!("session {} disconnected", session_id);
    let _ = session.close(None).await;
}

fn handle_client_message(
    session_id: SessionId,
    sender: &UnboundedSender<String>,
    broadcaster: &Broadcaster,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            debug!("session {} sent an unrecognized message: {}", session_id, err);
            return;
        }
    };

    match message {
        ClientMessage::JoinCampaign { campaign_id } => {
            debug!("session {} joined campaign {}", session_id, campaign_id);
            broadcaster.join(session_id, campaign_id, sender.clone());
        }
        ClientMessage::TriggerSpin {
            campaign_id,
            duration,
        } => {
            broadcaster.publish(campaign_id, &Event::StartSpin { duration });
        }
    }
}
