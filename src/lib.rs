use std::env;

use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig};
use actix_web::{App, HttpServer, ResponseError};
use mongodb::Client;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub mod broadcast;
pub mod campaign;
pub mod database;
pub mod draw;
pub mod error;
pub mod participant;
pub mod seed;
pub mod typedid;

pub use error::Error;

use crate::broadcast::Broadcaster;
use crate::database::{Database, MongoDatabase};
use crate::draw::DrawCoordinator;

pub async fn run(seed_demo_data: bool) -> Result<(), Error> {
    let uri =
        env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("LUCKYDRAW_DB").unwrap_or_else(|_| "luckydraw".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    info!("connecting to db: {}", uri);
    let db = Client::with_uri_str(&uri).await?.database(&db_name);
    let db = MongoDatabase::new(db);

    if seed_demo_data {
        seed::seed(&db).await?;
    }

    let db = Data::new(Box::new(db) as Box<dyn Database>);
    let broadcaster = Data::new(Broadcaster::new());
    let draws = Data::new(DrawCoordinator::new());

    HttpServer::new(move || {
        App::new()
            .app_data(JsonConfig::default().error_handler(|err, _req| {
                // format json errors with custom format
                Error::InvalidJson(err).into()
            }))
            .app_data(PathConfig::default().error_handler(|err, _req| {
                // format path errors with custom format
                Error::InvalidPath(err).into()
            }))
            .app_data(QueryConfig::default().error_handler(|err, _req| {
                // format query errors with custom format
                Error::InvalidQuery(err).into()
            }))
            .app_data(db.clone())
            .app_data(broadcaster.clone())
            .app_data(draws.clone())
            .wrap(TracingLogger::default())
            .service(campaign::endpoints::create_campaign)
            .service(campaign::endpoints::get_campaigns)
            .service(campaign::endpoints::get_campaign_by_id)
            .service(campaign::endpoints::update_campaign)
            .service(campaign::endpoints::delete_campaign)
            .service(campaign::endpoints::advance_prize_in_campaign)
            .service(campaign::endpoints::reset_campaign)
            .service(participant::endpoints::register_participant_in_campaign)
            .service(participant::endpoints::get_participants_in_campaign)
            .service(participant::endpoints::remove_participant_in_campaign)
            .service(draw::endpoints::draw_winner_in_campaign)
            .service(broadcast::endpoints::live_session)
            .default_service(web::to(|| async { Error::PathDoesNotExist.error_response() }))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
