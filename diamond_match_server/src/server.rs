use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use diamond_match_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    MatchFlowApi,
    SqliteDatabase,
};
use inventory_tools::InventoryApi;
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::backend::BackendCollaborators,
    routes::{health, webhook_preflight, TelegramWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api_client = InventoryApi::new(config.backend.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let collaborators = BackendCollaborators::new(api_client);
    // The delivery worker subscribes to dispatched notifications here. Until it lands, the
    // hand-off is logged so operators can see the pipeline working end to end.
    let mut hooks = EventHooks::default();
    hooks.on_dealer_notified(|event| {
        Box::pin(async move {
            info!(
                "📬️ Notification #{} ready for delivery to dealer {}",
                event.notification_id, event.dealer_match.dealer_telegram_id
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(16, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, collaborators, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    collaborators: BackendCollaborators,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let api = MatchFlowApi::new(db.clone(), collaborators.clone(), producers.clone())
            .with_idempotent_inserts(config.idempotent_notifications);
        let options = ServerOptions::from_config(&config);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dmg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(collaborators.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(webhook_preflight)
            .service(TelegramWebhookRoute::<SqliteDatabase, BackendCollaborators, BackendCollaborators>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
