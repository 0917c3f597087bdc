//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! The webhook route is the whole public surface of this gateway. Telegram disables (or endlessly
//! retries) webhooks that answer with unexpected status codes, so every internal outcome maps to
//! exactly one of three responses: 200 "OK", 401 "Unauthorized" or 500 "Error". "Nothing for us in
//! this update" is an OK, not an error.
use actix_web::{get, options, web, HttpRequest, HttpResponse, Responder};
use diamond_match_engine::{
    db_types::{NewCtaClick, RequestContext, RequesterInfo},
    helpers::extract_diamond_request,
    traits::{InventoryFetcher, MatchStorage, PostComposer},
    MatchFlowApi,
};
use log::*;

use crate::{config::ServerOptions, errors::ServerError, telegram_types::TelegramUpdate, verify::verify_request};

/// Messages containing this phrase (case-insensitive) are handled by the "generate diamond post"
/// collaborator and never reach the extractor.
pub const PAYMENT_CONFIRMATION_PHRASE: &str = "payment confirmed";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

//----------------------------------------------   Health  ----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Preflight  ---------------------------------------------------------
#[options("/webhook/telegram")]
pub async fn webhook_preflight() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type, X-Telegram-Bot-Api-Secret-Token"))
        .finish()
}

//----------------------------------------------   Webhook  ----------------------------------------------------------
route!(telegram_webhook => Post "/webhook/telegram" impl MatchStorage, InventoryFetcher, PostComposer);
/// The single entry point for platform updates.
///
/// Linear flow: verify → parse envelope → (`/start` click | wrong chat | payment confirmation |
/// extract → gate → match → dispatch). The body is taken as raw bytes rather than
/// `web::Json` so a malformed payload degrades to a logged no-op instead of an actix-generated
/// 400, which the platform would treat as a delivery failure.
pub async fn telegram_webhook<BStore, BInv, BPost>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<MatchFlowApi<BStore, BInv>>,
    composer: web::Data<BPost>,
    options: web::Data<ServerOptions>,
) -> HttpResponse
where
    BStore: MatchStorage,
    BInv: InventoryFetcher,
    BPost: PostComposer,
{
    trace!("💎️ Received webhook call: {}", req.uri());
    let verdict = verify_request(&req, &options.webhook);
    if !verdict.valid {
        warn!("💎️ Rejecting webhook call. {}", verdict.reason.as_deref().unwrap_or("no reason recorded"));
        return unauthorized_reply();
    }
    match handle_update(&body, api.get_ref(), composer.get_ref(), options.get_ref()).await {
        Ok(()) => ok_reply(),
        Err(e) => {
            error!("💎️ Unhandled error while processing update. {e}");
            error_reply()
        },
    }
}

async fn handle_update<BStore, BInv, BPost>(
    body: &[u8],
    api: &MatchFlowApi<BStore, BInv>,
    composer: &BPost,
    options: &ServerOptions,
) -> Result<(), ServerError>
where
    BStore: MatchStorage,
    BInv: InventoryFetcher,
    BPost: PostComposer,
{
    let update: TelegramUpdate = match serde_json::from_slice(body) {
        Ok(update) => update,
        Err(e) => {
            debug!("💎️ Ignoring payload that is not an update envelope. {e}");
            return Ok(());
        },
    };
    let Some(message) = update.message else {
        trace!("💎️ Update {} carries no message. Nothing to do.", update.update_id);
        return Ok(());
    };
    let Some(chat) = message.chat.clone() else {
        trace!("💎️ Update {} has no chat. Nothing to do.", update.update_id);
        return Ok(());
    };
    let Some(text) = message.text.clone().filter(|t| !t.trim().is_empty()) else {
        trace!("💎️ Update {} has no text. Nothing to do.", update.update_id);
        return Ok(());
    };

    // A private "/start <param>" is a campaign deep-link click, not a diamond request.
    if chat.is_private() {
        if let Some(parameter) = message.start_parameter() {
            let Some(user) = message.from.as_ref() else {
                debug!("💎️ /start click without a sender in update {}. Not recording it.", update.update_id);
                return Ok(());
            };
            let click = NewCtaClick {
                telegram_id: user.id,
                parameter: parameter.to_string(),
                first_name: user.first_name.clone(),
                username: user.username.clone(),
            };
            api.record_cta_click(click).await?;
            info!("💎️ CTA click on {parameter:?} recorded for user {}", user.id);
            return Ok(());
        }
    }

    if let Some(target) = options.target_group_id {
        if chat.id != target {
            trace!("💎️ Ignoring message in chat {}; this gateway is scoped to chat {target}.", chat.id);
            return Ok(());
        }
    }

    if text.to_lowercase().contains(PAYMENT_CONFIRMATION_PHRASE) {
        let Some(user) = message.from.as_ref() else {
            debug!("💎️ Payment confirmation without a sender in update {}. Ignoring it.", update.update_id);
            return Ok(());
        };
        info!("💎️ Payment confirmation from {}. Delegating diamond post generation.", user.id);
        if let Err(e) = composer.generate_diamond_post(user.id).await {
            error!("💎️ Diamond post generation failed for {}. {e}", user.id);
        }
        return Ok(());
    }

    let request = extract_diamond_request(&text);
    if !request.is_actionable() {
        debug!("💎️ Message in chat {} does not read like a diamond request (confidence {:.2}).", chat.id, request.confidence);
        return Ok(());
    }
    let requester = message.from.as_ref().map(RequesterInfo::from).unwrap_or_default();
    let ctx = RequestContext {
        update_id: update.update_id,
        requester,
        chat_id: chat.id,
        chat_title: chat.title.clone(),
        original_message: text,
        message_timestamp: message.timestamp(),
    };
    let matches = api.process_diamond_request(&request, &ctx).await?;
    info!("💎️ Update {}: notifications dispatched to {} dealers.", update.update_id, matches.len());
    Ok(())
}

// The platform only ever sees these three responses.
fn ok_reply() -> HttpResponse {
    HttpResponse::Ok().insert_header(("Access-Control-Allow-Origin", "*")).content_type("text/plain").body("OK")
}

fn unauthorized_reply() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .content_type("text/plain")
        .body("Unauthorized")
}

fn error_reply() -> HttpResponse {
    HttpResponse::InternalServerError()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .content_type("text/plain")
        .body("Error")
}
