use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;

/// POSTs `body` to the webhook route of an app assembled by `configure`, returning status and
/// body text. Headers are applied as given; tests that want to look like the platform add the
/// User-Agent (and secret token) themselves.
pub async fn post_webhook(
    body: String,
    headers: &[(&str, &str)],
    configure: fn(&mut ServiceConfig),
) -> anyhow::Result<(StatusCode, String)> {
    let mut req = TestRequest::post().uri("/webhook/telegram").set_payload(body);
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making webhook request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| anyhow::anyhow!("{e}"))?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Headers a genuine platform delivery carries (sans secret).
pub const PLATFORM_HEADERS: [(&str, &str); 1] = [("User-Agent", "TelegramBot (like TwitterBot)")];
