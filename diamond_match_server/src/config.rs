use std::env;

use dmg_common::{parse_boolean_flag, Secret};
use inventory_tools::BackendConfig;
use log::*;

use crate::helpers::IpRange;

const DEFAULT_DMG_HOST: &str = "127.0.0.1";
const DEFAULT_DMG_PORT: u16 = 8370;

/// The User-Agent fragment Telegram's webhook delivery presents. Overridable because the platform
/// has changed it before and will again.
const DEFAULT_REQUIRED_USER_AGENT: &str = "TelegramBot";

/// Telegram's published webhook source ranges. Used for the advisory source check only.
const TELEGRAM_SOURCE_RANGES: [&str; 2] = ["149.154.160.0/20", "91.108.4.0/22"];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub webhook: WebhookConfig,
    /// Connection details for the external inventory backend.
    pub backend: BackendConfig,
    /// When set, only messages from this chat id are processed; everything else is a silent no-op.
    /// This is how the gateway stays scoped to the one designated B2B group.
    pub target_group_id: Option<i64>,
    /// When true, dispatched notifications carry an idempotency key and platform redeliveries stop
    /// producing duplicate rows. Off by default to preserve the historical behaviour.
    pub idempotent_notifications: bool,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    /// Shared secret echoed back by Telegram in the secret-token header. When absent, calls are
    /// accepted without a token check; this is a deliberate backward-compatibility allowance and
    /// gets a loud warning at startup and on every call.
    pub secret: Option<Secret<String>>,
    /// Substring the caller's User-Agent must contain.
    pub required_user_agent: String,
    /// CIDR ranges the call should originate from. Advisory: a miss is logged, never rejected.
    /// Empty disables the check.
    pub allowed_source_ranges: Vec<IpRange>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address,
    /// rather than the connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather
    /// than the connection's remote address.
    pub use_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DMG_HOST.to_string(),
            port: DEFAULT_DMG_PORT,
            database_url: String::default(),
            webhook: WebhookConfig::default_ranges(),
            backend: BackendConfig::default(),
            target_group_id: None,
            idempotent_notifications: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DMG_HOST").ok().unwrap_or_else(|| DEFAULT_DMG_HOST.into());
        let port = env::var("DMG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for DMG_PORT. {e} Using the default, {DEFAULT_DMG_PORT}, instead.");
                    DEFAULT_DMG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DMG_PORT);
        let database_url = env::var("DMG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ DMG_DATABASE_URL is not set. Please set it to the URL for the gateway store.");
            String::default()
        });
        let webhook = WebhookConfig::from_env_or_default();
        let backend = BackendConfig::from_env_or_default();
        let target_group_id = env::var("DMG_TARGET_GROUP_ID").ok().and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| error!("🪛️ DMG_TARGET_GROUP_ID ({s}) is not a valid chat id. {e} Ignoring it."))
                .ok()
        });
        if target_group_id.is_none() {
            warn!("🪛️ DMG_TARGET_GROUP_ID is not set. Messages from EVERY group the bot is in will be processed.");
        }
        let idempotent_notifications = parse_boolean_flag(env::var("DMG_IDEMPOTENT_NOTIFICATIONS").ok(), false);
        Self { host, port, database_url, webhook, backend, target_group_id, idempotent_notifications }
    }
}

impl WebhookConfig {
    /// The default configuration with Telegram's published source ranges filled in.
    pub fn default_ranges() -> Self {
        Self {
            required_user_agent: DEFAULT_REQUIRED_USER_AGENT.to_string(),
            allowed_source_ranges: parse_source_ranges(&TELEGRAM_SOURCE_RANGES.join(",")),
            ..Default::default()
        }
    }

    pub fn from_env_or_default() -> Self {
        let secret = match env::var("DMG_WEBHOOK_SECRET") {
            Ok(s) if !s.trim().is_empty() => Some(Secret::new(s)),
            _ => {
                warn!(
                    "🚨️ DMG_WEBHOOK_SECRET is not set. Webhook calls will be accepted WITHOUT a secret-token check. \
                     Set it (and pass the same value to Telegram's setWebhook) before going to production."
                );
                None
            },
        };
        let required_user_agent =
            env::var("DMG_TELEGRAM_USER_AGENT").ok().unwrap_or_else(|| DEFAULT_REQUIRED_USER_AGENT.to_string());
        let allowed_source_ranges = match env::var("DMG_TELEGRAM_IP_WHITELIST") {
            Ok(s) if ["none", "false", "0"].contains(&s.to_lowercase().as_str()) => {
                info!("🪛️ The webhook source-range check is disabled.");
                Vec::new()
            },
            Ok(s) => parse_source_ranges(&s),
            Err(_) => {
                info!("🪛️ DMG_TELEGRAM_IP_WHITELIST is not set. Using Telegram's published ranges.");
                parse_source_ranges(&TELEGRAM_SOURCE_RANGES.join(","))
            },
        };
        let use_x_forwarded_for = parse_boolean_flag(env::var("DMG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("DMG_USE_FORWARDED").ok(), false);
        Self { secret, required_user_agent, allowed_source_ranges, use_x_forwarded_for, use_forwarded }
    }
}

fn parse_source_ranges(s: &str) -> Vec<IpRange> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| {
            part.trim()
                .parse::<IpRange>()
                .map_err(|e| warn!("🪛️ Ignoring invalid range ({part}) in DMG_TELEGRAM_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect()
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the configuration that request handlers need. Kept small, and kept free of the
/// store/backend credentials, so it can be cheaply cloned into every worker.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub webhook: WebhookConfig,
    pub target_group_id: Option<i64>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { webhook: config.webhook.clone(), target_group_id: config.target_group_id }
    }
}
