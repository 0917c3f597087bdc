mod helpers;
pub mod op;
mod secret;
mod usd;

pub use helpers::parse_boolean_flag;
pub use secret::Secret;
pub use usd::{Usd, UsdConversionError, USD_CURRENCY_CODE};
