mod errors;
mod match_flow_api;
pub mod matcher;

pub use errors::MatchFlowError;
pub use match_flow_api::MatchFlowApi;
