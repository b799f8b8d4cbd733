//! ClearCache command

use serde_json::json;

use crate::support::errors::DomainResult;

use super::OutboundCall;

#[derive(Debug, Clone, Default)]
pub struct ClearCache;

impl ClearCache {
    pub const ACTION: &'static str = "ClearCache";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({}),
        })
    }
}
