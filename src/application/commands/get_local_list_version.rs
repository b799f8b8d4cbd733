//! GetLocalListVersion command

use serde_json::json;

use crate::support::errors::DomainResult;

use super::OutboundCall;

#[derive(Debug, Clone, Default)]
pub struct GetLocalListVersion;

impl GetLocalListVersion {
    pub const ACTION: &'static str = "GetLocalListVersion";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({}),
        })
    }
}
