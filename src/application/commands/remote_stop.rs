//! RemoteStopTransaction command

use serde_json::json;

use crate::support::errors::DomainResult;

use super::OutboundCall;

/// Stop a running transaction remotely. The transaction id is resolved from
/// the charger's most recent Active session by the caller.
#[derive(Debug, Clone)]
pub struct RemoteStopTransaction {
    pub transaction_id: i32,
}

impl RemoteStopTransaction {
    pub const ACTION: &'static str = "RemoteStopTransaction";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({ "transactionId": self.transaction_id }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds() {
        let call = RemoteStopTransaction { transaction_id: 7 }.build().unwrap();
        assert_eq!(call.payload["transactionId"], 7);
    }
}
