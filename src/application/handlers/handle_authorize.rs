//! Authorize handler

use serde_json::{json, Value};

use crate::support::errors::DomainResult;

use super::{field_str, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let id_tag = field_str(payload, "idTag").unwrap_or_default();
    let status = handler.service.authorize(&id_tag).await?;

    Ok(json!({ "idTagInfo": { "status": status.as_str() } }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use crate::domain::repositories::RepositoryProvider;
    use crate::domain::rfid_card::RfidCard;
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn unknown_tag_is_invalid() {
        let f = fixture("CP001");
        let response = call(&f.handler, "Authorize", json!({"idTag": "NOPE"})).await;
        assert_eq!(result_payload(&response)["idTagInfo"]["status"], "Invalid");
    }

    #[tokio::test]
    async fn card_states_map_to_statuses() {
        let f = fixture("CP001");

        f.repos
            .rfid_cards()
            .insert(RfidCard::new("OK"))
            .await
            .unwrap();

        let mut blocked = RfidCard::new("BLOCKED");
        blocked.is_blocked = true;
        f.repos.rfid_cards().insert(blocked).await.unwrap();

        let mut inactive = RfidCard::new("INACTIVE");
        inactive.is_active = false;
        f.repos.rfid_cards().insert(inactive).await.unwrap();

        let mut expired = RfidCard::new("EXPIRED");
        expired.expiry_date = Some(Utc::now() - Duration::days(1));
        f.repos.rfid_cards().insert(expired).await.unwrap();

        for (tag, expected) in [
            ("OK", "Accepted"),
            ("BLOCKED", "Blocked"),
            ("INACTIVE", "Invalid"),
            ("EXPIRED", "Expired"),
        ] {
            let response = call(&f.handler, "Authorize", json!({"idTag": tag})).await;
            assert_eq!(
                result_payload(&response)["idTagInfo"]["status"], expected,
                "tag {tag}"
            );
        }
    }
}
