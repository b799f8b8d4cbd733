//! RFID card domain entity and authorization rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OCPP 1.6 idTagInfo authorization status subset this system emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Accepted,
    Blocked,
    Expired,
    Invalid,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Blocked => "Blocked",
            Self::Expired => "Expired",
            Self::Invalid => "Invalid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfidCard {
    pub id: i32,
    pub id_tag: String,
    pub user_id: Option<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RfidCard {
    pub fn new(id_tag: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            id_tag: id_tag.into(),
            user_id: None,
            is_active: true,
            is_blocked: false,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Authorization decision for an id tag lookup. Unknown card -> Invalid;
/// blocked wins over inactive; expiry checked last.
pub fn authorization_status(card: Option<&RfidCard>, now: DateTime<Utc>) -> AuthorizationStatus {
    let Some(card) = card else {
        return AuthorizationStatus::Invalid;
    };
    if card.is_blocked {
        return AuthorizationStatus::Blocked;
    }
    if !card.is_active {
        return AuthorizationStatus::Invalid;
    }
    if let Some(expiry) = card.expiry_date {
        if expiry < now {
            return AuthorizationStatus::Expired;
        }
    }
    AuthorizationStatus::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn unknown_card_is_invalid() {
        assert_eq!(
            authorization_status(None, Utc::now()),
            AuthorizationStatus::Invalid
        );
    }

    #[test]
    fn blocked_beats_inactive() {
        let mut card = RfidCard::new("TAG-1");
        card.is_blocked = true;
        card.is_active = false;
        assert_eq!(
            authorization_status(Some(&card), Utc::now()),
            AuthorizationStatus::Blocked
        );
    }

    #[test]
    fn inactive_card_is_invalid() {
        let mut card = RfidCard::new("TAG-1");
        card.is_active = false;
        assert_eq!(
            authorization_status(Some(&card), Utc::now()),
            AuthorizationStatus::Invalid
        );
    }

    #[test]
    fn expired_card() {
        let mut card = RfidCard::new("TAG-1");
        card.expiry_date = Some(Utc::now() - Duration::days(1));
        assert_eq!(
            authorization_status(Some(&card), Utc::now()),
            AuthorizationStatus::Expired
        );
    }

    #[test]
    fn valid_card_accepted() {
        let mut card = RfidCard::new("TAG-1");
        card.expiry_date = Some(Utc::now() + Duration::days(30));
        assert_eq!(
            authorization_status(Some(&card), Utc::now()),
            AuthorizationStatus::Accepted
        );
    }
}
