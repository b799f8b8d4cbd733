//! SendLocalList command

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    Differential,
    Full,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Differential => "Differential",
            Self::Full => "Full",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Differential" => Some(Self::Differential),
            "Full" => Some(Self::Full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalListEntry {
    pub id_tag: String,
    pub id_tag_info: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct SendLocalList {
    pub list_version: i32,
    pub update_type: UpdateType,
    pub entries: Vec<LocalListEntry>,
}

impl SendLocalList {
    pub const ACTION: &'static str = "SendLocalList";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.list_version < 1 {
            return Err(DomainError::Validation("listVersion must be >= 1".into()));
        }

        let authorization_list: Vec<serde_json::Value> = self
            .entries
            .iter()
            .map(|entry| {
                let mut item = json!({ "idTag": entry.id_tag });
                if let Some(info) = &entry.id_tag_info {
                    item["idTagInfo"] = info.clone();
                }
                item
            })
            .collect();

        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({
                "listVersion": self.list_version,
                "updateType": self.update_type.as_str(),
                "localAuthorizationList": authorization_list,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_entries() {
        let call = SendLocalList {
            list_version: 2,
            update_type: UpdateType::Full,
            entries: vec![LocalListEntry {
                id_tag: "TAG-1".into(),
                id_tag_info: Some(json!({"status": "Accepted"})),
            }],
        }
        .build()
        .unwrap();
        assert_eq!(call.payload["listVersion"], 2);
        assert_eq!(call.payload["updateType"], "Full");
        assert_eq!(call.payload["localAuthorizationList"][0]["idTag"], "TAG-1");
    }

    #[test]
    fn rejects_version_below_one() {
        assert!(SendLocalList {
            list_version: 0,
            update_type: UpdateType::Differential,
            entries: vec![],
        }
        .build()
        .is_err());
    }
}
