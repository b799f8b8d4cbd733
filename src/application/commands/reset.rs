//! Reset command

use serde_json::json;

use crate::support::errors::DomainResult;

use super::OutboundCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    Hard,
    Soft,
}

impl ResetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hard => "Hard",
            Self::Soft => "Soft",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Hard" => Some(Self::Hard),
            "Soft" => Some(Self::Soft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reset {
    pub kind: ResetType,
}

impl Reset {
    pub const ACTION: &'static str = "Reset";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({ "type": self.kind.as_str() }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [ResetType::Hard, ResetType::Soft] {
            assert_eq!(ResetType::parse(kind.as_str()), Some(kind));
        }
        assert!(ResetType::parse("Medium").is_none());
    }
}
