//! OCPP subprotocol negotiation
//!
//! During the WebSocket handshake the charge point advertises the OCPP
//! subprotocols it speaks via `Sec-WebSocket-Protocol`. The negotiator picks
//! the best mutually-supported one; no mutual subprotocol closes the
//! connection with 1002.

/// Supported wire subprotocols. Handler behavior is 1.6 regardless of the
/// negotiated version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcppVersion {
    V16,
    V201,
}

impl OcppVersion {
    pub fn subprotocol(&self) -> &'static str {
        match self {
            Self::V16 => "ocpp1.6",
            Self::V201 => "ocpp2.0.1",
        }
    }

    pub fn from_subprotocol(s: &str) -> Option<Self> {
        match s {
            "ocpp1.6" => Some(Self::V16),
            "ocpp2.0.1" => Some(Self::V201),
            _ => None,
        }
    }
}

/// Picks the highest mutually-supported subprotocol.
pub struct ProtocolNegotiator {
    /// Offered versions, preference order (highest first).
    supported: Vec<OcppVersion>,
}

impl ProtocolNegotiator {
    pub fn new(supported: Vec<OcppVersion>) -> Self {
        Self { supported }
    }

    /// Build from the configured subprotocol strings, ignoring unknown ones.
    pub fn from_subprotocols(subprotocols: &[String]) -> Self {
        let supported = subprotocols
            .iter()
            .filter_map(|s| OcppVersion::from_subprotocol(s))
            .collect();
        Self { supported }
    }

    /// Negotiate from the raw `Sec-WebSocket-Protocol` header value.
    pub fn negotiate(&self, requested_protocols: &str) -> Option<OcppVersion> {
        let requested: Vec<&str> = requested_protocols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        for version in &self.supported {
            if requested.iter().any(|p| *p == version.subprotocol()) {
                return Some(*version);
            }
        }
        None
    }

    pub fn supported_subprotocols(&self) -> Vec<&'static str> {
        self.supported.iter().map(|v| v.subprotocol()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negotiator() -> ProtocolNegotiator {
        ProtocolNegotiator::new(vec![OcppVersion::V16, OcppVersion::V201])
    }

    #[test]
    fn single_match() {
        assert_eq!(negotiator().negotiate("ocpp1.6"), Some(OcppVersion::V16));
    }

    #[test]
    fn preference_order_wins() {
        // CS preference order is first in the supported list.
        assert_eq!(
            negotiator().negotiate("ocpp2.0.1, ocpp1.6"),
            Some(OcppVersion::V16)
        );
        let v201_first = ProtocolNegotiator::new(vec![OcppVersion::V201, OcppVersion::V16]);
        assert_eq!(
            v201_first.negotiate("ocpp2.0.1, ocpp1.6"),
            Some(OcppVersion::V201)
        );
    }

    #[test]
    fn no_match_or_empty() {
        assert_eq!(negotiator().negotiate("ocpp1.5"), None);
        assert_eq!(negotiator().negotiate(""), None);
    }

    #[test]
    fn from_config_strings_ignores_unknown() {
        let negotiator = ProtocolNegotiator::from_subprotocols(&[
            "ocpp1.6".to_string(),
            "ocpp9.9".to_string(),
        ]);
        assert_eq!(negotiator.supported_subprotocols(), vec!["ocpp1.6"]);
    }
}
