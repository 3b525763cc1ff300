//! Host response shape
//!
//! `Response` is what the chaincode returns to the ledger runtime for every
//! `init`/`invoke`. `PeerResponse` is what the runtime hands back when one
//! chaincode invokes another.

use serde::{Deserialize, Serialize};

/// Status code the runtime reports for a successful peer invocation.
pub const STATUS_OK: i32 = 200;

/// Status code the runtime reports for a failed peer invocation.
pub const STATUS_ERROR: i32 = 500;

/// Outcome of a chaincode entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

impl Status {
    /// Numeric code as seen by a calling chaincode.
    pub fn code(&self) -> i32 {
        match self {
            Status::Success => STATUS_OK,
            Status::Error => STATUS_ERROR,
        }
    }
}

/// Event attached to a transaction response.
///
/// The runtime keeps at most one event per transaction; `payload` is JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Response of a chaincode entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub payload: Vec<u8>,
    pub message: String,
    pub event: Option<EventRecord>,
}

impl Response {
    /// Successful response carrying `payload`.
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Status::Success,
            payload: payload.into(),
            message: String::new(),
            event: None,
        }
    }

    /// Error response carrying a diagnostic message and no payload.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: Vec::new(),
            message: message.into(),
            event: None,
        }
    }

    /// Attach the transaction event.
    pub fn with_event(mut self, event: EventRecord) -> Self {
        self.event = Some(event);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Payload as UTF-8 text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Reply received from a sibling chaincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerResponse {
    pub status: i32,
    pub payload: Vec<u8>,
    pub message: String,
}

impl PeerResponse {
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: STATUS_OK,
            payload: payload.into(),
            message: String::new(),
        }
    }

    pub fn failed(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            payload: Vec::new(),
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl From<Response> for PeerResponse {
    fn from(response: Response) -> Self {
        Self {
            status: response.status.code(),
            payload: response.payload,
            message: response.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let resp = Response::success("100");
        assert!(resp.is_success());
        assert_eq!(resp.payload_str(), Some("100"));
        assert!(resp.message.is_empty());
        assert!(resp.event.is_none());
    }

    #[test]
    fn test_error_response_has_no_payload() {
        let resp = Response::error("Asset not found: alice");
        assert!(!resp.is_success());
        assert!(resp.payload.is_empty());
        assert_eq!(resp.message, "Asset not found: alice");
    }

    #[test]
    fn test_with_event() {
        let resp = Response::success("7").with_event(EventRecord {
            name: "BalanceUpdated".to_string(),
            payload: b"{}".to_vec(),
        });
        assert_eq!(resp.event.unwrap().name, "BalanceUpdated");
    }

    #[test]
    fn test_peer_response_from_response() {
        let ok: PeerResponse = Response::success("42").into();
        assert!(ok.is_ok());
        assert_eq!(ok.payload, b"42".to_vec());

        let failed: PeerResponse = Response::error("boom").into();
        assert_eq!(failed.status, STATUS_ERROR);
        assert_eq!(failed.message, "boom");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&Status::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
