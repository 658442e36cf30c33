use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Failures the outbound client API can hit before a request ever
/// reaches the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no proxy is currently registered")]
    NoProxyRegistered,
    #[error("no active call with id '{0}'")]
    UnknownCall(String),
}

/// Wire error codes (spec.md §6.1). Not exhaustive — unrecognized
/// numeric codes round-trip through [`ErrorCode::Other`] rather than
/// being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NoError,
    ParameterError,
    UnknownLoop,
    ProcessingError,
    Timeout,
    InternalServer,
    Other(u16),
}

impl ErrorCode {
    pub const fn code(self) -> u16 {
        match self {
            ErrorCode::NoError => 0,
            ErrorCode::ParameterError => 1,
            ErrorCode::UnknownLoop => 2,
            ErrorCode::ProcessingError => 3,
            ErrorCode::Timeout => 4,
            ErrorCode::InternalServer => 5,
            ErrorCode::Other(n) => n,
        }
    }

    pub const fn from_code(code: u16) -> Self {
        match code {
            0 => ErrorCode::NoError,
            1 => ErrorCode::ParameterError,
            2 => ErrorCode::UnknownLoop,
            3 => ErrorCode::ProcessingError,
            4 => ErrorCode::Timeout,
            5 => ErrorCode::InternalServer,
            other => ErrorCode::Other(other),
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, ErrorCode::NoError)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u16::deserialize(deserializer)?;
        Ok(ErrorCode::from_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let value = serde_json::to_value(ErrorCode::UnknownLoop).unwrap();
        assert_eq!(value, serde_json::json!(2));
        let back: ErrorCode = serde_json::from_value(value).unwrap();
        assert_eq!(back, ErrorCode::UnknownLoop);
    }

    #[test]
    fn unrecognized_code_round_trips_as_other() {
        let back: ErrorCode = serde_json::from_value(serde_json::json!(99)).unwrap();
        assert_eq!(back, ErrorCode::Other(99));
        assert_eq!(back.code(), 99);
    }
}
