//! Shared API contract.
//!
//! Route paths and response bodies live here so the server handlers, the
//! published OpenAPI document and [`crate::client::ApiClient`] all read
//! from one definition instead of each keeping its own copy.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const HEALTH_PATH: &str = "/health";
pub const OPENAPI_PATH: &str = "/openapi.json";
pub const DOCS_PATH: &str = "/docs";

pub const API_TITLE: &str = "Visual Code Notebook API";
pub const API_VERSION: &str = "1.0.0";

/// Value of `status` reported by a healthy service.
pub const STATUS_OK: &str = "ok";

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"ok"` while the service is able to answer.
    #[schema(example = "ok")]
    pub status: String,

    /// Time the response was built, ISO-8601 in UTC.
    #[schema(example = "2024-01-01T00:00:00.000Z")]
    pub timestamp: String,
}

impl HealthResponse {
    /// Healthy response stamped with the given instant.
    /// The format matches JavaScript's `toISOString` (millisecond precision, `Z` suffix).
    pub fn at(now: DateTime<Utc>) -> Self {
        HealthResponse {
            status: STATUS_OK.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Parses `timestamp` back into a UTC instant.
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.timestamp).map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_health_response_format() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap();
        let response = HealthResponse::at(instant);

        assert!(response.is_ok());
        assert_eq!(response.timestamp, "2024-03-05T12:30:45.000Z");
        assert_eq!(response.parsed_timestamp().unwrap(), instant);
    }

    #[test]
    fn test_health_response_serialization() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_string(&HealthResponse::at(instant)).expect("Failed to serialize");

        assert_eq!(json, r#"{"status":"ok","timestamp":"2024-01-01T00:00:00.000Z"}"#);
    }

    #[test]
    fn test_health_response_rejects_bad_timestamp() {
        let response = HealthResponse {
            status: "ok".to_string(),
            timestamp: "yesterday".to_string(),
        };

        assert!(response.parsed_timestamp().is_err());
    }
}
