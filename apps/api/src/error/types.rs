use serde::Serialize;
use ts_rs::TS;

/// API error payload.
///
/// `retryable` is set only for store outages; every other class is final.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    code: &'static str,
    message: String,
    retryable: bool,
}

impl ErrorResponse {
    pub(super) fn new(code: &'static str, message: String, retryable: bool) -> Self {
        Self {
            code,
            message,
            retryable,
        }
    }
}
