use axum::http::HeaderMap;
use corbel_core::RequestMetadata;

/// Extracts the client address and user agent recorded in audit entries.
pub fn request_metadata(headers: &HeaderMap) -> RequestMetadata {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    RequestMetadata {
        ip_address,
        user_agent,
    }
}
