//! Marketplace price-update notifications.
//!
//! The marketplace signs each notification body with HMAC-SHA256 over the
//! raw bytes, delivered as `x-signature: sha256=<hex>`. Verification is
//! mandatory: with no secret configured the endpoint answers 503 so a
//! misconfigured deployment fails loudly instead of accepting spoofed
//! invalidations.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Json,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::api::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    resource: Option<String>,
}

#[derive(Debug, Serialize)]
struct WebhookAck {
    status: &'static str,
    entries_removed: usize,
}

/// `POST /webhooks/price-update`
pub(super) async fn price_update(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = &state.webhook_secret else {
        tracing::error!("webhook received but VETOR_WEBHOOK_SECRET is not configured");
        return ApiError::new(
            req_id.0,
            "service_unavailable",
            "webhook signing secret not configured",
        )
        .into_response();
    };

    let signature = headers
        .get("x-signature")
        .and_then(|value| value.to_str().ok());
    let verified =
        signature.is_some_and(|sig| verify_signature(secret.as_bytes(), &body, sig));
    if !verified {
        tracing::warn!("rejected webhook with missing or invalid signature");
        return ApiError::new(req_id.0, "unauthorized", "invalid webhook signature")
            .into_response();
    }

    let notification: Notification = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(error = %error, "webhook body is not valid JSON");
            return ApiError::new(req_id.0, "bad_request", "malformed notification payload")
                .into_response();
        }
    };

    let meta = ResponseMeta::new(req_id.0);
    match notification.topic.as_deref() {
        Some("items" | "items_prices") => {
            let removed = match item_id_from_resource(notification.resource.as_deref()) {
                Some(item_id) => {
                    let removed = state.cache.invalidate_item(item_id).await;
                    tracing::info!(item_id, removed, "invalidated cache entries for item");
                    removed
                }
                None => {
                    let removed = state.cache.clear().await;
                    tracing::info!(removed, "notification without item resource; cache cleared");
                    removed
                }
            };
            Json(ApiResponse {
                data: WebhookAck {
                    status: "invalidated",
                    entries_removed: removed,
                },
                meta,
            })
            .into_response()
        }
        topic => {
            tracing::debug!(topic = topic.unwrap_or("<none>"), "ignoring webhook topic");
            Json(ApiResponse {
                data: WebhookAck {
                    status: "ignored",
                    entries_removed: 0,
                },
                meta,
            })
            .into_response()
        }
    }
}

/// Extracts the trailing item id from a resource path like `/items/MLB123`.
fn item_id_from_resource(resource: Option<&str>) -> Option<&str> {
    resource
        .and_then(|path| path.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
}

fn verify_signature(secret: &[u8], body: &[u8], header_value: &str) -> bool {
    let hex_digest = header_value
        .strip_prefix("sha256=")
        .unwrap_or(header_value);
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();
    computed.ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn signature_roundtrip_verifies() {
        let body = br#"{"topic":"items"}"#;
        let header = sign("s3cret", body);
        assert!(verify_signature(b"s3cret", body, &header));
        assert!(!verify_signature(b"other", body, &header));
    }

    #[test]
    fn signature_without_prefix_is_accepted() {
        let body = b"payload";
        let header = sign("k", body);
        let bare = header.strip_prefix("sha256=").expect("prefix");
        assert!(verify_signature(b"k", body, bare));
    }

    #[test]
    fn garbage_signature_is_rejected_without_panicking() {
        assert!(!verify_signature(b"k", b"payload", "sha256=zz-not-hex"));
        assert!(!verify_signature(b"k", b"payload", ""));
    }

    #[test]
    fn resource_id_extraction() {
        assert_eq!(item_id_from_resource(Some("/items/MLB123")), Some("MLB123"));
        assert_eq!(item_id_from_resource(Some("items/MLB9")), Some("MLB9"));
        assert_eq!(item_id_from_resource(Some("/items/")), None);
        assert_eq!(item_id_from_resource(None), None);
    }
}
