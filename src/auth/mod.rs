//! Admin authentication and the elevated service role.
//!
//! The PSK check implements constant-time comparison to mitigate timing attacks.
//! A request that passes it carries an [`AdminPrincipal`]; handlers turn that
//! into a [`ServiceRole`] for exactly one transition invocation.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::AppError;

/// Header name for the admin key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the boundary verified an admin credential for this request.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    label: String,
}

impl AdminPrincipal {
    fn verified() -> Self {
        Self {
            label: "psk-admin".to_string(),
        }
    }

    fn unauthenticated_dev() -> Self {
        Self {
            label: "dev-mode".to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Elevated capability that bypasses per-record authorization.
///
/// Every mutating store method takes `&ServiceRole`. A role is acquired once
/// per transition from an [`AdminPrincipal`] and dropped when it returns.
#[derive(Debug)]
pub struct ServiceRole {
    invocation_id: Uuid,
    granted_to: String,
}

impl ServiceRole {
    pub fn acquire(principal: &AdminPrincipal) -> Self {
        let role = Self {
            invocation_id: Uuid::new_v4(),
            granted_to: principal.label.clone(),
        };
        tracing::debug!(
            invocation_id = %role.invocation_id,
            granted_to = %role.granted_to,
            "service role acquired"
        );
        role
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn granted_to(&self) -> &str {
        &self.granted_to
    }
}

impl Drop for ServiceRole {
    fn drop(&mut self) {
        tracing::debug!(invocation_id = %self.invocation_id, "service role released");
    }
}

#[cfg(test)]
impl ServiceRole {
    pub fn for_tests() -> Self {
        Self::acquire(&AdminPrincipal::verified())
    }
}

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    mut request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        request
            .extensions_mut()
            .insert(AdminPrincipal::unauthenticated_dev());
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| {
            request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string())
        });

    match provided {
        Some(key) if constant_time_compare(&key, &expected) => {
            request.extensions_mut().insert(AdminPrincipal::verified());
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing or invalid API key"),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    tracing::warn!("Rejected admin request: {}", message);
    AppError::Unauthorized(message.to_string()).into_response()
}
