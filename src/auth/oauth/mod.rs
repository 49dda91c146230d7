//! OAuth helpers for the authorization-code flow.
//!
//! Two pieces: building the authorize-redirect URL a merchant is sent to, and
//! exchanging the returned code for a permanent access token via
//! `POST /admin/oauth/access_token`. Both sit outside the GraphQL request
//! pipeline - they use their own short-lived HTTP client.

use serde::Deserialize;
use thiserror::Error;

use crate::config::{ApiKey, ApiSecretKey, ShopDomain};

/// Errors returned by the OAuth helpers.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Network or connection error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Shopify rejected the token exchange.
    #[error("access token request failed with http {status}: {body}")]
    TokenRequestFailed {
        /// HTTP status of the failed exchange.
        status: u16,
        /// Raw response body for diagnostics.
        body: String,
    },
}

/// A permanent access token granted by Shopify.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenResponse {
    /// The permanent access token for the shop.
    pub access_token: String,
    /// Comma-separated scopes actually granted.
    pub scope: String,
}

/// Builds the URL to redirect a merchant to for app authorization.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::auth::oauth::authorize_url;
/// use shopify_graphql::{ApiKey, ShopDomain};
///
/// let url = authorize_url(
///     &ShopDomain::new("my-store").unwrap(),
///     &ApiKey::new("client-id").unwrap(),
///     &["read_products", "write_orders"],
///     "https://my-app.example.com/auth/callback",
///     "nonce-123",
/// );
/// assert!(url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize?"));
/// ```
#[must_use]
pub fn authorize_url(
    shop: &ShopDomain,
    api_key: &ApiKey,
    scopes: &[&str],
    redirect_uri: &str,
    state: &str,
) -> String {
    format!(
        "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
        shop.as_ref(),
        urlencoding::encode(api_key.as_ref()),
        urlencoding::encode(&scopes.join(",")),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state),
    )
}

/// Exchanges an authorization code for a permanent access token.
///
/// # Errors
///
/// Returns [`OAuthError::Network`] on connection failure and
/// [`OAuthError::TokenRequestFailed`] when Shopify answers with a non-2xx
/// status.
pub async fn exchange_access_token(
    shop: &ShopDomain,
    api_key: &ApiKey,
    api_secret: &ApiSecretKey,
    code: &str,
) -> Result<AccessTokenResponse, OAuthError> {
    let url = format!("https://{}/admin/oauth/access_token", shop.as_ref());

    let response = reqwest::Client::new()
        .post(&url)
        .form(&[
            ("client_id", api_key.as_ref()),
            ("client_secret", api_secret.as_ref()),
            ("code", code),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OAuthError::TokenRequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
