//! Session types identifying the target shop and how to authenticate.

use crate::config::{ApiKey, ApiSecretKey, ApiVersion, ShopDomain};

/// How requests to the Admin API authenticate.
#[derive(Clone, Debug)]
pub enum Credentials {
    /// Public app: a per-shop OAuth access token sent via the
    /// `X-Shopify-Access-Token` header.
    AccessToken(String),
    /// Private app: API key and password sent via HTTP basic auth.
    Basic {
        /// The private app's API key.
        key: ApiKey,
        /// The private app's password.
        password: ApiSecretKey,
    },
}

/// API access mode, derived from the credential variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// Public app with an OAuth access token.
    Public,
    /// Private app with basic-auth credentials.
    Private,
}

/// An immutable session: the target shop plus its credentials.
///
/// A session identifies which store the client talks to and how it
/// authenticates. It lives as long as the client instance holding it.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync` and safe to share across tasks.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::{AccessMode, Session, ShopDomain};
///
/// let session = Session::public(
///     ShopDomain::new("my-store").unwrap(),
///     "shpat_access_token",
/// );
/// assert_eq!(session.mode(), AccessMode::Public);
/// ```
#[derive(Clone, Debug)]
pub struct Session {
    /// The shop this session targets.
    pub shop: ShopDomain,
    credentials: Credentials,
}

impl Session {
    /// Creates a public-mode session authenticated with an access token.
    #[must_use]
    pub fn public(shop: ShopDomain, access_token: impl Into<String>) -> Self {
        Self {
            shop,
            credentials: Credentials::AccessToken(access_token.into()),
        }
    }

    /// Creates a private-mode session authenticated with basic auth.
    #[must_use]
    pub const fn private(shop: ShopDomain, key: ApiKey, password: ApiSecretKey) -> Self {
        Self {
            shop,
            credentials: Credentials::Basic { key, password },
        }
    }

    /// Returns the credentials for this session.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the access mode implied by the credentials.
    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        match self.credentials {
            Credentials::AccessToken(_) => AccessMode::Public,
            Credentials::Basic { .. } => AccessMode::Private,
        }
    }

    /// Returns the GraphQL endpoint URL for this session at the given
    /// API version.
    #[must_use]
    pub fn graphql_endpoint(&self, version: &ApiVersion) -> String {
        format!(
            "https://{}/admin/api/{version}/graphql.json",
            self.shop.as_ref()
        )
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};
