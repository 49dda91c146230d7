//! Validated newtype wrappers for configuration values.
//!
//! These wrappers validate their contents on construction so that invalid
//! credentials or domains are rejected before any request is made.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated Shopify API key (OAuth client id).
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key.
///
/// The `Debug` implementation masks the secret value, displaying
/// `ApiSecretKey(*****)` instead of the actual key, so secrets do not leak
/// into logs.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated Shopify shop domain, normalized to `shop.myshopify.com`.
///
/// # Accepted Formats
///
/// - `shop-name` - normalized to `shop-name.myshopify.com`
/// - `shop-name.myshopify.com` - used as-is
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ShopDomain;
///
/// let domain = ShopDomain::new("my-store").unwrap();
/// assert_eq!(domain.as_ref(), "my-store.myshopify.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Creates a new validated shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is empty,
    /// contains invalid characters, or has an unexpected suffix.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into();
        let name = domain
            .strip_suffix(".myshopify.com")
            .unwrap_or(domain.as_str());

        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !name.starts_with('-')
            && !name.ends_with('-');

        if !valid {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        Ok(Self(format!("{name}.myshopify.com")))
    }

    /// Returns the shop name without the `.myshopify.com` suffix.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.trim_end_matches(".myshopify.com")
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}
