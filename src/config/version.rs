//! Shopify API version definitions.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Shopify API version used in the GraphQL endpoint path.
///
/// Shopify releases new API versions quarterly (January, April, July,
/// October). Known stable versions have dedicated variants; other versions
/// matching the `YYYY-MM` format parse as `Custom`, and `Unstable` selects
/// the development version.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ApiVersion;
///
/// let version: ApiVersion = "2025-10".parse().unwrap();
/// assert_eq!(version, ApiVersion::V2025_10);
/// assert_eq!(version.to_string(), "2025-10");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// API version 2025-01 (January 2025)
    V2025_01,
    /// API version 2025-04 (April 2025)
    V2025_04,
    /// API version 2025-07 (July 2025)
    V2025_07,
    /// API version 2025-10 (October 2025)
    V2025_10,
    /// Unstable API version for development and testing.
    Unstable,
    /// Custom `YYYY-MM` version string for future or unrecognized versions.
    Custom(String),
}

impl ApiVersion {
    /// Returns the latest stable API version.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V2025_10
    }

    /// Returns `true` if this is a known stable API version.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        !matches!(self, Self::Unstable | Self::Custom(_))
    }

    // Format: YYYY-MM where MM is a quarterly release month.
    fn is_valid_version_format(s: &str) -> bool {
        let Some((year, month)) = s.split_once('-') else {
            return false;
        };
        year.len() == 4
            && year.chars().all(|c| c.is_ascii_digit())
            && matches!(month, "01" | "04" | "07" | "10")
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version_str = match self {
            Self::V2025_01 => "2025-01",
            Self::V2025_04 => "2025-04",
            Self::V2025_07 => "2025-07",
            Self::V2025_10 => "2025-10",
            Self::Unstable => "unstable",
            Self::Custom(s) => s,
        };
        f.write_str(version_str)
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "2025-01" => Ok(Self::V2025_01),
            "2025-04" => Ok(Self::V2025_04),
            "2025-07" => Ok(Self::V2025_07),
            "2025-10" => Ok(Self::V2025_10),
            "unstable" => Ok(Self::Unstable),
            _ => {
                if Self::is_valid_version_format(&s) {
                    Ok(Self::Custom(s))
                } else {
                    Err(ConfigError::InvalidApiVersion { version: s })
                }
            }
        }
    }
}
