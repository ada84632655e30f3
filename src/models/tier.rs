use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{BUSINESS_QUOTA, PREMIUM_QUOTA, STANDARD_QUOTA};

/// Storage service level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Business,
    Premium,
    Custom,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Standard, Tier::Business, Tier::Premium, Tier::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Business => "business",
            Tier::Premium => "premium",
            Tier::Custom => "custom",
        }
    }

    /// Quota that comes with the tier; custom tiers are negotiated per customer
    pub fn default_quota(&self) -> Option<&'static str> {
        match self {
            Tier::Standard => Some(STANDARD_QUOTA),
            Tier::Business => Some(BUSINESS_QUOTA),
            Tier::Premium => Some(PREMIUM_QUOTA),
            Tier::Custom => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTier(pub String);

impl fmt::Display for UnknownTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tier '{}'", self.0)
    }
}

impl std::error::Error for UnknownTier {}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Tier::Standard),
            "business" => Ok(Tier::Business),
            "premium" => Ok(Tier::Premium),
            "custom" => Ok(Tier::Custom),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

/// Check a human-readable capacity string such as `200GB`, `2 TB` or `1.5TB`
pub fn is_valid_quota(quota: &str) -> bool {
    let quota = quota.trim();
    let upper = quota.to_ascii_uppercase();
    let number = ["MB", "GB", "TB"]
        .iter()
        .find_map(|unit| upper.strip_suffix(unit))
        // One optional space before the unit
        .map(|n| n.strip_suffix(' ').unwrap_or(n));

    let Some(number) = number else {
        return false;
    };

    if number.is_empty() || number.starts_with('.') || number.ends_with('.') {
        return false;
    }

    let mut dots = 0;
    for c in number.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }

    dots <= 1 && number.parse::<f64>().map(|n| n > 0.0).unwrap_or(false)
}

/// Canonical spelling of a quota: trimmed, no inner space, upper-case unit
pub fn normalize_quota(quota: &str) -> String {
    quota
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tier_case_insensitive() {
        assert_eq!("Premium".parse::<Tier>(), Ok(Tier::Premium));
        assert_eq!(" business ".parse::<Tier>(), Ok(Tier::Business));
        assert!("readonly".parse::<Tier>().is_err());
        assert!("".parse::<Tier>().is_err());
    }

    #[test]
    fn test_default_quotas() {
        assert_eq!(Tier::Standard.default_quota(), Some("200GB"));
        assert_eq!(Tier::Business.default_quota(), Some("400GB"));
        assert_eq!(Tier::Premium.default_quota(), Some("2TB"));
        assert_eq!(Tier::Custom.default_quota(), None);
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        let json = serde_json::to_string(&Tier::Business).unwrap();
        assert_eq!(json, "\"business\"");
    }

    #[test]
    fn test_valid_quotas() {
        assert!(is_valid_quota("200GB"));
        assert!(is_valid_quota("2TB"));
        assert!(is_valid_quota("2 tb"));
        assert!(is_valid_quota("1.5TB"));
        assert!(is_valid_quota("512MB"));
    }

    #[test]
    fn test_invalid_quotas() {
        assert!(!is_valid_quota(""));
        assert!(!is_valid_quota("GB"));
        assert!(!is_valid_quota("200"));
        assert!(!is_valid_quota("0GB"));
        assert!(!is_valid_quota("1..5TB"));
        assert!(!is_valid_quota("lots of GB"));
        assert!(!is_valid_quota("200PB"));
        assert!(!is_valid_quota("2  TB"));
        assert!(!is_valid_quota("2    TB"));
        assert!(!is_valid_quota("2\tTB"));
    }

    #[test]
    fn test_normalize_quota() {
        assert_eq!(normalize_quota(" 2 tb "), "2TB");
        assert_eq!(normalize_quota("200GB"), "200GB");
    }
}
