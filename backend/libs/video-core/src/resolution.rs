//! Playback resolutions and the request-side whitelist

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resolution tags a video can be encoded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "144p")]
    P144,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub const ALL: [Resolution; 6] = [
        Resolution::P144,
        Resolution::P240,
        Resolution::P360,
        Resolution::P480,
        Resolution::P720,
        Resolution::P1080,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P144 => "144p",
            Resolution::P240 => "240p",
            Resolution::P360 => "360p",
            Resolution::P480 => "480p",
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid resolution: {0}")]
pub struct InvalidResolution(pub String);

impl FromStr for Resolution {
    type Err = InvalidResolution;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| InvalidResolution(s.to_string()))
    }
}

/// Set of resolutions a request may ask for.
///
/// Built once at startup and shared read-only with the request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionWhitelist {
    allowed: BTreeSet<Resolution>,
}

impl ResolutionWhitelist {
    pub fn new(allowed: impl IntoIterator<Item = Resolution>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Parse a comma separated list such as `"480p,720p"`.
    pub fn parse(raw: &str) -> Result<Self, InvalidResolution> {
        let allowed = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Resolution::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { allowed })
    }

    pub fn contains(&self, resolution: Resolution) -> bool {
        self.allowed.contains(&resolution)
    }

    /// Parse `tag` and accept it only if it is whitelisted.
    pub fn validate(&self, tag: &str) -> Result<Resolution, InvalidResolution> {
        let resolution = tag.parse::<Resolution>()?;
        if self.contains(resolution) {
            Ok(resolution)
        } else {
            Err(InvalidResolution(tag.to_string()))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Resolution> + '_ {
        self.allowed.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl Default for ResolutionWhitelist {
    fn default() -> Self {
        Self::new(Resolution::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!("144p".parse::<Resolution>().unwrap(), Resolution::P144);
        assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::P1080);
        assert!("999p".parse::<Resolution>().is_err());
        assert!("720P".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&Resolution::P720).unwrap();
        assert_eq!(json, "\"720p\"");
        let back: Resolution = serde_json::from_str("\"360p\"").unwrap();
        assert_eq!(back, Resolution::P360);
    }

    #[test]
    fn test_default_whitelist_has_all_six() {
        let whitelist = ResolutionWhitelist::default();
        assert_eq!(whitelist.iter().count(), 6);
        for tag in ["144p", "240p", "360p", "480p", "720p", "1080p"] {
            assert!(whitelist.validate(tag).is_ok(), "{tag} should be allowed");
        }
    }

    #[test]
    fn test_whitelist_rejects_unknown_and_excluded() {
        let whitelist = ResolutionWhitelist::parse("480p, 720p").unwrap();
        assert_eq!(whitelist.validate("720p").unwrap(), Resolution::P720);
        assert_eq!(
            whitelist.validate("1080p"),
            Err(InvalidResolution("1080p".to_string()))
        );
        assert!(whitelist.validate("999p").is_err());
    }

    #[test]
    fn test_whitelist_parse_rejects_bad_tag() {
        assert!(ResolutionWhitelist::parse("720p,4k").is_err());
    }
}
