//! Runner release versions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid version: {0}")]
pub struct VersionParseError(String);

/// A published runner release version. Ordering follows the numeric
/// triple; a plain release sorts after any pre-release with the same
/// numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunnerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Pre-release tag, e.g. `rc1` in `16.3.0-rc1`.
    pub suffix: Option<String>,
}

impl RunnerVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: None,
        }
    }
}

impl std::str::FromStr for RunnerVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (core, suffix) = match s.split_once('-') {
            Some((core, suffix)) => (core, Some(suffix.to_string())),
            None => (s, None),
        };

        let mut parts = core.split('.');
        let next_number = |part: Option<&str>| {
            part.and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| VersionParseError(s.to_string()))
        };

        let major = next_number(parts.next())?;
        let minor = next_number(parts.next())?;
        let patch = next_number(parts.next())?;
        if parts.next().is_some() {
            return Err(VersionParseError(s.to_string()));
        }

        Ok(Self {
            major,
            minor,
            patch,
            suffix,
        })
    }
}

impl Ord for RunnerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.suffix, &other.suffix) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for RunnerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RunnerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "-{}", suffix)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_version() {
        let version: RunnerVersion = "16.3.1".parse().unwrap();
        assert_eq!(version, RunnerVersion::new(16, 3, 1));
    }

    #[test]
    fn test_parse_pre_release() {
        let version: RunnerVersion = "16.3.0-rc1".parse().unwrap();
        assert_eq!(version.suffix.as_deref(), Some("rc1"));
        assert_eq!(version.to_string(), "16.3.0-rc1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<RunnerVersion>().is_err());
        assert!("16.3".parse::<RunnerVersion>().is_err());
        assert!("16.3.1.4".parse::<RunnerVersion>().is_err());
        assert!("sixteen.three.one".parse::<RunnerVersion>().is_err());
    }

    #[test]
    fn test_ordering_by_numeric_triple() {
        let mut versions: Vec<RunnerVersion> = ["16.10.0", "16.2.1", "15.11.9"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        versions.sort();

        let sorted: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        assert_eq!(sorted, vec!["15.11.9", "16.2.1", "16.10.0"]);
    }

    #[test]
    fn test_release_sorts_after_pre_release() {
        let rc: RunnerVersion = "16.3.0-rc1".parse().unwrap();
        let release: RunnerVersion = "16.3.0".parse().unwrap();
        assert!(rc < release);
    }
}
