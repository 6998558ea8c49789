//! Entity kinds exposed by the server.

use std::fmt;
use std::str::FromStr;

/// Top-level entity collections, addressed as `/{kind}/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Organizations,
    Hosts,
    Applications,
    Platforms,
    Distributions,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Organizations,
        Self::Hosts,
        Self::Applications,
        Self::Platforms,
        Self::Distributions,
    ];

    /// Collection name used in REST paths and folder layouts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organizations => "organizations",
            Self::Hosts => "hosts",
            Self::Applications => "applications",
            Self::Platforms => "platforms",
            Self::Distributions => "distributions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown entity kind: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("users".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityKind::Hosts.to_string(), "hosts");
    }
}
