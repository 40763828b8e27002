//! Animal categories that own a catalog tree.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Beef,
    Pork,
    Lamb,
    Goat,
}

impl Species {
    pub const ALL: [Self; 4] = [Self::Beef, Self::Pork, Self::Lamb, Self::Goat];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Beef => "beef",
            Self::Pork => "pork",
            Self::Lamb => "lamb",
            Self::Goat => "goat",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Beef => "Beef",
            Self::Pork => "Pork",
            Self::Lamb => "Lamb",
            Self::Goat => "Goat",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown species '{0}' (expected one of beef, pork, lamb, goat)")]
pub struct UnknownSpecies(pub String);

impl FromStr for Species {
    type Err = UnknownSpecies;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|species| species.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownSpecies(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_case_insensitively() {
        assert_eq!("Beef".parse::<Species>(), Ok(Species::Beef));
        assert_eq!(" pork ".parse::<Species>(), Ok(Species::Pork));
        assert_eq!(
            "bison".parse::<Species>(),
            Err(UnknownSpecies("bison".to_string()))
        );
    }

    #[test]
    fn serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&Species::Lamb).unwrap();
        assert_eq!(json, "\"lamb\"");
        let back: Species = serde_json::from_str("\"goat\"").unwrap();
        assert_eq!(back, Species::Goat);
    }
}
