//! Regional internet registry identifiers and data sources.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five regional internet registries that publish delegation data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    Arin,
    RipeNcc,
    Apnic,
    Lacnic,
    Afrinic,
}

impl Registry {
    /// All registries, in the order a full build pass visits them.
    pub const ALL: [Registry; 5] = [
        Registry::Arin,
        Registry::RipeNcc,
        Registry::Apnic,
        Registry::Lacnic,
        Registry::Afrinic,
    ];

    /// The registry name as it appears in delegation files and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Arin => "arin",
            Registry::RipeNcc => "ripencc",
            Registry::Apnic => "apnic",
            Registry::Lacnic => "lacnic",
            Registry::Afrinic => "afrinic",
        }
    }

    /// The published `delegated-<rir>-extended-latest` URL for this registry.
    pub fn default_url(&self) -> String {
        let host = match self {
            Registry::Arin => "ftp.arin.net",
            Registry::RipeNcc => "ftp.ripe.net",
            Registry::Apnic => "ftp.apnic.net",
            Registry::Lacnic => "ftp.lacnic.net",
            Registry::Afrinic => "ftp.afrinic.net",
        };
        format!(
            "https://{}/pub/stats/{}/delegated-{}-extended-latest",
            host,
            self.as_str(),
            self.as_str()
        )
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Registry {
    type Err = UnknownRegistry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arin" => Ok(Registry::Arin),
            "ripencc" => Ok(Registry::RipeNcc),
            "apnic" => Ok(Registry::Apnic),
            "lacnic" => Ok(Registry::Lacnic),
            "afrinic" => Ok(Registry::Afrinic),
            other => Err(UnknownRegistry(other.to_string())),
        }
    }
}

/// Error returned when a registry name is not one of the five RIRs.
#[derive(Debug, thiserror::Error)]
#[error("unknown registry: {0}")]
pub struct UnknownRegistry(pub String);

/// Where to obtain raw delegation data for one registry.
///
/// Passed explicitly to the build pass; there is no process-global catalog.
#[derive(Clone, Debug)]
pub struct RegistrySource {
    pub registry: Registry,
    pub location: SourceLocation,
}

/// A registry data location: an HTTP endpoint or a local file.
#[derive(Clone, Debug)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

impl RegistrySource {
    /// The default HTTP sources for all five registries.
    pub fn defaults() -> Vec<RegistrySource> {
        Registry::ALL
            .iter()
            .map(|&registry| RegistrySource {
                registry,
                location: SourceLocation::Url(registry.default_url()),
            })
            .collect()
    }

    /// Sources reading `delegated-<rir>-extended-latest` files under `dir`.
    pub fn from_dir(dir: &std::path::Path) -> Vec<RegistrySource> {
        Registry::ALL
            .iter()
            .map(|&registry| RegistrySource {
                registry,
                location: SourceLocation::File(
                    dir.join(format!("delegated-{}-extended-latest", registry)),
                ),
            })
            .collect()
    }
}
