//! Distribution family classification.
//!
//! Maps a [`DistributionIdentity`] to one of four [`OsFamily`] values. The
//! primary `ID` is looked up first; only on a miss are the `ID_LIKE` entries
//! searched for family keywords. There is no fallback family.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::error::{ProvisionError, Result};
use crate::os_release::DistributionIdentity;

/// Coarse grouping of distributions sharing a package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Debian,
    Rhel,
    Arch,
    Suse,
}

/// Distribution ids recognised directly.
const KNOWN_DISTRIBUTIONS: &[(&str, OsFamily)] = &[
    ("debian", OsFamily::Debian),
    ("ubuntu", OsFamily::Debian),
    ("linuxmint", OsFamily::Debian),
    ("pop", OsFamily::Debian),
    ("elementary", OsFamily::Debian),
    ("zorin", OsFamily::Debian),
    ("kali", OsFamily::Debian),
    ("raspbian", OsFamily::Debian),
    ("neon", OsFamily::Debian),
    ("mx", OsFamily::Debian),
    ("devuan", OsFamily::Debian),
    ("parrot", OsFamily::Debian),
    ("fedora", OsFamily::Rhel),
    ("rhel", OsFamily::Rhel),
    ("centos", OsFamily::Rhel),
    ("rocky", OsFamily::Rhel),
    ("almalinux", OsFamily::Rhel),
    ("ol", OsFamily::Rhel),
    ("amzn", OsFamily::Rhel),
    ("nobara", OsFamily::Rhel),
    ("arch", OsFamily::Arch),
    ("manjaro", OsFamily::Arch),
    ("endeavouros", OsFamily::Arch),
    ("garuda", OsFamily::Arch),
    ("artix", OsFamily::Arch),
    ("cachyos", OsFamily::Arch),
    ("arcolinux", OsFamily::Arch),
    ("opensuse", OsFamily::Suse),
    ("opensuse-leap", OsFamily::Suse),
    ("opensuse-tumbleweed", OsFamily::Suse),
    ("opensuse-microos", OsFamily::Suse),
    ("sles", OsFamily::Suse),
    ("sled", OsFamily::Suse),
];

/// `ID_LIKE` keyword sets, checked in this order.
const FAMILY_KEYWORDS: &[(OsFamily, &[&str])] = &[
    (OsFamily::Debian, &["debian", "ubuntu"]),
    (OsFamily::Rhel, &["rhel", "fedora", "centos"]),
    (OsFamily::Arch, &["arch"]),
    (OsFamily::Suse, &["suse"]),
];

impl OsFamily {
    /// Family for an exactly-known distribution id.
    pub fn from_known_id(id: &str) -> Option<Self> {
        KNOWN_DISTRIBUTIONS
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, family)| *family)
    }

    /// First family whose keyword appears in any `ID_LIKE` entry.
    pub fn from_id_like(id_like: &[String]) -> Option<Self> {
        FAMILY_KEYWORDS.iter().find_map(|(family, keywords)| {
            id_like
                .iter()
                .any(|entry| keywords.iter().any(|kw| entry.contains(kw)))
                .then_some(*family)
        })
    }

    /// Every distribution id with a direct table entry for this family.
    pub fn known_ids(self) -> impl Iterator<Item = &'static str> {
        KNOWN_DISTRIBUTIONS
            .iter()
            .filter(move |(_, family)| *family == self)
            .map(|(id, _)| *id)
    }

    /// Keywords searched for in `ID_LIKE`.
    pub fn keywords(self) -> &'static [&'static str] {
        FAMILY_KEYWORDS
            .iter()
            .find(|(family, _)| *family == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}

/// Classify a distribution identity.
///
/// The primary id always wins over `ID_LIKE` inference.
pub fn classify(identity: &DistributionIdentity) -> Result<OsFamily> {
    let family = OsFamily::from_known_id(&identity.id)
        .or_else(|| OsFamily::from_id_like(&identity.id_like))
        .ok_or_else(|| ProvisionError::UnsupportedOs {
            id: identity.id.clone(),
            id_like: identity.id_like_joined(),
        })?;

    tracing::debug!(id = %identity.id, %family, "classified distribution");
    Ok(family)
}
