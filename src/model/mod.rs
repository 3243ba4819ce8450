//! Payload types carried inside envelopes.
//!
//! Each discriminator domain is a closed sum type with one variant per kind:
//!
//! - [`Asset`] for entities, discriminated by [`AssetKind`]
//! - [`Relation`] for edges, discriminated by [`RelationKind`]
//! - [`Property`] for entity and edge tags, discriminated by [`PropertyKind`]
//!
//! Payloads report their own kind through [`Payload::kind`]. That value is the only source the
//! codec uses when it writes a `type` field, so a record can never carry a discriminator that
//! disagrees with its content.
//!
//! Every concrete payload struct rejects unknown fields. Optional fields default when absent and
//! are skipped on output, so an encoded payload decodes back to the same value.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug, Display, Formatter},
    hash::Hash,
    str::FromStr,
};

/// Declares a discriminator enum whose serde name, [`Display`] and [`FromStr`] forms are the
/// wire label.
macro_rules! discriminators {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::model::UnknownKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err($crate::model::UnknownKind(s.to_string())),
                }
            }
        }
    };
}

pub mod asset;
pub mod property;
pub mod relation;

pub use asset::{Asset, AssetKind};
pub use property::{Property, PropertyKind};
pub use relation::{Relation, RelationKind, RrHeader};

/// The three independent discriminator namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Asset,
    Relation,
    Property,
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Domain::Asset => write!(f, "asset"),
            Domain::Relation => write!(f, "relation"),
            Domain::Property => write!(f, "property"),
        }
    }
}

/// A discriminator string that names no kind in its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl Display for UnknownKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "unknown kind '{}'", self.0)
    }
}

/// Capability shared by the three payload sum types.
pub trait Payload: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static {
    type Kind: Copy
        + Debug
        + Display
        + Eq
        + Hash
        + Ord
        + FromStr<Err = UnknownKind>
        + Serialize
        + Send
        + Sync
        + 'static;

    const DOMAIN: Domain;

    fn kind(&self) -> Self::Kind;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_discriminator_labels_parse_back() {
        for kind in AssetKind::ALL {
            assert_eq!(kind.as_str().parse::<AssetKind>(), Ok(*kind));
        }
        for kind in RelationKind::ALL {
            assert_eq!(kind.to_string().parse::<RelationKind>(), Ok(*kind));
        }
        for kind in PropertyKind::ALL {
            assert_eq!(kind.to_string().parse::<PropertyKind>(), Ok(*kind));
        }
    }

    #[test]
    fn test_discriminator_labels_are_case_sensitive() {
        assert_eq!("FQDN".parse::<AssetKind>(), Ok(AssetKind::Fqdn));
        assert_eq!(
            "fqdn".parse::<AssetKind>(),
            Err(UnknownKind("fqdn".to_string()))
        );
    }

    #[test]
    fn test_kind_serializes_as_label() {
        let json = serde_json::to_string(&AssetKind::TlsCertificate).unwrap();
        assert_eq!(json, "\"TLSCertificate\"");
        let json = serde_json::to_string(&RelationKind::SrvDnsRelation).unwrap();
        assert_eq!(json, "\"SRVDNSRelation\"");
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::Asset.to_string(), "asset");
        assert_eq!(Domain::Relation.to_string(), "relation");
        assert_eq!(Domain::Property.to_string(), "property");
    }
}
