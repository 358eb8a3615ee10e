use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub type Hash32 = [u8; 32];

/// Amounts are expressed in the chain's base unit.
pub type Amount = i64;

/// Session ids live in `[1, SESSION_ID_MAX]`; `0` never appears because an
/// inactive coordinator has no session at all.
pub type SessionId = i32;

macro_rules! define_hash_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub struct $name(Hash32);

        impl $name {
            pub const fn new(value: Hash32) -> Self {
                Self(value)
            }

            pub fn as_bytes(&self) -> &Hash32 {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in self.0 {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }

        impl fmt::LowerHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    f.write_str("0x")?;
                }
                for byte in self.0 {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Hash32> for $name {
            fn from(value: Hash32) -> Self {
                Self(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_string())
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
                    let hash: Hash32 =
                        bytes.as_slice().try_into().map_err(|_| serde::de::Error::custom("expected 32 bytes"))?;
                    Ok(Self(hash))
                } else {
                    Ok(Self(Hash32::deserialize(deserializer)?))
                }
            }
        }
    };
}

define_hash_type!(TxId);
define_hash_type!(CoordinatorId);

/// Tagged integer naming one entry of the fixed denomination catalogue.
/// Catalogue membership is decided by the injected [`PoolPolicy`], not here.
///
/// [`PoolPolicy`]: crate::infrastructure::validation::PoolPolicy
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denomination(pub i32);

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "denom-{}", self.0)
    }
}
