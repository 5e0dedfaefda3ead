use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Builder;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// UUIDv4-shaped id drawn from the caller's RNG, so seeded runs replay.
            pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
                let bytes: [u8; 16] = rng.gen();
                Self(Builder::from_random_bytes(bytes).into_uuid().to_string())
            }
            pub fn from_str(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(JobId);
id_newtype!(ClientId);
id_newtype!(ArcId);
id_newtype!(NetworkId);
id_newtype!(FileSystemId);
id_newtype!(ObjectiveId);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    #[test]
    fn generated_ids_replay_with_the_same_seed() {
        let mut a = seeded_rng(7);
        let mut b = seeded_rng(7);
        assert_eq!(JobId::generate(&mut a), JobId::generate(&mut b));
    }

    #[test]
    fn generated_ids_are_uuid_shaped_and_distinct() {
        let mut rng = seeded_rng(1);
        let first = JobId::generate(&mut rng);
        let second = JobId::generate(&mut rng);
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
        assert!(uuid::Uuid::parse_str(first.as_str()).is_ok());
    }
}
