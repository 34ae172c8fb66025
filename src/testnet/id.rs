//! Kademlia keyspace position of a peer or a lookup target
use std::fmt::{self, Debug, Formatter};

use sha1_smol::Sha1;

/// The size of ids in bytes.
pub const ID_SIZE: usize = 20;

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
/// Kademlia keyspace position of a peer or a lookup target
pub struct Id([u8; ID_SIZE]);

impl Id {
    /// Hash arbitrary key bytes (a DHT key, or an encoded peer id) into the keyspace.
    pub fn from_key(key: &[u8]) -> Id {
        let mut hasher = Sha1::new();
        hasher.update(key);

        Id(hasher.digest().bytes())
    }

    /// Full XOR metric, used to order candidates by closeness to a target.
    pub fn xor(&self, other: &Id) -> Id {
        let mut result = [0_u8; ID_SIZE];

        for (i, byte) in result.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }

        Id(result)
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({:x?})", &self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn xor_orders_by_closeness() {
        let target = Id([0; ID_SIZE]);

        let mut near = [0; ID_SIZE];
        near[19] = 1;
        let mut far = [0; ID_SIZE];
        far[0] = 1;

        assert!(Id(near).xor(&target) < Id(far).xor(&target));
    }

    #[test]
    fn from_key_is_sha1() {
        let id = Id::from_key(b"hello");

        assert_eq!(
            id.0,
            [
                0xaa, 0xf4, 0xc6, 0x1d, 0xdc, 0xc5, 0xe8, 0xa2, 0xda, 0xbe, 0xde, 0x0f, 0x3b, 0x48,
                0x2c, 0xd9, 0xae, 0xa9, 0x43, 0x4d
            ]
        );
    }
}
