//! Scoped hashing. Each call owns a fresh accumulator, so no partial hash state
//! ever escapes to callers or is shared between operations.
use std::fmt;

use openssl::hash::{Hasher, MessageDigest};

use crate::error::Result;

/// Hash functions available to the protocols
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

impl HashAlgorithm {
    fn message_digest(self) -> MessageDigest {
        match self {
            HashAlgorithm::Sha256 => MessageDigest::sha256(),
            HashAlgorithm::Sha384 => MessageDigest::sha384(),
            HashAlgorithm::Sha512 => MessageDigest::sha512(),
        }
    }

    /// Length of a digest in bytes
    pub fn output_len(self) -> usize {
        self.message_digest().size()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

/// Hashes the concatenation of `fragments` with `algorithm`.
///
/// # Arguments
///
/// * `algorithm` - The hash function to use.
/// * `fragments` - Byte strings fed to the hasher in order.
///
/// # Returns
///
/// * If successful, the digest bytes.
pub fn digest(algorithm: HashAlgorithm, fragments: &[&[u8]]) -> Result<Vec<u8>> {
    let mut hasher = Hasher::new(algorithm.message_digest())?;
    for fragment in fragments {
        hasher.update(fragment)?;
    }
    Ok(hasher.finish()?.to_vec())
}
