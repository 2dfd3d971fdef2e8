use std::os::raw::c_ulong;

use openssl::error::ErrorStack;
use thiserror::Error;

/// Different errors that can be raised by the protocol core
#[derive(Debug, Error)]
pub enum Error {
    /// Error raised from `openssl::error::ErrorStack` with a specific code
    #[error("OpenSSL error with code {code}")]
    CodedError { code: c_ulong },
    /// Try-and-increment found no quadratic residue, or the mapped point is off the curve
    #[error("hash to curve could not find a valid point after {attempts} attempts")]
    CurveMappingFailed { attempts: usize },
    /// A computed point has a zero coordinate or is the point at infinity
    #[error("the resulting point is degenerate")]
    DegeneratePoint,
    /// A required key component is absent or zero
    #[error("missing key material: {0}")]
    MissingKey(&'static str),
    /// The requested curve is not a prime-field Weierstrass curve with a = -3 and p = 3 (mod 4)
    #[error("unsupported curve type")]
    UnsupportedCurveType,
    /// The key belongs to a different curve than the one supplied
    #[error("the key does not belong to the supplied curve")]
    CurveMismatch,
    /// A supplied point does not satisfy the curve equation
    #[error("the point is not on the curve")]
    InvalidPoint,
    /// The encoded proof has the wrong length
    #[error("invalid proof length: expected {expected} got {actual}")]
    InvalidProofLength { expected: usize, actual: usize },
    /// The RSA modulus is too short to hold a mask
    #[error("RSA modulus of {bits} bits is too small")]
    ModulusTooSmall { bits: usize },
    /// Key generation was asked for a size that is not allowed
    #[error("key size of {bits} bits is not supported (use 2048, 3072 or 4096)")]
    InvalidKeySize { bits: u32 },
    /// AES-256 keys are exactly 32 bytes long
    #[error("AES key must be 32 bytes, got {0}")]
    InvalidAesKeyLength(usize),
    /// The ciphertext was truncated or failed authentication
    #[error("decryption failed")]
    DecryptionFailed,
    /// A value is wider than the fixed-width field it is encoded into
    #[error("value does not fit in {len} bytes")]
    ValueTooLarge { len: usize },
    /// Unknown error
    #[error("unknown error")]
    Unknown,
}

impl From<ErrorStack> for Error {
    /// Transforms error from `openssl::error::ErrorStack` to `Error::CodedError` or `Error::Unknown`
    fn from(error: ErrorStack) -> Self {
        match error.errors().first().map(openssl::error::Error::code) {
            Some(code) => Error::CodedError { code },
            _ => Error::Unknown,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
