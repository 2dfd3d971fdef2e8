//! Protocol core for verifiable random functions and an oblivious pseudorandom function,
//! backed by OpenSSL.
//!
//! * [`rsa_vrf::RsaVrf`]: RSA-based VRF with an MGF1 mask.
//! * [`ecc_vrf::EccVrf`]: discrete-log VRF over P-256, P-384 or P-521.
//! * [`oprf::Oprf`]: blinded mask / salt / unmask over the same curves.
//!
//! Both VRFs implement the [`VRF`] trait:
//!
//! ```no_run
//! use foil::{keys, EccVrf, Curve, CurveId, HashAlgorithm, VRF};
//! use openssl::ec::EcKey;
//!
//! let curve = Curve::new(CurveId::P256).unwrap();
//! let vrf = EccVrf::new(&curve, HashAlgorithm::Sha256);
//! let secret_key = keys::generate_ec_key(&curve).unwrap();
//! let public_key = EcKey::from_public_key(curve.group(), secret_key.public_key()).unwrap();
//!
//! let (pi, beta) = vrf.prove(&secret_key, b"sample").unwrap();
//! assert!(vrf.verify(&public_key, b"sample", &beta, &pi).unwrap());
//! ```
pub mod aes;
pub mod curve;
pub mod ecc_vrf;
pub mod error;
pub mod hash;
pub mod hash_to_curve;
pub mod keys;
pub mod mgf1;
pub mod oprf;
pub mod rsa_vrf;
mod utils;

pub use curve::{Curve, CurveId, CurvePoint};
pub use ecc_vrf::{EccProof, EccVrf};
pub use error::{Error, Result};
pub use hash::HashAlgorithm;
pub use hash_to_curve::hash_to_curve;
pub use mgf1::mgf1;
pub use oprf::Oprf;
pub use rsa_vrf::RsaVrf;

/// A trait for a Verifiable Random Functions (VRF)
/// implementations.
pub trait VRF<PublicKey, SecretKey> {
    type Proof;
    type Error;

    /// Generate proof and VRF output from secret key and message
    fn prove(
        &self,
        x: SecretKey,
        alpha: &[u8],
    ) -> std::result::Result<(Self::Proof, Vec<u8>), Self::Error>;

    /// Verify proof and VRF output given public key and message
    fn verify(
        &self,
        y: PublicKey,
        alpha: &[u8],
        beta: &[u8],
        pi: &Self::Proof,
    ) -> std::result::Result<bool, Self::Error>;
}
