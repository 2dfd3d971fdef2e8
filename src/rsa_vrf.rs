//! RSA-based Verifiable Random Function (RSA-FDH-VRF flavour with an MGF1 mask),
//! following [Making NSEC5 Practical for DNSSEC](https://eprint.iacr.org/2017/099.pdf).
//!
//! * `proof = MGF1(alpha)^d mod n`
//! * `beta  = H(proof)`
//!
//! Verification recomputes `proof^e mod n` and compares it against `MGF1(alpha)`.
use std::cmp::Ordering;

use openssl::{
    bn::{BigNum, BigNumContext, BigNumRef},
    pkey::{Private, Public},
    rsa::Rsa,
};
use tracing::debug;

use crate::{
    error::{Error, Result},
    hash::{digest, HashAlgorithm},
    mgf1::mgf1,
    utils::{is_zero, to_fixed_bytes},
    VRF,
};

/// An RSA VRF parameterised by its hash function (used for both MGF1 and beta)
#[derive(Clone, Copy, Debug, Default)]
pub struct RsaVrf {
    hash: HashAlgorithm,
}

impl RsaVrf {
    pub fn new(hash: HashAlgorithm) -> Self {
        RsaVrf { hash }
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Computes `MGF1(alpha)` with the mask length derived from the modulus.
    fn mask(&self, alpha: &[u8], n: &BigNumRef) -> Result<Vec<u8>> {
        mgf1(alpha, self.hash, mask_len(n)?)
    }
}

/// Length of the MGF1 output for a modulus `n`.
///
/// `(bits(n) + 8) / 8 - 2` octets: one octet less than the modulus whenever its bit length
/// is a multiple of 8, so the masked integer is always below `n`.
pub fn mask_len(n: &BigNumRef) -> Result<usize> {
    let bits = n.num_bits() as usize;
    let modulus_len = (bits + 8) / 8;
    if modulus_len < 3 {
        return Err(Error::ModulusTooSmall { bits });
    }
    Ok(modulus_len - 2)
}

/// VRFs are objects capable of generating and verifying proofs.
impl<'a> VRF<&'a Rsa<Public>, &'a Rsa<Private>> for RsaVrf {
    /// Raw exponentiation result as minimal big-endian octets
    type Proof = Vec<u8>;
    type Error = Error;

    /// Generates a proof and its VRF output.
    ///
    /// # Arguments
    ///
    /// * `x`     - The RSA private key (`n` and `d` must be non-zero).
    /// * `alpha` - The VRF input.
    ///
    /// # Returns
    ///
    /// * If successful, the pair `(proof, beta)`.
    fn prove(&self, x: &Rsa<Private>, alpha: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let n = x.n();
        let d = x.d();
        if is_zero(n) {
            return Err(Error::MissingKey("RSA modulus"));
        }
        if is_zero(d) {
            return Err(Error::MissingKey("RSA private exponent"));
        }

        let masked = BigNum::from_slice(&self.mask(alpha, n)?)?;
        let mut bn_ctx = BigNumContext::new()?;
        let mut proof = BigNum::new()?;
        proof.mod_exp(&masked, d, n, &mut bn_ctx)?;

        let proof = proof.to_vec();
        let beta = digest(self.hash, &[&proof])?;
        debug!(
            modulus_bits = n.num_bits(),
            proof_len = proof.len(),
            "RSA-VRF proof generated"
        );

        Ok((proof, beta))
    }

    /// Verifies a proof against `alpha` and `beta`.
    ///
    /// # Arguments
    ///
    /// * `y`     - The RSA public key (`n` and `e` must be non-zero).
    /// * `alpha` - The VRF input.
    /// * `beta`  - The claimed VRF output.
    /// * `pi`    - The proof.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` iff `H(pi) == beta` and `pi^e mod n == MGF1(alpha)`; a mismatch is `Ok(false)`.
    fn verify(&self, y: &Rsa<Public>, alpha: &[u8], beta: &[u8], pi: &Vec<u8>) -> Result<bool> {
        let n = y.n();
        let e = y.e();
        if is_zero(n) {
            return Err(Error::MissingKey("RSA modulus"));
        }
        if is_zero(e) {
            return Err(Error::MissingKey("RSA public exponent"));
        }

        let mgf1_alpha = self.mask(alpha, n)?;

        let beta_check = digest(self.hash, &[pi])?;
        if beta_check != beta {
            debug!("RSA-VRF beta does not match H(proof)");
            return Ok(false);
        }

        let proof = BigNum::from_slice(pi)?;
        if proof.ucmp(n) != Ordering::Less {
            debug!("RSA-VRF proof is not reduced modulo n");
            return Ok(false);
        }
        let mut bn_ctx = BigNumContext::new()?;
        let mut check = BigNum::new()?;
        check.mod_exp(&proof, e, n, &mut bn_ctx)?;

        if check.num_bytes() as usize > mgf1_alpha.len()
            || to_fixed_bytes(&check, mgf1_alpha.len())? != mgf1_alpha
        {
            debug!("RSA-VRF proof^e does not match MGF1(alpha)");
            return Ok(false);
        }

        Ok(true)
    }
}
