//! Discrete-log Verifiable Random Function over a Weierstrass curve, made non-interactive
//! with a Fiat-Shamir challenge, as described in
//! [Making NSEC5 Practical for DNSSEC](https://eprint.iacr.org/2017/099.pdf).
//!
//! Simplifications with respect to the paper: `H2 = H3`, and the proof curve equals the
//! generator's curve so the output exponent is `f = 1`. This construction is experimental;
//! use an RFC 9381 ECVRF where interoperability or vetted security matters.
//!
//! * `h      = H1(alpha)` (try-and-increment)
//! * `lambda = x * h`
//! * `c      = H3(g, h, g^x, h^x, g^k, h^k) mod q`
//! * `s      = k - c * x mod q`
//! * `beta   = H2(lambda)`
use std::fmt::{self, Debug, Formatter};

use openssl::{
    bn::{BigNum, BigNumContext, BigNumRef},
    ec::{EcGroupRef, EcKey, EcPoint, EcPointRef},
    pkey::{Private, Public},
};
use tracing::debug;

use crate::{
    curve::{Curve, CurvePoint},
    error::{Error, Result},
    hash::{digest, HashAlgorithm},
    hash_to_curve::hash_to_curve,
    utils::{is_zero, random_scalar, to_fixed_bytes},
    VRF,
};

/// `x || y`, each without leading zero bytes
fn minimal_coordinates(point: &CurvePoint) -> Vec<u8> {
    [point.x().to_vec(), point.y().to_vec()].concat()
}

/// Proof of an ECC-VRF evaluation
#[derive(Debug, PartialEq, Eq)]
pub struct EccProof {
    lambda: CurvePoint,
    c: BigNum,
    s: BigNum,
}

impl EccProof {
    /// Assembles a proof from its parts without validating them.
    pub fn new(lambda: CurvePoint, c: BigNum, s: BigNum) -> Self {
        EccProof { lambda, c, s }
    }

    /// The intermediate value `h^x`
    pub fn lambda(&self) -> &CurvePoint {
        &self.lambda
    }

    /// The Fiat-Shamir challenge
    pub fn c(&self) -> &BigNumRef {
        &self.c
    }

    /// The response `k - c * x mod q`
    pub fn s(&self) -> &BigNumRef {
        &self.s
    }

    /// Encodes the proof as `lambda || c || s`, with `lambda` uncompressed and both scalars
    /// padded to the length of the curve order.
    pub fn to_bytes(&self, curve: &Curve) -> Result<Vec<u8>> {
        let scalar_len = curve.scalar_len();
        Ok([
            self.lambda.to_bytes(curve)?,
            to_fixed_bytes(&self.c, scalar_len)?,
            to_fixed_bytes(&self.s, scalar_len)?,
        ]
        .concat())
    }

    /// Decodes a proof. Only the length is checked; verification validates the contents.
    pub fn from_bytes(curve: &Curve, pi: &[u8]) -> Result<Self> {
        let point_len = 1 + 2 * curve.field_len();
        let scalar_len = curve.scalar_len();
        let expected = point_len + 2 * scalar_len;
        if pi.len() != expected {
            return Err(Error::InvalidProofLength {
                expected,
                actual: pi.len(),
            });
        }

        let lambda = CurvePoint::from_bytes(curve, &pi[..point_len])?;
        let c = BigNum::from_slice(&pi[point_len..point_len + scalar_len])?;
        let s = BigNum::from_slice(&pi[point_len + scalar_len..])?;

        Ok(EccProof { lambda, c, s })
    }
}

/// An elliptic curve VRF bound to a curve and a hash function
pub struct EccVrf<'a> {
    curve: &'a Curve,
    hash: HashAlgorithm,
}

impl Debug for EccVrf<'_> {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("EccVrf")
            .field("curve", &self.curve.nid().as_raw())
            .field("hash", &self.hash)
            .finish()
    }
}

impl<'a> EccVrf<'a> {
    pub fn new(curve: &'a Curve, hash: HashAlgorithm) -> Self {
        EccVrf { curve, hash }
    }

    fn check_group(&self, group: &EcGroupRef) -> Result<()> {
        if group.curve_name() != Some(self.curve.nid()) {
            return Err(Error::CurveMismatch);
        }
        Ok(())
    }

    /// Hashes the minimal big-endian coordinates of `points`, in order, and reduces the
    /// digest modulo the curve order.
    ///
    /// # Arguments
    ///
    /// * `points` - The transcript `g, h, g^x, h^x, g^k, h^k`.
    ///
    /// # Returns
    ///
    /// * If successful, the challenge `c`.
    fn hash_points(&self, points: &[&CurvePoint]) -> Result<BigNum> {
        let encoded = points
            .iter()
            .map(|point| minimal_coordinates(point))
            .collect::<Vec<_>>();
        let fragments: Vec<&[u8]> = encoded.iter().map(Vec::as_slice).collect();
        let hash = BigNum::from_slice(&digest(self.hash, &fragments)?)?;

        let mut bn_ctx = BigNumContext::new()?;
        let mut c = BigNum::new()?;
        c.nnmod(&hash, self.curve.order(), &mut bn_ctx)?;
        Ok(c)
    }

    /// `beta = H2(lambda.x || lambda.y)`
    fn lambda_to_hash(&self, lambda: &CurvePoint) -> Result<Vec<u8>> {
        digest(self.hash, &[&minimal_coordinates(lambda)])
    }

    /// Computes the VRF output of a proof without verifying it.
    pub fn proof_to_hash(&self, pi: &EccProof) -> Result<Vec<u8>> {
        self.lambda_to_hash(&pi.lambda)
    }

    /// `a * p + b * q`, or `None` at infinity.
    fn linear_combination(
        &self,
        a: &BigNumRef,
        p: &EcPointRef,
        b: &BigNumRef,
        q: &EcPointRef,
        bn_ctx: &mut BigNumContext,
    ) -> Result<Option<CurvePoint>> {
        let group = self.curve.group();
        let mut a_p = EcPoint::new(group)?;
        let mut b_q = EcPoint::new(group)?;
        let mut sum = EcPoint::new(group)?;
        a_p.mul2(group, p, a, bn_ctx)?;
        b_q.mul2(group, q, b, bn_ctx)?;
        sum.add(group, &a_p, &b_q, bn_ctx)?;
        if sum.is_infinity(group) {
            return Ok(None);
        }
        self.curve.from_ec_point(&sum, bn_ctx).map(Some)
    }
}

/// VRFs are objects capable of generating and verifying proofs.
impl<'a, 'k> VRF<&'k EcKey<Public>, &'k EcKey<Private>> for EccVrf<'a> {
    type Proof = EccProof;
    type Error = Error;

    /// Generates a proof and its VRF output.
    ///
    /// # Arguments
    ///
    /// * `x`     - The EC private key; it must live on the VRF's curve.
    /// * `alpha` - The VRF input.
    ///
    /// # Returns
    ///
    /// * If successful, the pair `(proof, beta)`.
    fn prove(&self, x: &EcKey<Private>, alpha: &[u8]) -> Result<(EccProof, Vec<u8>)> {
        self.check_group(x.group())?;
        let secret_key = x.private_key();
        if is_zero(secret_key) {
            return Err(Error::MissingKey("EC private scalar"));
        }
        let group = self.curve.group();
        let order = self.curve.order();
        let mut bn_ctx = BigNumContext::new()?;

        let g = self.curve.generator()?;
        let public_key = self.curve.from_ec_point(x.public_key(), &mut bn_ctx)?;

        // Step 1: h = H1(alpha)
        let h = hash_to_curve(alpha, self.hash, self.curve)?;
        let h_point = self.curve.to_ec_point(&h, &mut bn_ctx)?;

        // Step 2: lambda = x * h
        let mut lambda_point = EcPoint::new(group)?;
        lambda_point.mul2(group, &h_point, secret_key, &mut bn_ctx)?;
        let lambda = self.curve.from_ec_point(&lambda_point, &mut bn_ctx)?;

        // Step 3: ephemeral k in [1, q)
        let k = random_scalar(order)?;

        // Step 4: g^k and h^k
        let mut gk_point = EcPoint::new(group)?;
        let mut hk_point = EcPoint::new(group)?;
        gk_point.mul_generator2(group, &k, &mut bn_ctx)?;
        hk_point.mul2(group, &h_point, &k, &mut bn_ctx)?;
        let gk = self.curve.from_ec_point(&gk_point, &mut bn_ctx)?;
        let hk = self.curve.from_ec_point(&hk_point, &mut bn_ctx)?;

        // Step 5: c = H3(g, h, g^x, h^x, g^k, h^k) mod q
        let c = self.hash_points(&[&g, &h, &public_key, &lambda, &gk, &hk])?;

        // Step 6: s = k - c*x mod q
        let mut cx = BigNum::new()?;
        cx.mod_mul(&c, secret_key, order, &mut bn_ctx)?;
        let mut s = BigNum::new()?;
        s.mod_sub(&k, &cx, order, &mut bn_ctx)?;

        // Step 7: beta = H2(lambda)
        let beta = self.lambda_to_hash(&lambda)?;
        debug!(hash = %self.hash, "ECC-VRF proof generated");

        Ok((EccProof { lambda, c, s }, beta))
    }

    /// Verifies a proof against `alpha` and `beta`.
    ///
    /// # Arguments
    ///
    /// * `y`     - The EC public key of the prover.
    /// * `alpha` - The VRF input.
    /// * `beta`  - The claimed VRF output.
    /// * `pi`    - The proof `(lambda, c, s)`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` iff the challenge and the output both check out; a mismatch is `Ok(false)`.
    fn verify(&self, y: &EcKey<Public>, alpha: &[u8], beta: &[u8], pi: &EccProof) -> Result<bool> {
        self.check_group(y.group())?;
        let order = self.curve.order();
        let mut bn_ctx = BigNumContext::new()?;

        // Step 1: lambda must be a proper point of the curve
        if pi.lambda.is_degenerate() || !self.curve.is_on_curve(&pi.lambda)? {
            debug!("ECC-VRF lambda is not a valid curve point");
            return Ok(false);
        }
        if pi.c >= *order || pi.s >= *order {
            debug!("ECC-VRF proof scalars are not reduced");
            return Ok(false);
        }

        let g = self.curve.generator()?;
        let public_key = self.curve.from_ec_point(y.public_key(), &mut bn_ctx)?;
        let lambda_point = self.curve.to_ec_point(&pi.lambda, &mut bn_ctx)?;

        // Step 2: u = c * g^x + s * g
        let u = self.linear_combination(
            &pi.c,
            y.public_key(),
            &pi.s,
            self.curve.ec_generator()?,
            &mut bn_ctx,
        )?;

        // Step 3: v = c * lambda + s * h
        let h = hash_to_curve(alpha, self.hash, self.curve)?;
        let h_point = self.curve.to_ec_point(&h, &mut bn_ctx)?;
        let v = self.linear_combination(&pi.c, &lambda_point, &pi.s, &h_point, &mut bn_ctx)?;

        let (u, v) = match (u, v) {
            (Some(u), Some(v)) => (u, v),
            _ => {
                debug!("ECC-VRF reconstructed commitment is the point at infinity");
                return Ok(false);
            }
        };

        // Step 4: recompute the challenge
        let derived_c = self.hash_points(&[&g, &h, &public_key, &pi.lambda, &u, &v])?;
        if derived_c.to_vec() != pi.c.to_vec() {
            debug!("ECC-VRF challenge mismatch");
            return Ok(false);
        }

        // Step 5: recompute beta
        if self.lambda_to_hash(&pi.lambda)? != beta {
            debug!("ECC-VRF beta mismatch");
            return Ok(false);
        }

        Ok(true)
    }
}
