//! Elliptic curve Oblivious Pseudorandom Function, following
//! [EC-OPRF](https://eprint.iacr.org/2017/111) section 3.1.
//!
//! 1. The client masks its input: `M = r * H(data)`, keeping `r^-1 mod q`.
//! 2. The server salts the masked point with its secret: `S = s * M`.
//! 3. The client unmasks: `U = r^-1 * S = s * H(data)`.
//!
//! The server learns nothing about `data` and the client learns nothing about `s`.
use openssl::bn::{BigNum, BigNumContext, BigNumRef};
use tracing::debug;

use crate::{
    curve::{Curve, CurvePoint},
    error::{Error, Result},
    hash::HashAlgorithm,
    hash_to_curve::hash_to_curve,
    utils::{is_zero, random_scalar},
};

/// The three OPRF steps over a fixed curve and hash function
#[derive(Debug)]
pub struct Oprf<'a> {
    curve: &'a Curve,
    hash: HashAlgorithm,
}

impl<'a> Oprf<'a> {
    pub fn new(curve: &'a Curve, hash: HashAlgorithm) -> Self {
        Oprf { curve, hash }
    }

    pub fn curve(&self) -> &Curve {
        self.curve
    }

    fn check_point(&self, point: &CurvePoint) -> Result<()> {
        if point.is_degenerate() || !self.curve.is_on_curve(point)? {
            return Err(Error::InvalidPoint);
        }
        Ok(())
    }

    /// Blinds `data` with a fresh random scalar.
    ///
    /// # Arguments
    ///
    /// * `data` - The client input.
    ///
    /// # Returns
    ///
    /// * If successful, the masked point `r * H(data)` and the unblinding scalar
    ///   `r^-1 mod q`. `r` itself is discarded.
    pub fn mask(&self, data: &[u8]) -> Result<(CurvePoint, BigNum)> {
        let order = self.curve.order();
        let mut bn_ctx = BigNumContext::new()?;

        let r = random_scalar(order)?;
        let mut r_inv = BigNum::new()?;
        r_inv.mod_inverse(&r, order, &mut bn_ctx)?;

        let h = hash_to_curve(data, self.hash, self.curve)?;
        let masked = self.curve.mul(&h, &r)?;
        if masked.is_degenerate() {
            return Err(Error::DegeneratePoint);
        }
        debug!(hash = %self.hash, "OPRF input masked");

        Ok((masked, r_inv))
    }

    /// Multiplies a masked point by the server secret.
    ///
    /// # Arguments
    ///
    /// * `masked` - The point received from the client; it must lie on the curve.
    /// * `s`      - The server secret. A fresh one is drawn when absent or zero.
    ///
    /// # Returns
    ///
    /// * If successful, the salted point and the secret actually used.
    pub fn salt(&self, masked: &CurvePoint, s: Option<&BigNumRef>) -> Result<(CurvePoint, BigNum)> {
        self.check_point(masked)?;
        let s = match s {
            Some(s) if !is_zero(s) => s.to_owned()?,
            _ => {
                debug!("OPRF salt absent, drawing a fresh one");
                random_scalar(self.curve.order())?
            }
        };
        let salted = self.curve.mul(masked, &s)?;

        Ok((salted, s))
    }

    /// Removes the client blinding from a salted point.
    ///
    /// # Arguments
    ///
    /// * `salted` - The point returned by the server; it must lie on the curve.
    /// * `r_inv`  - The unblinding scalar returned by [`Oprf::mask`].
    ///
    /// # Returns
    ///
    /// * If successful, `s * H(data)`.
    pub fn unmask(&self, salted: &CurvePoint, r_inv: &BigNumRef) -> Result<CurvePoint> {
        self.check_point(salted)?;
        self.curve.mul(salted, r_inv)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::curve::CurveId;

    #[test]
    fn test_round_trip_with_salt() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let oprf = Oprf::new(&curve, HashAlgorithm::Sha256);
        let data = b"I'm a string!";
        let s = BigNum::from_u32(7).unwrap();

        let (masked, r_inv) = oprf.mask(data).unwrap();
        let (salted, s_used) = oprf.salt(&masked, Some(&s)).unwrap();
        assert_eq!(s_used, s);
        let unmasked = oprf.unmask(&salted, &r_inv).unwrap();

        let h = hash_to_curve(data, HashAlgorithm::Sha256, &curve).unwrap();
        let expected = curve.mul(&h, &s).unwrap();
        assert_eq!(unmasked, expected);
    }

    #[test]
    fn test_round_trip_without_salt() {
        let curve = Curve::new(CurveId::P384).unwrap();
        let oprf = Oprf::new(&curve, HashAlgorithm::Sha384);
        let data = b"I'm a string!";

        let (masked, r_inv) = oprf.mask(data).unwrap();
        let (salted, s_used) = oprf.salt(&masked, None).unwrap();
        assert!(!is_zero(&s_used));
        assert!(s_used < *curve.order());
        let unmasked = oprf.unmask(&salted, &r_inv).unwrap();

        let h = hash_to_curve(data, HashAlgorithm::Sha384, &curve).unwrap();
        assert_eq!(unmasked, curve.mul(&h, &s_used).unwrap());
    }

    #[test]
    fn test_unmask_undoes_mask() {
        let curve = Curve::new(CurveId::P521).unwrap();
        let oprf = Oprf::new(&curve, HashAlgorithm::Sha512);
        let data = b"I'm a string!";

        let (masked, r_inv) = oprf.mask(data).unwrap();
        let unmasked = oprf.unmask(&masked, &r_inv).unwrap();
        assert_eq!(
            unmasked,
            hash_to_curve(data, HashAlgorithm::Sha512, &curve).unwrap()
        );
    }

    #[test]
    fn test_zero_salt_is_replaced() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let oprf = Oprf::new(&curve, HashAlgorithm::Sha256);
        let (masked, _) = oprf.mask(b"data").unwrap();
        let zero = BigNum::new().unwrap();
        let (_, s_used) = oprf.salt(&masked, Some(&zero)).unwrap();
        assert!(!is_zero(&s_used));
    }

    #[test]
    fn test_mask_is_blinded() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let oprf = Oprf::new(&curve, HashAlgorithm::Sha256);
        let (first, r_inv) = oprf.mask(b"data").unwrap();
        let (second, _) = oprf.mask(b"data").unwrap();
        assert_ne!(first, second);

        let h = hash_to_curve(b"data", HashAlgorithm::Sha256, &curve).unwrap();
        assert_eq!(curve.mul(&first, &r_inv).unwrap(), h);
    }

    #[test]
    fn test_rejects_invalid_points() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let oprf = Oprf::new(&curve, HashAlgorithm::Sha256);
        let (masked, r_inv) = oprf.mask(b"data").unwrap();

        let mut y = masked.y().to_owned().unwrap();
        y.add_word(1).unwrap();
        let off_curve = CurvePoint::new(masked.x().to_owned().unwrap(), y);
        assert!(matches!(
            oprf.salt(&off_curve, None),
            Err(Error::InvalidPoint)
        ));
        assert!(matches!(
            oprf.unmask(&off_curve, &r_inv),
            Err(Error::InvalidPoint)
        ));

        let zero = CurvePoint::new(BigNum::new().unwrap(), BigNum::new().unwrap());
        assert!(matches!(oprf.salt(&zero, None), Err(Error::InvalidPoint)));
    }
}
