//! Try-and-increment hashing into a Weierstrass curve.
//!
//! Warning: the number of iterations depends on the input, so timing leaks information
//! about the data being hashed.
use openssl::bn::{BigNum, BigNumContext, BigNumRef};
use tracing::debug;

use crate::{
    curve::{Curve, CurvePoint},
    error::{Error, Result},
    hash::{digest, HashAlgorithm},
    utils::is_zero,
};

/// Upper bound on the number of candidate x-coordinates. Each candidate succeeds with
/// probability close to 1/2, so reaching the bound means something is broken.
pub const HASH_TO_CURVE_MAX_ATTEMPTS: usize = 256;

/// Maps `data` to a point of `curve`.
///
/// Starts at `x = H(data) mod p` and increments `x` until `x^3 - 3x + b` is a quadratic
/// residue modulo `p`, then takes `y = t^((p + 1) / 4) mod p`.
///
/// # Arguments
///
/// * `data`  - The input to hash.
/// * `hash`  - Hash function used for the initial candidate.
/// * `curve` - The target curve (requires `p = 3 (mod 4)`).
///
/// # Returns
///
/// * If successful, a `CurvePoint` on `curve`. Fails with `CurveMappingFailed` when no point
///   is found within [`HASH_TO_CURVE_MAX_ATTEMPTS`] candidates or the result is off the curve.
pub fn hash_to_curve(data: &[u8], hash: HashAlgorithm, curve: &Curve) -> Result<CurvePoint> {
    try_and_increment(data, hash, curve, HASH_TO_CURVE_MAX_ATTEMPTS)
}

/// Try-and-increment loop giving up after `max_attempts` candidates.
pub(crate) fn try_and_increment(
    data: &[u8],
    hash: HashAlgorithm,
    curve: &Curve,
    max_attempts: usize,
) -> Result<CurvePoint> {
    let mut bn_ctx = BigNumContext::new()?;
    let p: &BigNumRef = &curve.params().p;
    let one = BigNum::from_u32(1)?;

    // (p - 1) / 2 for Euler's criterion, (p + 1) / 4 for the square root
    let mut p_minus_one = p.to_owned()?;
    p_minus_one.sub_word(1)?;
    let mut euler_exp = BigNum::new()?;
    euler_exp.rshift1(&p_minus_one)?;
    let mut p_plus_one = p.to_owned()?;
    p_plus_one.add_word(1)?;
    let mut sqrt_exp = BigNum::new()?;
    sqrt_exp.rshift(&p_plus_one, 2)?;

    let h = BigNum::from_slice(&digest(hash, &[data])?)?;
    let mut x = BigNum::new()?;
    x.nnmod(&h, p, &mut bn_ctx)?;

    for attempt in 0..max_attempts {
        let t = curve.rhs(&x, &mut bn_ctx)?;
        let mut legendre = BigNum::new()?;
        legendre.mod_exp(&t, &euler_exp, p, &mut bn_ctx)?;

        if !is_zero(&t) && legendre == one {
            let mut y = BigNum::new()?;
            y.mod_exp(&t, &sqrt_exp, p, &mut bn_ctx)?;
            let point = CurvePoint::new(x, y);
            if !curve.is_on_curve(&point)? {
                return Err(Error::CurveMappingFailed {
                    attempts: attempt + 1,
                });
            }
            debug!(attempts = attempt + 1, "hash to curve found a point");
            return Ok(point);
        }

        let mut next = BigNum::new()?;
        next.mod_add(&x, &one, p, &mut bn_ctx)?;
        x = next;
    }

    Err(Error::CurveMappingFailed {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::curve::CurveId;

    fn point_from_hex(x: &str, y: &str) -> CurvePoint {
        CurvePoint::new(
            BigNum::from_hex_str(x).unwrap(),
            BigNum::from_hex_str(y).unwrap(),
        )
    }

    /// ASCII "sample" on P-256 with SHA-256; the fourth candidate is the first residue
    #[test]
    fn test_hash_to_curve_sample() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let expected = point_from_hex(
            "af2bdbe1aa9b6ec1e2ade1d694f41fc71a831d0268e9891562113d8a62add1c2",
            "d64244876f22c9dc750431da9758b8b4da1ce00464cde6471b9568f0cfa39c58",
        );
        let point = hash_to_curve(b"sample", HashAlgorithm::Sha256, &curve).unwrap();
        assert_eq!(point, expected);
    }

    #[test]
    fn test_hash_to_curve_string() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let expected = point_from_hex(
            "924d88a8fc36f08d6efbabeaed082b1a868dfa1da18a792aa59626ab5c5a0eff",
            "ef50acfd16dfef68a33bf9840b1f90c9e41e93705198e2060394644b54022a1d",
        );
        let point = hash_to_curve(b"I'm a string!", HashAlgorithm::Sha256, &curve).unwrap();
        assert_eq!(point, expected);
    }

    #[test]
    fn test_hash_to_curve_empty_input() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let expected = point_from_hex(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b857",
            "3c695aedfdc8748fc5fef019b6c81cbdad63859c35885c6f6b9d3ccef9c395bb",
        );
        let point = hash_to_curve(b"", HashAlgorithm::Sha256, &curve).unwrap();
        assert_eq!(point, expected);
    }

    #[test]
    fn test_hash_to_curve_other_curves() {
        for id in [CurveId::P384, CurveId::P521] {
            let curve = Curve::new(id).unwrap();
            for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
                let a = hash_to_curve(b"test", hash, &curve).unwrap();
                let b = hash_to_curve(b"test", hash, &curve).unwrap();
                assert!(curve.is_on_curve(&a).unwrap());
                assert!(!a.is_degenerate());
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_hash_to_curve_distinct_inputs() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let a = hash_to_curve(b"alpha", HashAlgorithm::Sha256, &curve).unwrap();
        let b = hash_to_curve(b"beta", HashAlgorithm::Sha256, &curve).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_attempt_cap() {
        let curve = Curve::new(CurveId::P256).unwrap();
        // the first three candidates for "sample" are non-residues
        for cap in 1..4 {
            assert!(matches!(
                try_and_increment(b"sample", HashAlgorithm::Sha256, &curve, cap),
                Err(Error::CurveMappingFailed { attempts }) if attempts == cap
            ));
        }
        assert_eq!(
            try_and_increment(b"sample", HashAlgorithm::Sha256, &curve, 4).unwrap(),
            hash_to_curve(b"sample", HashAlgorithm::Sha256, &curve).unwrap()
        );
    }
}
