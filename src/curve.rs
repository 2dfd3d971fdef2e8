//! Short Weierstrass curves `y^2 = x^3 - 3x + b` over a prime field, backed by OpenSSL.
//!
//! A [`Curve`] is the curve-operations value handed explicitly to every protocol
//! operation. It is immutable; each operation allocates its own `BigNumContext`,
//! so a single `Curve` can be shared between threads.
use std::{fmt, str::FromStr};

use openssl::{
    bn::{BigNum, BigNumContext, BigNumContextRef, BigNumRef},
    ec::{EcGroup, EcGroupRef, EcPoint, EcPointRef},
    nid::Nid,
};

use crate::{
    error::{Error, Result},
    utils::{byte_len, is_zero, to_fixed_bytes},
};

/// SEC1 tag of an uncompressed point
const UNCOMPRESSED_TAG: u8 = 0x04;

/// Named curves known to satisfy the requirements of the protocol core
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveId {
    /// `NIST P-256` (`prime256v1`)
    P256,
    /// `NIST P-384` (`secp384r1`)
    P384,
    /// `NIST P-521` (`secp521r1`)
    P521,
}

impl CurveId {
    pub fn nid(self) -> Nid {
        match self {
            CurveId::P256 => Nid::X9_62_PRIME256V1,
            CurveId::P384 => Nid::SECP384R1,
            CurveId::P521 => Nid::SECP521R1,
        }
    }
}

impl Default for CurveId {
    fn default() -> Self {
        CurveId::P256
    }
}

impl FromStr for CurveId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p256" | "p-256" | "prime256v1" | "secp256r1" => Ok(CurveId::P256),
            "p384" | "p-384" | "secp384r1" => Ok(CurveId::P384),
            "p521" | "p-521" | "secp521r1" => Ok(CurveId::P521),
            _ => Err(Error::UnsupportedCurveType),
        }
    }
}

/// Domain parameters of a curve
#[derive(Debug)]
pub struct CurveParams {
    /// Prime modulus of the field
    pub p: BigNum,
    /// Order of the base point
    pub n: BigNum,
    /// Curve coefficient `b`
    pub b: BigNum,
    /// Base point, x coordinate
    pub gx: BigNum,
    /// Base point, y coordinate
    pub gy: BigNum,
    /// Bit length of the field
    pub bit_size: usize,
}

/// An affine point `(x, y)`.
///
/// Points returned by the protocol operations are always on their curve. Points built
/// with [`CurvePoint::new`] or [`CurvePoint::from_bytes`] are unchecked until an
/// operation validates them.
#[derive(Debug, PartialEq, Eq)]
pub struct CurvePoint {
    x: BigNum,
    y: BigNum,
}

impl CurvePoint {
    /// Builds an unchecked point from its coordinates.
    pub fn new(x: BigNum, y: BigNum) -> Self {
        CurvePoint { x, y }
    }

    pub fn x(&self) -> &BigNumRef {
        &self.x
    }

    pub fn y(&self) -> &BigNumRef {
        &self.y
    }

    /// A point with a zero coordinate never leaves the core.
    pub fn is_degenerate(&self) -> bool {
        is_zero(&self.x) || is_zero(&self.y)
    }

    pub fn try_clone(&self) -> Result<CurvePoint> {
        Ok(CurvePoint {
            x: self.x.to_owned()?,
            y: self.y.to_owned()?,
        })
    }

    /// Fixed-width `x || y`, each coordinate padded to the field length.
    pub fn coordinate_bytes(&self, curve: &Curve) -> Result<Vec<u8>> {
        let len = curve.field_len();
        Ok([to_fixed_bytes(&self.x, len)?, to_fixed_bytes(&self.y, len)?].concat())
    }

    /// SEC1 uncompressed encoding `0x04 || x || y`.
    pub fn to_bytes(&self, curve: &Curve) -> Result<Vec<u8>> {
        Ok([vec![UNCOMPRESSED_TAG], self.coordinate_bytes(curve)?].concat())
    }

    /// Decodes an uncompressed point without checking the curve equation.
    pub fn from_bytes(curve: &Curve, bytes: &[u8]) -> Result<CurvePoint> {
        let len = curve.field_len();
        if bytes.len() != 1 + 2 * len || bytes[0] != UNCOMPRESSED_TAG {
            return Err(Error::InvalidPoint);
        }
        Ok(CurvePoint {
            x: BigNum::from_slice(&bytes[1..1 + len])?,
            y: BigNum::from_slice(&bytes[1 + len..])?,
        })
    }
}

/// A prime-field short Weierstrass curve with `a = -3`
pub struct Curve {
    nid: Nid,
    group: EcGroup,
    params: CurveParams,
}

impl fmt::Debug for Curve {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Curve")
            .field("nid", &self.nid.as_raw())
            .field("params", &self.params)
            .finish()
    }
}

impl Curve {
    /// Creates the context for one of the named curves.
    pub fn new(id: CurveId) -> Result<Self> {
        Self::from_nid(id.nid())
    }

    /// Creates the context for any OpenSSL curve that the protocol core can use.
    ///
    /// # Arguments
    ///
    /// * `nid` - OpenSSL identifier of the curve.
    ///
    /// # Returns
    ///
    /// * If successful, the `Curve`. Fails with `UnsupportedCurveType` unless the curve is a
    ///   prime-field Weierstrass curve with `a = -3` and `p = 3 (mod 4)`.
    pub fn from_nid(nid: Nid) -> Result<Self> {
        let group = EcGroup::from_curve_name(nid).map_err(|_| Error::UnsupportedCurveType)?;
        Self::from_group(nid, group)
    }

    fn from_group(nid: Nid, group: EcGroup) -> Result<Self> {
        let mut bn_ctx = BigNumContext::new()?;

        let mut p = BigNum::new()?;
        let mut a = BigNum::new()?;
        let mut b = BigNum::new()?;
        group
            .components_gfp(&mut p, &mut a, &mut b, &mut bn_ctx)
            .map_err(|_| Error::UnsupportedCurveType)?;

        // a = -3 (mod p)
        let three = BigNum::from_u32(3)?;
        let mut a_plus_three = BigNum::new()?;
        a_plus_three.mod_add(&a, &three, &p, &mut bn_ctx)?;
        if !is_zero(&a_plus_three) || p.mod_word(4)? != 3 {
            return Err(Error::UnsupportedCurveType);
        }

        let generator = group.generator_opt().ok_or(Error::UnsupportedCurveType)?;
        let mut gx = BigNum::new()?;
        let mut gy = BigNum::new()?;
        generator.affine_coordinates_gfp(&group, &mut gx, &mut gy, &mut bn_ctx)?;
        let mut n = BigNum::new()?;
        group.order(&mut n, &mut bn_ctx)?;
        let bit_size = p.num_bits() as usize;

        Ok(Curve {
            nid,
            group,
            params: CurveParams {
                p,
                n,
                b,
                gx,
                gy,
                bit_size,
            },
        })
    }

    pub fn nid(&self) -> Nid {
        self.nid
    }

    pub fn group(&self) -> &EcGroupRef {
        &self.group
    }

    pub fn params(&self) -> &CurveParams {
        &self.params
    }

    pub fn order(&self) -> &BigNumRef {
        &self.params.n
    }

    /// Length in octets of a field element
    pub fn field_len(&self) -> usize {
        byte_len(self.params.bit_size)
    }

    /// Length in octets of a scalar modulo the order
    pub fn scalar_len(&self) -> usize {
        byte_len(self.params.n.num_bits() as usize)
    }

    /// The base point `g`
    pub fn generator(&self) -> Result<CurvePoint> {
        Ok(CurvePoint {
            x: self.params.gx.to_owned()?,
            y: self.params.gy.to_owned()?,
        })
    }

    /// The base point in OpenSSL form.
    pub(crate) fn ec_generator(&self) -> Result<&EcPointRef> {
        self.group
            .generator_opt()
            .ok_or(Error::UnsupportedCurveType)
    }

    /// Evaluates `x^3 - 3x + b (mod p)`.
    pub(crate) fn rhs(&self, x: &BigNumRef, bn_ctx: &mut BigNumContextRef) -> Result<BigNum> {
        let p = &self.params.p;
        let mut x_cubed = BigNum::new()?;
        let mut x_squared = BigNum::new()?;
        x_squared.mod_sqr(x, p, bn_ctx)?;
        x_cubed.mod_mul(&x_squared, x, p, bn_ctx)?;

        let three = BigNum::from_u32(3)?;
        let mut three_x = BigNum::new()?;
        three_x.mod_mul(x, &three, p, bn_ctx)?;

        let mut t = BigNum::new()?;
        t.mod_sub(&x_cubed, &three_x, p, bn_ctx)?;
        let mut rhs = BigNum::new()?;
        rhs.mod_add(&t, &self.params.b, p, bn_ctx)?;
        Ok(rhs)
    }

    /// Checks `y^2 = x^3 - 3x + b (mod p)` with both coordinates reduced.
    pub fn is_on_curve(&self, point: &CurvePoint) -> Result<bool> {
        let p = &self.params.p;
        if point.x >= *p || point.y >= *p {
            return Ok(false);
        }
        let mut bn_ctx = BigNumContext::new()?;
        let mut y_squared = BigNum::new()?;
        y_squared.mod_sqr(&point.y, p, &mut bn_ctx)?;
        let rhs = self.rhs(&point.x, &mut bn_ctx)?;
        Ok(y_squared == rhs)
    }

    /// Converts a validated point into its OpenSSL form.
    pub(crate) fn to_ec_point(
        &self,
        point: &CurvePoint,
        bn_ctx: &mut BigNumContextRef,
    ) -> Result<EcPoint> {
        if !self.is_on_curve(point)? {
            return Err(Error::InvalidPoint);
        }
        let bytes = point.to_bytes(self)?;
        Ok(EcPoint::from_bytes(&self.group, &bytes, bn_ctx)?)
    }

    /// Converts an OpenSSL point back into affine coordinates.
    /// The point at infinity is reported as `DegeneratePoint`.
    pub(crate) fn from_ec_point(
        &self,
        point: &EcPointRef,
        bn_ctx: &mut BigNumContextRef,
    ) -> Result<CurvePoint> {
        if point.is_infinity(&self.group) {
            return Err(Error::DegeneratePoint);
        }
        let mut x = BigNum::new()?;
        let mut y = BigNum::new()?;
        point.affine_coordinates_gfp(&self.group, &mut x, &mut y, bn_ctx)?;
        Ok(CurvePoint { x, y })
    }

    /// Computes `scalar * point` for a point on this curve.
    pub fn mul(&self, point: &CurvePoint, scalar: &BigNumRef) -> Result<CurvePoint> {
        let mut bn_ctx = BigNumContext::new()?;
        let ec_point = self.to_ec_point(point, &mut bn_ctx)?;
        let mut product = EcPoint::new(&self.group)?;
        product.mul2(&self.group, &ec_point, scalar, &mut bn_ctx)?;
        self.from_ec_point(&product, &mut bn_ctx)
    }

    /// Computes `scalar * g`.
    pub fn mul_generator(&self, scalar: &BigNumRef) -> Result<CurvePoint> {
        let mut bn_ctx = BigNumContext::new()?;
        let mut product = EcPoint::new(&self.group)?;
        product.mul_generator2(&self.group, scalar, &mut bn_ctx)?;
        self.from_ec_point(&product, &mut bn_ctx)
    }

    /// Computes `a + b`.
    pub fn add(&self, a: &CurvePoint, b: &CurvePoint) -> Result<CurvePoint> {
        let mut bn_ctx = BigNumContext::new()?;
        let a = self.to_ec_point(a, &mut bn_ctx)?;
        let b = self.to_ec_point(b, &mut bn_ctx)?;
        let mut sum = EcPoint::new(&self.group)?;
        sum.add(&self.group, &a, &b, &mut bn_ctx)?;
        self.from_ec_point(&sum, &mut bn_ctx)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_p256_params() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let params = curve.params();
        let expected_p = BigNum::from_hex_str(
            "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF",
        )
        .unwrap();
        let expected_gx = BigNum::from_hex_str(
            "6B17D1F2E12C4247F8BCE6E563A440F277037D812DEB33A0F4A13945D898C296",
        )
        .unwrap();
        assert_eq!(params.p, expected_p);
        assert_eq!(params.gx, expected_gx);
        assert_eq!(params.bit_size, 256);
        assert_eq!(curve.field_len(), 32);
        assert_eq!(curve.scalar_len(), 32);
    }

    #[test]
    fn test_p521_lengths() {
        let curve = Curve::new(CurveId::P521).unwrap();
        assert_eq!(curve.params().bit_size, 521);
        assert_eq!(curve.field_len(), 66);
    }

    #[test]
    fn test_unsupported_curves() {
        // a = 0
        assert!(matches!(
            Curve::from_nid(Nid::SECP256K1),
            Err(Error::UnsupportedCurveType)
        ));
        // p = 1 (mod 4)
        assert!(matches!(
            Curve::from_nid(Nid::SECP224R1),
            Err(Error::UnsupportedCurveType)
        ));
        assert!(matches!(
            "curve25519".parse::<CurveId>(),
            Err(Error::UnsupportedCurveType)
        ));
    }

    #[test]
    fn test_group_without_generator() {
        let mut bn_ctx = BigNumContext::new().unwrap();
        let p256 = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let mut p = BigNum::new().unwrap();
        let mut a = BigNum::new().unwrap();
        let mut b = BigNum::new().unwrap();
        p256.components_gfp(&mut p, &mut a, &mut b, &mut bn_ctx).unwrap();
        let bare = EcGroup::from_components(p, a, b, &mut bn_ctx).unwrap();
        assert!(matches!(
            Curve::from_group(Nid::X9_62_PRIME256V1, bare),
            Err(Error::UnsupportedCurveType)
        ));
    }

    #[test]
    fn test_curve_id_from_str() {
        assert_eq!("P-256".parse::<CurveId>().unwrap(), CurveId::P256);
        assert_eq!("secp384r1".parse::<CurveId>().unwrap(), CurveId::P384);
        assert_eq!("p521".parse::<CurveId>().unwrap(), CurveId::P521);
    }

    #[test]
    fn test_generator_on_curve() {
        for id in [CurveId::P256, CurveId::P384, CurveId::P521] {
            let curve = Curve::new(id).unwrap();
            assert!(curve.is_on_curve(&curve.generator().unwrap()).unwrap());
        }
    }

    #[test]
    fn test_off_curve_point() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let g = curve.generator().unwrap();
        let mut y = g.y().to_owned().unwrap();
        y.add_word(1).unwrap();
        let bad = CurvePoint::new(g.x().to_owned().unwrap(), y);
        assert!(!curve.is_on_curve(&bad).unwrap());
        assert!(matches!(
            curve.mul(&bad, &BigNum::from_u32(2).unwrap()),
            Err(Error::InvalidPoint)
        ));
    }

    #[test]
    fn test_mul_matches_add() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let g = curve.generator().unwrap();
        let two_g = curve.mul(&g, &BigNum::from_u32(2).unwrap()).unwrap();
        assert_eq!(two_g, curve.add(&g, &g).unwrap());
        assert_eq!(
            two_g,
            curve.mul_generator(&BigNum::from_u32(2).unwrap()).unwrap()
        );
    }

    #[test]
    fn test_mul_by_order_is_degenerate() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let g = curve.generator().unwrap();
        assert!(matches!(
            curve.mul(&g, curve.order()),
            Err(Error::DegeneratePoint)
        ));
    }

    #[test]
    fn test_point_bytes() {
        let curve = Curve::new(CurveId::P256).unwrap();
        let g = curve.generator().unwrap();
        let bytes = g.to_bytes(&curve).unwrap();
        let expected = hex::decode("046b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c2964fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5").unwrap();
        assert_eq!(bytes, expected);
        assert_eq!(CurvePoint::from_bytes(&curve, &bytes).unwrap(), g);
        assert!(matches!(
            CurvePoint::from_bytes(&curve, &bytes[1..]),
            Err(Error::InvalidPoint)
        ));
    }
}
