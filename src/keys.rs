//! RSA and EC key generation, plus PEM import and export.
use openssl::{
    ec::{EcKey, EcKeyRef},
    pkey::{HasParams, HasPublic, Private, Public},
    rsa::{Rsa, RsaRef},
};
use tracing::debug;

use crate::{
    curve::{Curve, CurvePoint},
    error::{Error, Result},
};

/// RSA modulus sizes accepted by [`generate_rsa_key`]
pub const RSA_KEY_SIZES: [u32; 3] = [2048, 3072, 4096];

/// Generates an RSA private key of `bits` bits.
///
/// Only 2048, 3072 and 4096 are accepted; anything else is `InvalidKeySize`.
pub fn generate_rsa_key(bits: u32) -> Result<Rsa<Private>> {
    if !RSA_KEY_SIZES.contains(&bits) {
        return Err(Error::InvalidKeySize { bits });
    }
    let key = Rsa::generate(bits)?;
    debug!(bits, "RSA key generated");
    Ok(key)
}

/// Extracts the public half `(n, e)` of an RSA key.
pub fn rsa_public_key<T: HasPublic>(key: &RsaRef<T>) -> Result<Rsa<Public>> {
    Ok(Rsa::from_public_components(
        key.n().to_owned()?,
        key.e().to_owned()?,
    )?)
}

/// PKCS#1 PEM encoding of an RSA private key
pub fn rsa_private_key_to_pem(key: &RsaRef<Private>) -> Result<Vec<u8>> {
    Ok(key.private_key_to_pem()?)
}

pub fn rsa_private_key_from_pem(pem: &[u8]) -> Result<Rsa<Private>> {
    Ok(Rsa::private_key_from_pem(pem)?)
}

/// SubjectPublicKeyInfo PEM encoding of an RSA public key
pub fn rsa_public_key_to_pem<T: HasPublic>(key: &RsaRef<T>) -> Result<Vec<u8>> {
    Ok(key.public_key_to_pem()?)
}

pub fn rsa_public_key_from_pem(pem: &[u8]) -> Result<Rsa<Public>> {
    Ok(Rsa::public_key_from_pem(pem)?)
}

/// Reads a PKCS#1 private key PEM and returns the PEM of its public half.
pub fn rsa_public_pem_from_private_pem(pem: &[u8]) -> Result<Vec<u8>> {
    let key = rsa_private_key_from_pem(pem)?;
    let public = rsa_public_key(&key)?;
    rsa_public_key_to_pem(&public)
}

/// Generates an EC private key with a random scalar on `curve`.
pub fn generate_ec_key(curve: &Curve) -> Result<EcKey<Private>> {
    let key = EcKey::generate(curve.group())?;
    key.check_key()?;
    debug!(curve = curve.nid().as_raw(), "EC key generated");
    Ok(key)
}

/// Extracts the public point of an EC key.
pub fn ec_public_key<T: HasPublic>(key: &EcKeyRef<T>) -> Result<EcKey<Public>> {
    Ok(EcKey::from_public_key(key.group(), key.public_key())?)
}

/// Resolves the named curve an EC key lives on.
///
/// # Returns
///
/// * If successful, the `Curve` of the key. Keys with explicit (unnamed) parameters
///   or on an unsupported curve fail with `UnsupportedCurveType`.
pub fn ec_key_curve<T: HasParams>(key: &EcKeyRef<T>) -> Result<Curve> {
    let nid = key
        .group()
        .curve_name()
        .ok_or(Error::UnsupportedCurveType)?;
    Curve::from_nid(nid)
}

/// The public key of `key` in affine coordinates.
pub fn ec_public_point<T: HasPublic>(key: &EcKeyRef<T>, curve: &Curve) -> Result<CurvePoint> {
    if key.group().curve_name() != Some(curve.nid()) {
        return Err(Error::CurveMismatch);
    }
    let mut bn_ctx = openssl::bn::BigNumContext::new()?;
    curve.from_ec_point(key.public_key(), &mut bn_ctx)
}

/// SEC1 PEM encoding of an EC private key
pub fn ec_private_key_to_pem(key: &EcKeyRef<Private>) -> Result<Vec<u8>> {
    Ok(key.private_key_to_pem()?)
}

pub fn ec_private_key_from_pem(pem: &[u8]) -> Result<EcKey<Private>> {
    let key = EcKey::private_key_from_pem(pem)?;
    key.check_key()?;
    Ok(key)
}

/// SubjectPublicKeyInfo PEM encoding of an EC public key
pub fn ec_public_key_to_pem<T: HasPublic>(key: &EcKeyRef<T>) -> Result<Vec<u8>> {
    Ok(key.public_key_to_pem()?)
}

pub fn ec_public_key_from_pem(pem: &[u8]) -> Result<EcKey<Public>> {
    let key = EcKey::public_key_from_pem(pem)?;
    key.check_key()?;
    Ok(key)
}

/// Reads a SEC1 private key PEM and returns the PEM of its public point.
pub fn ec_public_pem_from_private_pem(pem: &[u8]) -> Result<Vec<u8>> {
    let key = ec_private_key_from_pem(pem)?;
    ec_public_key_to_pem(&key)
}
