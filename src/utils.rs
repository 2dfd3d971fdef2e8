use openssl::bn::{BigNum, BigNumRef};

use crate::error::{Error, Result};

/// Number of octets needed to hold `bits` bits.
pub fn byte_len(bits: usize) -> usize {
    (bits + 7) / 8
}

/// Value-based zero test; never compares against a shared constant.
pub fn is_zero(n: &BigNumRef) -> bool {
    n.num_bits() == 0
}

/// Encodes `n` as big-endian octets, left-padded with zeros to `len` octets.
///
/// # Arguments
///
/// * `n`   - A non-negative `BigNum`.
/// * `len` - The total length (in octets) of the encoding.
///
/// # Returns
///
/// * If successful, a vector of exactly `len` octets. Fails when `n` does not fit.
pub fn to_fixed_bytes(n: &BigNumRef, len: usize) -> Result<Vec<u8>> {
    if n.num_bytes() as usize > len {
        return Err(Error::ValueTooLarge { len });
    }
    Ok(n.to_vec_padded(len as i32)?)
}

/// Draws a scalar uniformly from `[1, order)` using the OpenSSL CSPRNG.
///
/// Zero is redrawn: it has no inverse and would collapse any point it multiplies.
pub fn random_scalar(order: &BigNumRef) -> Result<BigNum> {
    let mut scalar = BigNum::new()?;
    loop {
        order.rand_range(&mut scalar)?;
        if !is_zero(&scalar) {
            return Ok(scalar);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_fixed_bytes_pads() {
        let n = BigNum::from_u32(0x0102).unwrap();
        assert_eq!(to_fixed_bytes(&n, 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(to_fixed_bytes(&n, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_to_fixed_bytes_too_long() {
        let n = BigNum::from_u32(0x010203).unwrap();
        assert!(matches!(
            to_fixed_bytes(&n, 2),
            Err(Error::ValueTooLarge { len: 2 })
        ));
    }

    #[test]
    fn test_is_zero() {
        assert!(is_zero(&BigNum::new().unwrap()));
        assert!(is_zero(&BigNum::from_u32(0).unwrap()));
        assert!(!is_zero(&BigNum::from_u32(1).unwrap()));
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(byte_len(256), 32);
        assert_eq!(byte_len(521), 66);
        assert_eq!(byte_len(1), 1);
    }

    #[test]
    fn test_random_scalar_in_range() {
        let order = BigNum::from_u32(3).unwrap();
        for _ in 0..32 {
            let k = random_scalar(&order).unwrap();
            assert!(!is_zero(&k));
            assert!(k < order);
        }
    }
}
