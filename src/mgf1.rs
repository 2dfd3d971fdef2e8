//! MGF1 mask generation function from PKCS#1 (RFC 8017, appendix B.2.1).
use crate::{
    error::Result,
    hash::{digest, HashAlgorithm},
};

/// Expands `seed` into `output_len` pseudorandom bytes.
///
/// Each block is `H(seed || counter)` with a 4-byte big-endian counter starting at zero,
/// XORed into a zeroed output buffer.
///
/// # Arguments
///
/// * `seed`       - The seed to expand.
/// * `hash`       - The hash function used for every block.
/// * `output_len` - Number of bytes to produce.
///
/// # Returns
///
/// * If successful, exactly `output_len` bytes.
pub fn mgf1(seed: &[u8], hash: HashAlgorithm, output_len: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; output_len];
    let mut counter: u32 = 0;

    for chunk in output.chunks_mut(hash.output_len()) {
        let block = digest(hash, &[seed, &counter.to_be_bytes()])?;
        for (out, byte) in chunk.iter_mut().zip(block.iter()) {
            *out ^= byte;
        }
        counter = counter.wrapping_add(1);
    }

    Ok(output)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_block_is_hash_of_seed_and_zero_counter() {
        let seed = b"alpha";
        let expected = digest(HashAlgorithm::Sha256, &[seed, &[0, 0, 0, 0]]).unwrap();
        assert_eq!(mgf1(seed, HashAlgorithm::Sha256, 32).unwrap(), expected);
    }

    #[test]
    fn test_second_block_uses_counter_one() {
        let seed = b"alpha";
        let out = mgf1(seed, HashAlgorithm::Sha256, 40).unwrap();
        let second = digest(HashAlgorithm::Sha256, &[seed, &[0, 0, 0, 1]]).unwrap();
        assert_eq!(&out[32..], &second[..8]);
    }

    #[test]
    fn test_length() {
        for len in [0usize, 1, 31, 32, 33, 255, 511] {
            assert_eq!(mgf1(b"seed", HashAlgorithm::Sha256, len).unwrap().len(), len);
        }
    }

    #[test]
    fn test_prefix_stable() {
        let short = mgf1(b"seed", HashAlgorithm::Sha512, 70).unwrap();
        let long = mgf1(b"seed", HashAlgorithm::Sha512, 200).unwrap();
        assert_eq!(&long[..70], &short[..]);
    }

    /// Known answer for MGF1 with SHA-256
    #[test]
    fn test_known_answer_sha256() {
        let out = mgf1(b"bar", HashAlgorithm::Sha256, 50).unwrap();
        let expected = hex::decode(
            "382576a7841021cc28fc4c0948753fb8312090cea942ea4c4e735d10dc724b155f9f6069f289d61daca0cb814502ef04eae1",
        )
        .unwrap();
        assert_eq!(out, expected);
    }
}
