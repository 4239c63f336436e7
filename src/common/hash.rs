// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Domain-separated hashing helpers used to derive session identifiers and
// to bind auxiliary data. Fiat-Shamir challenges for the ZK proofs have
// their own dedicated, explicitly length-prefixed hash in `crypto::zkproof`.

use num_bigint_dig::BigInt;
use sha2::{Digest, Sha512_256};

const HASH_INPUT_DELIMITER: u8 = b'$';

fn prepare_hash_data(inputs: &[&[u8]]) -> Option<Vec<u8>> {
    if inputs.is_empty() {
        return None;
    }

    let input_len = inputs.len();
    let bz_size: usize = inputs.iter().map(|bz| bz.len()).sum();
    let data_cap = 8 + bz_size + input_len + (input_len * 8);
    let mut data = Vec::with_capacity(data_cap);

    data.extend_from_slice(&u64::try_from(input_len).unwrap_or(u64::MAX).to_le_bytes());
    for bz in inputs {
        data.extend_from_slice(bz);
        data.push(HASH_INPUT_DELIMITER);
        data.extend_from_slice(&u64::try_from(bz.len()).unwrap_or(u64::MAX).to_le_bytes());
    }

    Some(data)
}

/// Computes SHA-512/256 of the input byte slices, with length-prefixes and
/// delimiters between each input so that concatenation cannot produce a
/// collision between differently-shaped inputs.
pub fn sha512_256(inputs: &[&[u8]]) -> Option<Vec<u8>> {
    let data = prepare_hash_data(inputs)?;
    let mut state = Sha512_256::new();
    state.update(&data);
    Some(state.finalize().to_vec())
}

/// Computes SHA-512/256 over a set of `BigInt`s, reducing the digest back
/// into a `BigInt`.
pub fn sha512_256i(inputs: &[&BigInt]) -> Option<BigInt> {
    if inputs.is_empty() {
        return None;
    }
    let input_bytes: Vec<Vec<u8>> = inputs.iter().map(|n| n.to_bytes_be().1).collect();
    let input_slices: Vec<&[u8]> = input_bytes.iter().map(|v| v.as_slice()).collect();
    let data = prepare_hash_data(&input_slices)?;

    let mut state = Sha512_256::new();
    state.update(&data);
    let hash_bytes = state.finalize();
    Some(BigInt::from_bytes_be(num_bigint_dig::Sign::Plus, &hash_bytes))
}

/// Domain-separated variant of [`sha512_256i`]: the tag is hashed in twice
/// before any of the inputs, so callers in different contexts (e.g. ssid
/// derivation vs. commitment openings) never share a hash prefix.
pub fn sha512_256i_tagged(tag: &[u8], inputs: &[&BigInt]) -> Option<BigInt> {
    if inputs.is_empty() {
        return None;
    }
    let tag_hash = Sha512_256::digest(tag);

    let mut state = Sha512_256::new();
    state.update(&tag_hash);
    state.update(&tag_hash);

    let input_bytes: Vec<Vec<u8>> = inputs.iter().map(|n| n.to_bytes_be().1).collect();
    let input_slices: Vec<&[u8]> = input_bytes.iter().map(|v| v.as_slice()).collect();
    let data_part = prepare_hash_data(&input_slices)?;
    state.update(&data_part);

    let final_hash_bytes = state.finalize();
    Some(BigInt::from_bytes_be(num_bigint_dig::Sign::Plus, &final_hash_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint_dig::Num;

    #[test]
    fn test_sha512_256_delimited() {
        let data1 = b"hello";
        let data2 = b"world";

        let hash1 = sha512_256(&[&data1[..], &data2[..]]).unwrap();
        let hash3 = sha512_256(&[&data2[..], &data1[..]]).unwrap();
        assert_ne!(hash1, hash3, "order must matter");

        let combined = b"helloworld";
        let hash_combined = sha512_256(&[&combined[..]]).unwrap();
        assert_ne!(hash1, hash_combined, "concatenation must not collide");

        assert!(sha512_256(&[]).is_none());
    }

    #[test]
    fn test_sha512_256i_deterministic_and_order_sensitive() {
        let num1 = BigInt::from_str_radix("12345678901234567890", 10).unwrap();
        let num2 = BigInt::from_str_radix("98765432109876543210", 10).unwrap();

        let hash1 = sha512_256i(&[&num1, &num2]).unwrap();
        let hash1_again = sha512_256i(&[&num1, &num2]).unwrap();
        assert_eq!(hash1, hash1_again);

        let hash3 = sha512_256i(&[&num2, &num1]).unwrap();
        assert_ne!(hash1, hash3);

        assert!(sha512_256i(&[]).is_none());
    }

    #[test]
    fn test_sha512_256i_tagged_domain_separation() {
        let tag = b"MY_UNIQUE_TAG";
        let num1 = BigInt::from(12345u64);
        let num2 = BigInt::from(67890u64);

        let hash1 = sha512_256i_tagged(tag, &[&num1, &num2]).unwrap();
        let tag2 = b"ANOTHER_TAG";
        let hash2 = sha512_256i_tagged(tag2, &[&num1, &num2]).unwrap();
        assert_ne!(hash1, hash2);

        let hash_untagged = sha512_256i(&[&num1, &num2]).unwrap();
        assert_ne!(hash1, hash_untagged);

        assert!(sha512_256i_tagged(tag, &[]).is_none());
    }
}
