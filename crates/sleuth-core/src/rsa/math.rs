//! Arbitrary-precision helpers for the RSA attacks.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use std::cmp::Ordering;

/// Largest `r` with `r^k <= base`, found by binary search.
///
/// The search interval `[0, base]` is clipped to `2^ceil(bits(base) / k)`,
/// which always bounds the root and keeps the trial powers small for large
/// exponents. `k == 0` has no meaningful root and yields zero.
pub fn integer_root(base: &BigUint, k: u32) -> BigUint {
    if k == 0 {
        return BigUint::zero();
    }
    if k == 1 {
        return base.clone();
    }

    let root_bits = (base.bits() + u64::from(k) - 1) / u64::from(k);
    let clip = BigUint::one() << root_bits;

    let mut low = BigUint::zero();
    let mut high = if &clip < base { clip } else { base.clone() };
    let mut ans = BigUint::zero();

    while low <= high {
        let mid: BigUint = (&low + &high) >> 1u32;

        match mid.pow(k).cmp(base) {
            Ordering::Equal => return mid,
            Ordering::Less => {
                low = &mid + 1u32;
                ans = mid;
            }
            Ordering::Greater => {
                if mid.is_zero() {
                    break;
                }
                high = mid - 1u32;
            }
        }
    }

    ans
}

/// Modular inverse of `a` mod `m` via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, m) != 1` or `m` is zero.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }

    let modulus = BigInt::from(m.clone());
    let (mut old_r, mut r) = (BigInt::from(a.clone()), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }

    (((old_s % &modulus) + &modulus) % &modulus).to_biguint()
}

/// Big-endian bytes of `value`; zero renders as an empty message.
pub fn to_message_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_integer_root_exact() {
        assert_eq!(integer_root(&big(74088), 3), big(42));
        assert_eq!(integer_root(&big(1 << 20), 2), big(1 << 10));
        assert_eq!(integer_root(&big(0), 3), big(0));
        assert_eq!(integer_root(&big(1), 65537), big(1));
    }

    #[test]
    fn test_integer_root_floors() {
        assert_eq!(integer_root(&big(74089), 3), big(42));
        assert_eq!(integer_root(&big(74087), 3), big(41));
        assert_eq!(integer_root(&big(2), 2), big(1));
    }

    #[test]
    fn test_integer_root_matches_nth_root() {
        let m = BigUint::from_bytes_be(b"picoCTF{sm4ll_3xp0n3nt}");
        let c = m.pow(3);
        assert_eq!(integer_root(&c, 3), m);
        for k in [2u32, 5, 7, 17] {
            assert_eq!(integer_root(&c, k), c.nth_root(k));
        }
    }

    #[test]
    fn test_integer_root_degenerate_exponents() {
        assert_eq!(integer_root(&big(99), 1), big(99));
        assert_eq!(integer_root(&big(99), 0), big(0));
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(mod_inverse(&big(17), &big(3120)), Some(big(2753)));
        assert_eq!(mod_inverse(&big(3), &big(11)), Some(big(4)));
        assert_eq!(mod_inverse(&big(6), &big(9)), None);
        assert_eq!(mod_inverse(&big(5), &big(0)), None);
    }

    #[test]
    fn test_to_message_bytes() {
        assert_eq!(to_message_bytes(&big(42)), b"*".to_vec());
        assert!(to_message_bytes(&big(0)).is_empty());
        assert_eq!(to_message_bytes(&big(0x4142)), b"AB".to_vec());
    }
}
