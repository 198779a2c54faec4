//! Host-level tests for the per-protocol checksums.
#![cfg(feature = "host")]

use slowrf::classify::{cksum1, cksum2, cksum3, parity_even_bit};

#[test]
fn parity_counts_ones() {
    assert!(!parity_even_bit(0x00));
    assert!(parity_even_bit(0x01));
    assert!(!parity_even_bit(0x03));
    assert!(parity_even_bit(0x10));
    assert!(!parity_even_bit(0xFF));
}

#[test]
fn fs20_checksum_is_seeded_sum() {
    assert_eq!(cksum1(6, &[]), 6);
    assert_eq!(cksum1(6, &[0x10, 0x22, 0x10, 0x0B]), 0x53);
    // FHT uses the same sum with a different seed
    assert_eq!(cksum1(12, &[0x10, 0x22, 0x10, 0x0B]), 0x59);
    // modular, not saturating
    assert_eq!(cksum1(0, &[0xFF, 0x02]), 0x01);
}

#[test]
fn em_checksum_is_xor() {
    assert_eq!(cksum2(&[]), 0);
    assert_eq!(cksum2(&[0xAA, 0x55]), 0xFF);
    assert_eq!(cksum2(&[0x12, 0x34, 0x12, 0x34]), 0);
}

#[test]
fn ks300_checksum_known_value() {
    // x = nibble XOR, y = 5 + nibble sum + x, result (y<<4)|x.
    // For [0x12, 0x34]: x = 1^2^3^4 = 4, y = 5+1+2+3+4+4 = 19 = 0x13.
    assert_eq!(cksum3(&[0x12, 0x34], false), 0x34);
}

#[test]
fn ks300_nibble_flag_skips_low_half_of_last_byte() {
    let with = cksum3(&[0x12, 0x3F], true);
    let without = cksum3(&[0x12, 0x30], true);
    // the low nibble of the final byte does not participate
    assert_eq!(with, without);
    assert_ne!(cksum3(&[0x12, 0x3F], false), with);
}

#[test]
fn ks300_self_consistent_frame() {
    // The payload used by the end-to-end decode test.
    let obuf = [0x81, 0x12, 0x34, 0x05, 0xB3];
    assert_eq!(cksum3(&obuf, true), obuf[4]);
}
