//! Host-level tests for the bit cursor and the SPSC bucket ring.
#![cfg(feature = "host")]

use slowrf::bucket::{Bucket, BucketState};
use slowrf::ring::BucketRing;
use slowrf::shared_constants::{MAXMSG, RCV_BUCKETS};

#[test]
fn bits_fill_msb_first() {
    let mut b = Bucket::new();
    b.rewind();
    for bit in [true, false, true, true] {
        assert!(b.add_bit(bit));
    }
    assert_eq!(b.data[0], 0b1011_0000);
    assert_eq!(b.byteidx, 0);
    assert_eq!(b.bitidx, 3);
    assert_eq!(b.bit_count(), 4);
}

#[test]
fn byte_wrap_pre_clears_the_next_byte() {
    let mut b = Bucket::new();
    b.rewind();
    b.data[1] = 0xFF; // stale from an earlier frame
    for _ in 0..8 {
        assert!(b.add_bit(true));
    }
    assert_eq!(b.data[0], 0xFF);
    assert_eq!(b.data[1], 0);
    assert_eq!(b.byteidx, 1);
    assert_eq!(b.bitidx, 7);
}

#[test]
fn del_bit_undoes_add_bit_across_byte_boundary() {
    let mut b = Bucket::new();
    b.rewind();
    for _ in 0..9 {
        assert!(b.add_bit(true));
    }
    assert_eq!((b.byteidx, b.bitidx), (1, 6));
    b.del_bit();
    assert_eq!((b.byteidx, b.bitidx), (1, 7));
    b.del_bit();
    assert_eq!((b.byteidx, b.bitidx), (0, 0));
}

#[test]
fn add_bit_reports_overflow() {
    let mut b = Bucket::new();
    b.rewind();
    for _ in 0..MAXMSG * 8 {
        assert!(b.add_bit(false));
    }
    assert!(!b.add_bit(false));
}

#[test]
fn ring_keeps_one_bucket_for_the_producer() {
    let mut ring = BucketRing::new();
    for _ in 0..RCV_BUCKETS - 1 {
        ring.producer().state = BucketState::Collect;
        assert!(ring.commit());
    }
    assert_eq!(ring.used() as usize, RCV_BUCKETS - 1);
    // every other bucket is waiting: the commit must be refused
    ring.producer().state = BucketState::Collect;
    assert!(!ring.commit());
    assert_eq!(ring.used() as usize, RCV_BUCKETS - 1);
}

#[test]
fn release_resets_state_before_reuse() {
    let mut ring = BucketRing::new();
    ring.producer().state = BucketState::Collect;
    ring.producer().data[0] = 0xAB;
    assert!(ring.commit());
    assert_eq!(ring.used(), 1);
    assert_eq!(ring.consumer().state, BucketState::Collect);
    assert_eq!(ring.consumer().data[0], 0xAB);
    ring.release();
    assert_eq!(ring.used(), 0);
}

#[test]
fn ring_delivers_in_commit_order() {
    let mut ring = BucketRing::new();
    for tag in 1..=2u8 {
        let b = ring.producer();
        b.state = BucketState::Collect;
        b.data[0] = tag;
        assert!(ring.commit());
    }
    assert_eq!(ring.consumer().data[0], 1);
    ring.release();
    assert_eq!(ring.consumer().data[0], 2);
    ring.release();
}
