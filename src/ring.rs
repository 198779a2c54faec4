//! Lock-free SPSC ring of receive buckets.
//!
//! The edge producer owns the `in` cursor and fills the bucket it points at;
//! the analyze consumer owns the `out` cursor. The used-count is the only
//! shared word. Each side updates its own cursor before touching the count,
//! and the count is a single atomic byte, so no lock is needed on the hot
//! path even when the two sides run in different execution contexts.

use portable_atomic::{AtomicU8, Ordering};

use crate::bucket::{Bucket, BucketState};
use crate::shared_constants::RCV_BUCKETS;

pub struct BucketRing {
    buckets: [Bucket; RCV_BUCKETS],
    inp: u8,
    outp: u8,
    nr_used: AtomicU8,
}

impl BucketRing {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: [Bucket::new(); RCV_BUCKETS],
            inp: 0,
            outp: 0,
            nr_used: AtomicU8::new(0),
        }
    }

    /// Number of committed, not yet consumed buckets.
    #[must_use]
    pub fn used(&self) -> u8 {
        self.nr_used.load(Ordering::Acquire)
    }

    /// The bucket the producer is currently filling.
    pub fn producer(&mut self) -> &mut Bucket {
        &mut self.buckets[self.inp as usize]
    }

    #[must_use]
    pub fn producer_state(&self) -> BucketState {
        self.buckets[self.inp as usize].state
    }

    /// Commits the producer bucket. Returns `false` when every other bucket
    /// is still waiting for the consumer; the caller then recycles the
    /// current bucket in place.
    #[must_use]
    pub fn commit(&mut self) -> bool {
        if self.nr_used.load(Ordering::Relaxed) + 1 == RCV_BUCKETS as u8 {
            return false;
        }
        self.inp += 1;
        if self.inp as usize == RCV_BUCKETS {
            self.inp = 0;
        }
        self.nr_used.fetch_add(1, Ordering::Release);
        true
    }

    /// The oldest committed bucket. Call only while [`used`](Self::used) is
    /// nonzero.
    pub fn consumer(&mut self) -> &mut Bucket {
        &mut self.buckets[self.outp as usize]
    }

    /// Releases the consumer bucket back to the producer side. The state goes
    /// to `Reset` before the cursor moves, so the producer never sees a
    /// half-released bucket.
    pub fn release(&mut self) {
        self.buckets[self.outp as usize].state = BucketState::Reset;
        self.outp += 1;
        if self.outp as usize == RCV_BUCKETS {
            self.outp = 0;
        }
        self.nr_used.fetch_sub(1, Ordering::Release);
    }
}

impl Default for BucketRing {
    fn default() -> Self {
        Self::new()
    }
}
