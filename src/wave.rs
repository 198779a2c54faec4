//! Pulse pairs and the tolerance comparators used to judge them equal.

use crate::bucket::BucketState;
use crate::shared_constants::{TDIFF, TDIFFIT};

/// One (high, low) pulse pair in the scaled time domain.
///
/// Reference waves stay 8-bit even on targets that capture 16-bit pulse
/// widths; assignments from captured times truncate, matching the narrow
/// comparison domain everywhere a reference is consulted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Wave {
    pub hightime: u8,
    pub lowtime: u8,
}

impl Wave {
    #[must_use]
    pub const fn new(hightime: u8, lowtime: u8) -> Self {
        Self { hightime, lowtime }
    }
}

/// True iff the captured pair matches the reference within tolerance on the
/// high time, the low time and their sum.
///
/// The subtractions can exceed half the 8-bit range, so the arithmetic is
/// done in a signed 16-bit domain.
#[must_use]
pub fn wave_equals(a: &Wave, htime: u8, ltime: u8, state: BucketState) -> bool {
    let tdiff = if state == BucketState::It {
        TDIFFIT
    } else {
        TDIFF
    };
    let dlow = i16::from(a.lowtime) - i16::from(ltime);
    let dhigh = i16::from(a.hightime) - i16::from(htime);
    let dcomplete =
        (i16::from(a.lowtime) + i16::from(a.hightime)) - (i16::from(ltime) + i16::from(htime));
    dlow < tdiff
        && dlow > -tdiff
        && dhigh < tdiff
        && dhigh > -tdiff
        && dcomplete < tdiff
        && dcomplete > -tdiff
}

/// Intertechno V3 encodes the bit in the low/high ratio alone.
#[must_use]
pub fn wave_equals_itv3(htime: u8, ltime: u8) -> bool {
    i16::from(ltime) - TDIFF > i16::from(htime)
}

/// Running average weighted 3:1 in favor of the prior value.
#[must_use]
pub fn make_avg(prev: u8, cur: u8) -> u8 {
    ((u16::from(prev) * 3 + u16::from(cur)) / 4) as u8
}

/// Validity check for the RF-router's 768:384 µs sync pulse. Without PA
/// ramping some transmitters produce values 20% out, hence the wide bounds.
#[must_use]
pub fn check_rf_sync(long: u8, short: u8) -> bool {
    long >= 0x25 && long <= 0x3B && short >= 0x0A && short <= 0x26 && long > short
}
