//! Suppression of immediate retransmissions.
//!
//! Senders in this band repeat every frame several times. A frame whose
//! payload matches the previous one within [`REPTIME`] ticks is a repeat.
//! Remote-control protocols without any in-band check (Intertechno,
//! TCM 97001) invert the rule: a frame counts only once it has been seen
//! twice, and the two-of-two latch keeps further copies quiet until the
//! channel is reset.

use crate::classify::{FrameType, Output};
use crate::shared_constants::{
    FHT_ACK, FHT_ACK2, FHT_CAN_RCV, FHT_CAN_XMIT, FHT_END_XMIT, FHT_START_XMIT, MAXMSG,
    REPTIME, REP_FHTPROTO, REP_REPEATED,
};

#[derive(Debug)]
pub struct RepeatFilter {
    roby: u8,
    robuf: [u8; MAXMSG],
    reptime: u32,
    isrep: bool,
    isnotrep: bool,
}

impl RepeatFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            roby: 0,
            robuf: [0; MAXMSG],
            reptime: 0,
            isrep: false,
            isnotrep: false,
        }
    }

    /// Clears the two-of-two latch. Called whenever receive restarts.
    pub fn reset_latch(&mut self) {
        self.isnotrep = false;
    }

    /// Judges one accepted frame. Returns whether it should be reported.
    pub fn evaluate(&mut self, t: FrameType, out: &Output, ticks: u32, tx_report: u8) -> bool {
        self.isrep = false;

        if tx_report & REP_REPEATED == 0 {
            let oby = out.oby as usize;
            if usize::from(self.roby) == oby {
                if self.robuf[..oby] == out.obuf[..oby] {
                    if ticks.wrapping_sub(self.reptime) < REPTIME {
                        self.isrep = true;
                    }
                } else {
                    self.isnotrep = false;
                }
            }

            self.robuf[..oby].copy_from_slice(&out.obuf[..oby]);
            self.roby = out.oby;
            self.reptime = ticks;
        }

        // The FHT sender acknowledges on its own schedule; treat those
        // control frames as repeats unless the raw protocol is wanted.
        if t == FrameType::Fht
            && tx_report & REP_FHTPROTO == 0
            && out.oby > 4
            && (matches!(
                out.obuf[2],
                FHT_ACK | FHT_ACK2 | FHT_CAN_XMIT | FHT_CAN_RCV | FHT_START_XMIT | FHT_END_XMIT
            ) || (out.obuf[3] & 0x70) == 0x70)
        {
            self.isrep = true;
        }

        self.check_two_of_two(t)
    }

    fn check_two_of_two(&mut self, t: FrameType) -> bool {
        if t == FrameType::It || t == FrameType::Tcm97001 {
            if self.isrep && !self.isnotrep {
                self.isnotrep = true;
                true
            } else {
                false
            }
        } else {
            !self.isrep
        }
    }
}

impl Default for RepeatFilter {
    fn default() -> Self {
        Self::new()
    }
}
