//! The receive core: edge-event demodulator, silence commit and the polled
//! analyze/classify task around the bucket ring.
//!
//! Two entry points mirror the two interrupt sources of the radio front end.
//! [`Receiver::edge`] runs on every transition of the data line with the
//! current value of a free-running 16-bit microsecond counter;
//! [`Receiver::silence_timeout`] runs when that counter passes the armed
//! compare value without further edges. Both are constant-time and never
//! block. [`Receiver::rf_analyze`] is the consumer half, polled from task
//! context; it drains one committed bucket per call, runs the analyzers in
//! fixed order, filters repeats and renders the accepted frame as a typed
//! hex line on the byte sink.

use crate::bucket::{Bucket, BucketState};
use crate::capabilities::Capabilities;
use crate::classify::{self, FrameType, Output};
use crate::repeat::RepeatFilter;
use crate::ring::BucketRing;
use crate::shared_constants::{
    tscale, MAXMSG, REP_BINTIME, REP_BITS, REP_KNOWN, REP_LCDMON, REP_MONITOR, REP_RSSI,
    SILENCE, SILENCE_ESA, SILENCE_TCM97001,
};
use crate::sink::{self, ByteSink, RssiSource};
use crate::wave::{self, make_avg, Wave};

/// An accepted frame, as handed to protocol collaborators such as the FHT
/// session logic.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    pub frame_type: FrameType,
    payload: [u8; MAXMSG],
    len: u8,
    pub nibble: bool,
}

impl Frame {
    /// The parity/checksum-stripped payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }
}

pub struct Receiver {
    ring: BucketRing,
    caps: Capabilities,
    tx_report: u8,
    // Producer-side capture scratch.
    hightime: u16,
    lowtime: u16,
    timer_origin: u16,
    silence: u16,
    timeout_armed: bool,
    router_sync: bool,
    // Consumer-side scratch.
    out: Output,
    repeat: RepeatFilter,
}

impl Receiver {
    #[must_use]
    pub fn new(caps: Capabilities, tx_report: u8) -> Self {
        Self {
            ring: BucketRing::new(),
            caps,
            tx_report,
            hightime: 0,
            lowtime: 0,
            timer_origin: 0,
            silence: SILENCE,
            timeout_armed: false,
            router_sync: false,
            out: Output::new(),
            repeat: RepeatFilter::new(),
        }
    }

    #[must_use]
    pub const fn tx_report(&self) -> u8 {
        self.tx_report
    }

    /// Updates the report flags and restarts reception: the producer bucket
    /// is forced back to reset and the two-of-two latch is cleared.
    pub fn set_tx_report(&mut self, report: u8) {
        self.tx_report = report;
        self.reset_input();
    }

    /// True while the producer bucket holds a partial frame. The transmit
    /// path defers while this is set.
    #[must_use]
    pub fn is_receiving(&self) -> bool {
        self.ring.producer_state() != BucketState::Reset
    }

    /// Committed buckets waiting for [`rf_analyze`](Self::rf_analyze).
    #[must_use]
    pub fn pending(&self) -> u8 {
        self.ring.used()
    }

    /// Drops whatever the producer bucket holds and disarms the silence
    /// timeout.
    pub fn reset_input(&mut self) {
        self.timeout_armed = false;
        self.ring.producer().state = BucketState::Reset;
        if self.caps.it || self.caps.tcm97001 {
            self.repeat.reset_latch();
        }
    }

    /// Takes the RF-router handoff latch, set when a router sync preamble
    /// was recognized.
    pub fn take_router_sync(&mut self) -> bool {
        core::mem::replace(&mut self.router_sync, false)
    }

    /// Microseconds until the armed silence timeout would fire, measured
    /// against the same counter the edge handler sees, or `None` while the
    /// timeout is disarmed.
    #[must_use]
    pub fn silence_deadline(&self, counter: u16) -> Option<u16> {
        if !self.timeout_armed {
            return None;
        }
        let elapsed = counter.wrapping_sub(self.timer_origin);
        Some(self.silence.saturating_sub(elapsed))
    }

    /// Handles one edge of the data line. `falling` is the direction of the
    /// edge (the line is low afterwards); `counter` is the free-running
    /// 16-bit microsecond counter sampled in the handler.
    pub fn edge(&mut self, falling: bool, counter: u16) {
        let Self {
            ring,
            caps,
            repeat,
            hightime,
            lowtime,
            timer_origin,
            silence,
            timeout_armed,
            router_sync,
            ..
        } = self;
        let c = counter.wrapping_sub(*timer_origin) >> 4;
        let b = ring.producer();

        // Manchester states only accept edges at full-bit spacing: earlier
        // transitions are mid-bit, later ones mean the frame broke off.
        if b.state == BucketState::Hms {
            if c < tscale(750) {
                return;
            }
            if c > tscale(1250) {
                reset_bucket(b, timeout_armed, caps, repeat);
                return;
            }
        }
        if caps.esa.is_some() && b.state == BucketState::Esa {
            if c < tscale(375) {
                return;
            }
            if c > tscale(625) {
                reset_bucket(b, timeout_armed, caps, repeat);
                return;
            }
        }

        if falling {
            if b.state == BucketState::Hms
                || (caps.esa.is_some() && b.state == BucketState::Esa)
            {
                if !b.add_bit(true) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                *timer_origin = counter;
            }
            *hightime = c;
            return;
        }

        *lowtime = c.wrapping_sub(*hightime);
        *timer_origin = counter;

        if caps.it && (b.state == BucketState::It || b.state == BucketState::ItV3) {
            if *lowtime > tscale(3000) {
                b.sync = 0;
                return;
            }
            if b.sync == 0 {
                if *lowtime > tscale(2400) {
                    // start bit of an Intertechno V3 frame
                    b.state = BucketState::ItV3;
                    *timer_origin = counter;
                    return;
                } else if b.state == BucketState::ItV3 {
                    b.sync = 1;
                    if lowtime.wrapping_sub(1) > *hightime {
                        b.zero = Wave::new(*hightime as u8, *lowtime as u8);
                    } else {
                        b.zero = Wave::new(*hightime as u8, hightime.wrapping_mul(5) as u8);
                    }
                    b.one = Wave::new(*hightime as u8, *hightime as u8);
                } else {
                    b.sync = 1;
                    if *hightime * 2 > *lowtime {
                        // no IT, the times are too close
                        b.state = BucketState::Reset;
                        return;
                    }
                    b.zero = Wave::new(*hightime as u8, lowtime.wrapping_add(1) as u8);
                    b.one = Wave::new(lowtime.wrapping_add(1) as u8, *hightime as u8);
                }
            }
        }

        if caps.tcm97001 && b.state == BucketState::Tcm97001 && b.sync == 0 {
            b.sync = 1;
            b.zero.hightime = *hightime as u8;
            b.one.hightime = *hightime as u8;
            b.zero.lowtime = *lowtime as u8;
            b.one.lowtime = if *lowtime < 187 {
                b.zero.lowtime.wrapping_mul(2)
            } else {
                b.zero.lowtime / 2
            };
        }

        if b.state == BucketState::Hms || (caps.esa.is_some() && b.state == BucketState::Esa) {
            if !b.add_bit(false) {
                reset_bucket(b, timeout_armed, caps, repeat);
            }
            return;
        }

        if caps.revolt
            && *hightime > tscale(9000)
            && *hightime < tscale(12000)
            && *lowtime > tscale(150)
            && *lowtime < tscale(540)
        {
            b.zero = Wave::new(6, 14);
            b.one = Wave::new(19, 14);
            b.sync = 1;
            b.state = BucketState::Revolt;
            b.rewind();
            *silence = SILENCE;
            *timeout_armed = true;
            return;
        }

        if b.state == BucketState::Reset {
            start_sync(b, caps, *hightime, *lowtime, silence, timeout_armed);
        } else if b.state == BucketState::Sync {
            if wave::wave_equals(&b.zero, *hightime as u8, *lowtime as u8, b.state) {
                b.zero.hightime = make_avg(b.zero.hightime, *hightime as u8);
                b.zero.lowtime = make_avg(b.zero.lowtime, *lowtime as u8);
                b.sync = b.sync.wrapping_add(1);
            } else if b.sync >= 4 {
                // the one bit at the end of the 0-sync
                *silence = SILENCE;
                if b.sync >= 12
                    && u16::from(b.zero.hightime) + u16::from(b.zero.lowtime) > tscale(1600)
                {
                    b.state = BucketState::Hms;
                } else if caps.esa.is_some()
                    && b.sync >= 10
                    && u16::from(b.zero.hightime) + u16::from(b.zero.lowtime) < tscale(600)
                {
                    b.state = BucketState::Esa;
                    *silence = SILENCE_ESA;
                } else if caps.rf_router_id != 0
                    && wave::check_rf_sync(*hightime as u8, *lowtime as u8)
                    && wave::check_rf_sync(b.zero.lowtime, b.zero.hightime)
                {
                    *router_sync = true;
                    reset_bucket(b, timeout_armed, caps, repeat);
                    return;
                } else {
                    b.state = BucketState::Collect;
                }
                b.one = Wave::new(*hightime as u8, *lowtime as u8);
                b.rewind();
                *timeout_armed = true;
            } else {
                // too few sync bits: rerun the sync detector on this pulse
                b.state = BucketState::Reset;
                start_sync(b, caps, *hightime, *lowtime, silence, timeout_armed);
            }
        } else if caps.revolt && b.state == BucketState::Revolt {
            if *hightime < 11 {
                if !b.add_bit(false) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                b.zero.hightime = make_avg(b.zero.hightime, *hightime as u8);
                b.zero.lowtime = make_avg(b.zero.lowtime, *lowtime as u8);
            } else {
                if !b.add_bit(true) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                b.one.hightime = make_avg(b.one.hightime, *hightime as u8);
                b.one.lowtime = make_avg(b.one.lowtime, *lowtime as u8);
            }
        } else if caps.tcm97001 && b.state == BucketState::Tcm97001 {
            if *lowtime > 110 && *lowtime < 140 {
                if !b.add_bit(false) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                b.zero.hightime = make_avg(b.zero.hightime, *hightime as u8);
                b.zero.lowtime = make_avg(b.zero.lowtime, *lowtime as u8);
            } else if *lowtime > 230 && *lowtime < 270 {
                if !b.add_bit(true) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                b.one.hightime = make_avg(b.one.hightime, *hightime as u8);
                b.one.lowtime = make_avg(b.one.lowtime, *lowtime as u8);
            }
        } else if caps.it && b.state == BucketState::ItV3 {
            let value = wave::wave_equals_itv3(*hightime as u8, *lowtime as u8);
            if !b.add_bit(value) {
                reset_bucket(b, timeout_armed, caps, repeat);
            }
        } else {
            // Collect / It
            if wave::wave_equals(&b.one, *hightime as u8, *lowtime as u8, b.state) {
                if !b.add_bit(true) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                b.one.hightime = make_avg(b.one.hightime, *hightime as u8);
                b.one.lowtime = make_avg(b.one.lowtime, *lowtime as u8);
            } else if wave::wave_equals(&b.zero, *hightime as u8, *lowtime as u8, b.state) {
                if !b.add_bit(false) {
                    reset_bucket(b, timeout_armed, caps, repeat);
                }
                b.zero.hightime = make_avg(b.zero.hightime, *hightime as u8);
                b.zero.lowtime = make_avg(b.zero.lowtime, *lowtime as u8);
            } else if b.state != BucketState::It {
                reset_bucket(b, timeout_armed, caps, repeat);
            }
        }
    }

    /// Handles the silence compare match: no edge arrived for the armed
    /// interval, so the producer bucket is committed or discarded.
    pub fn silence_timeout(&mut self, sink: &mut impl ByteSink) {
        let Self {
            ring,
            caps,
            repeat,
            timeout_armed,
            tx_report,
            ..
        } = self;
        *timeout_armed = false;
        if *tx_report & REP_MONITOR != 0 {
            sink.write(b'.');
        }

        {
            let b = ring.producer();
            if b.state < BucketState::Collect || b.byteidx < 2 {
                // false alarm
                reset_bucket(b, timeout_armed, caps, repeat);
                return;
            }
        }

        if !ring.commit() {
            // each bucket is full: reuse the current one
            if *tx_report & REP_BITS != 0 {
                for &byte in b"BOVF\r\n" {
                    sink.write(byte);
                }
            }
            reset_bucket(ring.producer(), timeout_armed, caps, repeat);
        }
    }

    /// The polled consumer. Emits debug monitor output for the last captured
    /// wave, then drains at most one committed bucket: analyzers run in
    /// fixed order, the first match fixes the type, the repeat filter
    /// decides whether the hex line is written. Returns the accepted frame,
    /// if any, so callers can feed protocol collaborators.
    ///
    /// `ticks` is the monotonic 125 Hz tick counter used for repeat timing.
    pub fn rf_analyze<S: ByteSink, R: RssiSource>(
        &mut self,
        sink: &mut S,
        radio: &mut R,
        ticks: u32,
    ) -> Option<Frame> {
        let Self {
            ring,
            caps,
            repeat,
            tx_report,
            hightime,
            lowtime,
            out,
            ..
        } = self;

        if *lowtime != 0 {
            if *tx_report & REP_LCDMON != 0 {
                let rssi = radio.read_rssi();
                let rssi = if rssi >= 128 { rssi - 128 } else { rssi + 128 }; // swap
                let step = if rssi < 64 {
                    // drop low and high 25%
                    0
                } else if rssi >= 192 {
                    15
                } else {
                    (i16::from(rssi) - 80) >> 3
                };
                sink.write((i16::from(b'a') + step) as u8);
            }
            if *tx_report & REP_MONITOR != 0 {
                sink.write(b'r');
                if *tx_report & REP_BINTIME != 0 {
                    sink.write(*hightime as u8);
                }
                sink.write(b'f');
                if *tx_report & REP_BINTIME != 0 {
                    sink.write(*lowtime as u8);
                }
            }
            *lowtime = 0;
        }

        if ring.used() == 0 {
            return None;
        }

        let b = ring.consumer();
        out.reset();
        let mut datatype: Option<FrameType> = None;

        if caps.it && classify::analyze_it(b, out) {
            datatype = Some(FrameType::It);
        }
        if datatype.is_none() && caps.tcm97001 && classify::analyze_tcm97001(b, out) {
            datatype = Some(FrameType::Tcm97001);
        }
        if datatype.is_none() && caps.revolt && classify::analyze_revolt(b, out) {
            datatype = Some(FrameType::Revolt);
        }

        // The long-pulse states have their own exact-length analyzers above;
        // everything else walks the generic chain.
        if b.state != BucketState::Revolt
            && b.state != BucketState::It
            && b.state != BucketState::Tcm97001
        {
            if let Some(mode) = caps.esa {
                if datatype.is_none() && classify::analyze_esa(b, mode, out) {
                    datatype = Some(FrameType::Esa);
                }
            }

            if datatype.is_none() && classify::analyze(b, FrameType::Fs20, out) {
                // can be FS10 (433 MHz) or FS20 (868 MHz)
                out.oby -= 1; // separate the checksum byte
                let oby = out.oby as usize;
                let fs_csum = classify::cksum1(6, &out.obuf[..oby]);
                if fs_csum == out.obuf[oby] && oby >= 4 {
                    datatype = Some(FrameType::Fs20);
                } else if fs_csum.wrapping_add(1) == out.obuf[oby] && oby >= 4 {
                    // repeater: rewrite so we do not report both variants
                    datatype = Some(FrameType::Fs20);
                    out.obuf[oby] = fs_csum;
                } else if classify::cksum1(12, &out.obuf[..oby]) == out.obuf[oby] && oby >= 4 {
                    datatype = Some(FrameType::Fht);
                }
            }

            if datatype.is_none() && classify::analyze(b, FrameType::Em, out) {
                out.oby -= 1;
                let oby = out.oby as usize;
                if oby == 9 && classify::cksum2(&out.obuf[..oby]) == out.obuf[oby] {
                    datatype = Some(FrameType::Em);
                }
            }

            if datatype.is_none() && classify::analyze_hms(b, out) {
                datatype = Some(FrameType::Hms);
            }

            if caps.tx3 && datatype.is_none() && classify::analyze_tx3(b, out) {
                // can be 433 MHz or 868 MHz
                datatype = Some(FrameType::Tx3);
            }

            if datatype.is_none() {
                // There was no final rising edge, so project the last bit
                // from the hanging high pulse.
                let last = wave::wave_equals(&b.one, *hightime as u8, b.one.lowtime, b.state);
                if b.add_bit(last) {
                    if classify::analyze(b, FrameType::Ks300, out) {
                        out.oby -= 1;
                        let oby = out.oby as usize;
                        if classify::cksum3(&out.obuf[..oby], out.nibble)
                            == out.obuf[oby - out.nibble as usize]
                        {
                            datatype = Some(FrameType::Ks300);
                        }
                    }
                    if datatype.is_none() {
                        b.del_bit();
                    }
                }
            }

            if caps.hoermann
                && datatype.is_none()
                && b.byteidx == 4
                && b.bitidx == 4
                && wave::wave_equals(&b.zero, tscale(960) as u8, tscale(480) as u8, b.state)
            {
                // This coding is not fully understood; it must stay the last
                // candidate in the row.
                let _ = b.add_bit(wave::wave_equals(
                    &b.one,
                    *hightime as u8,
                    tscale(480) as u8,
                    b.state,
                ));
                out.obuf[..5].copy_from_slice(&b.data[..5]);
                out.oby = 5;
                out.nibble = false;
                datatype = Some(FrameType::Hoermann);
            }
        }

        if let Some(t) = datatype {
            if *tx_report & REP_KNOWN != 0 && repeat.evaluate(t, out, ticks, *tx_report) {
                sink.write(t.as_char());
                let mut oby = out.oby as usize;
                if out.nibble {
                    oby -= 1;
                }
                for &byte in &out.obuf[..oby] {
                    sink::out_hex2(sink, byte);
                }
                if out.nibble {
                    sink::out_hex_nibble(sink, out.obuf[oby]);
                }
                if *tx_report & REP_RSSI != 0 {
                    sink::out_hex2(sink, radio.read_rssi());
                }
                sink::out_nl(sink);
            }
        }

        if *tx_report & REP_BITS != 0 {
            sink.write(b'p');
            sink::out_dec(sink, u16::from(b.state as u8), 2);
            sink::out_dec(sink, u16::from(b.zero.hightime) * 16, 5);
            sink::out_dec(sink, u16::from(b.zero.lowtime) * 16, 5);
            sink::out_dec(sink, u16::from(b.one.hightime) * 16, 5);
            sink::out_dec(sink, u16::from(b.one.lowtime) * 16, 5);
            sink::out_dec(sink, u16::from(b.sync), 3);
            sink::out_dec(sink, u16::from(b.byteidx), 3);
            sink::out_dec(sink, u16::from(7 - b.bitidx), 2);
            sink.write(b' ');
            if *tx_report & REP_RSSI != 0 {
                sink::out_hex2(sink, radio.read_rssi());
                sink.write(b' ');
            }
            if b.bitidx != 7 {
                b.byteidx += 1;
            }
            for i in 0..b.byteidx as usize {
                sink::out_hex2(sink, b.data[i]);
            }
            sink::out_nl(sink);
        }

        ring.release();

        datatype.map(|t| Frame {
            frame_type: t,
            payload: out.obuf,
            len: out.oby,
            nibble: out.nibble,
        })
    }
}

/// Resets the producer bucket and disarms the timeout; the repeat filter's
/// latch opens again so the next two-of-two pair counts fresh.
fn reset_bucket(
    b: &mut Bucket,
    timeout_armed: &mut bool,
    caps: &Capabilities,
    repeat: &mut RepeatFilter,
) {
    *timeout_armed = false;
    b.state = BucketState::Reset;
    if caps.it || caps.tcm97001 {
        repeat.reset_latch();
    }
}

/// The sync detector's decision table for a bucket in reset, tested in
/// order: TCM 97001 preamble, Intertechno preamble, over-long reject, else
/// the pulse is the first zero of a generic sync train.
fn start_sync(
    b: &mut Bucket,
    caps: &Capabilities,
    hightime: u16,
    lowtime: u16,
    silence: &mut u16,
    timeout_armed: &mut bool,
) {
    if caps.tcm97001
        && hightime < tscale(530)
        && hightime > tscale(420)
        && lowtime < tscale(9000)
        && lowtime > tscale(8500)
    {
        *silence = SILENCE_TCM97001;
        *timeout_armed = true;
        b.sync = 0;
        b.state = BucketState::Tcm97001;
        b.rewind();
        return;
    }
    if caps.it
        && hightime < tscale(600)
        && hightime > tscale(140)
        && lowtime < tscale(17000)
        && lowtime > tscale(2500)
    {
        *silence = SILENCE;
        *timeout_armed = true;
        b.sync = 0;
        b.state = BucketState::It;
        b.rewind();
        return;
    }
    if hightime > tscale(1600) || lowtime > tscale(1600) {
        return;
    }
    b.zero = Wave::new(hightime as u8, lowtime as u8);
    b.sync = 1;
    b.state = BucketState::Sync;
}
