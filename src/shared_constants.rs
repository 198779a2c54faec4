//! Timing windows, report flags and protocol constants shared across the receive path.

/// Scales a microsecond count into the 8-bit comparison domain.
pub const fn tscale(us: u16) -> u16 {
    us / 16
}

/// Tolerated difference to the previous/averaged high/low/total time.
pub const TDIFF: i16 = tscale(200) as i16;
/// Widened tolerance used while collecting Intertechno V1 frames.
pub const TDIFFIT: i16 = tscale(350) as i16;

/// End-of-message gap in µs of the free-running timer.
pub const SILENCE: u16 = 4000;
/// TCM 97001 frames pause just longer than the default gap.
pub const SILENCE_TCM97001: u16 = 4600;
/// ESA meters pause only briefly between bit groups.
pub const SILENCE_ESA: u16 = 1000;

/// Capacity of one bucket's raw bit buffer, sized for the longest frame (Gira ESA).
pub const MAXMSG: usize = 24;
/// Number of buckets in the receive ring; one is always kept free for the producer.
pub const RCV_BUCKETS: usize = 4;

/// Two frames closer together than this many 125 Hz ticks count as one transmission (≈0.3 s).
pub const REPTIME: u32 = 38;

// Bits of the `tx_report` configuration byte.
pub const REP_KNOWN: u8 = 0x01;
pub const REP_REPEATED: u8 = 0x02;
pub const REP_BITS: u8 = 0x04;
pub const REP_MONITOR: u8 = 0x08;
pub const REP_BINTIME: u8 = 0x10;
pub const REP_RSSI: u8 = 0x20;
pub const REP_FHTPROTO: u8 = 0x40;
pub const REP_LCDMON: u8 = 0x80;

// FHT command bytes that the sender repeats on its own; see the repeat filter.
pub const FHT_ACK: u8 = 0x4B;
pub const FHT_CAN_XMIT: u8 = 0x53;
pub const FHT_CAN_RCV: u8 = 0x54;
pub const FHT_ACK2: u8 = 0x69;
pub const FHT_START_XMIT: u8 = 0x7D;
pub const FHT_END_XMIT: u8 = 0x7E;
