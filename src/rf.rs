//! A device abstraction for the sub-GHz receive path.
//!
//! See [`Rf`] for usage examples.

use defmt::info;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{AnyPin, Input, Pin, Pull};
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel as EmbassyChannel;
use embassy_time::{Instant, Timer};
use heapless::Vec;

use crate::receiver::{Frame, Receiver};
use crate::{Error, FrameType, Result};

// ===== Public API ===========================================================

/// Longest report line the notifier carries, CRLF stripped.
pub const LINE_MAX: usize = 64;

/// One emitted report line: the type character followed by hex digits.
pub type Line = Vec<u8, LINE_MAX>;

/// Static channel type for report lines.
///
/// See [`Rf`] for usage examples.
pub type RfNotifier = EmbassyChannel<CriticalSectionRawMutex, Line, 8>;

/// Static channel type for frames forwarded to the FHT session collaborator.
pub type FhtNotifier = EmbassyChannel<CriticalSectionRawMutex, Frame, 4>;

/// A device abstraction for the radio chip's data slicer output: demodulates
/// pulse-width coded frames from one GPIO pin and delivers finished report
/// lines through a notifier channel.
///
/// # Examples
/// ```no_run
/// # #![no_std]
/// # #![no_main]
/// # use panic_probe as _;
/// # use defmt::info;
/// # use embassy_executor::Spawner;
/// # use embassy_rp::gpio::Pull;
/// # use slowrf::{Capabilities, Receiver, Rf};
/// # use slowrf::shared_constants::REP_KNOWN;
/// # async fn example(p: embassy_rp::Peripherals, spawner: Spawner) -> slowrf::Result<()> {
/// static NOTIFIER: slowrf::RfNotifier = Rf::notifier();
/// let receiver = Receiver::new(Capabilities::default(), REP_KNOWN);
/// let rf = Rf::new(p.PIN_15, Pull::None, receiver, &NOTIFIER, spawner)?;
///
/// loop {
///     let line = rf.next_line().await;
///     if let Ok(text) = core::str::from_utf8(&line) {
///         info!("rx: {}", text);
///     }
/// }
/// # }
/// ```
pub struct Rf<'a> {
    notifier: &'a RfNotifier,
}

impl Rf<'_> {
    /// Create static channel resources for report lines.
    #[must_use]
    pub const fn notifier() -> RfNotifier {
        EmbassyChannel::new()
    }

    /// Create static channel resources for forwarded FHT frames.
    #[must_use]
    pub const fn fht_notifier() -> FhtNotifier {
        EmbassyChannel::new()
    }

    /// Starts reception on the given pin.
    ///
    /// # Errors
    /// Returns an error if the background task cannot be spawned.
    pub fn new<P: Pin>(
        pin: Peri<'static, P>,
        pull: Pull,
        receiver: Receiver,
        notifier: &'static RfNotifier,
        spawner: Spawner,
    ) -> Result<Self> {
        Self::with_fht(pin, pull, receiver, notifier, None, spawner)
    }

    /// Like [`new`](Self::new), but additionally forwards accepted FHT
    /// frames to the session collaborator's channel.
    ///
    /// # Errors
    /// Returns an error if the background task cannot be spawned.
    pub fn with_fht<P: Pin>(
        pin: Peri<'static, P>,
        pull: Pull,
        receiver: Receiver,
        notifier: &'static RfNotifier,
        fht: Option<&'static FhtNotifier>,
        spawner: Spawner,
    ) -> Result<Self> {
        // Type erase to Peri<'static, AnyPin> (keep the Peri wrapper!)
        let any: Peri<'static, AnyPin> = pin.into();
        spawner
            .spawn(rf_task(RfDevice::new(any, pull), receiver, notifier, fht))
            .map_err(Error::TaskSpawn)?;
        Ok(Self { notifier })
    }

    /// Waits for the next emitted report line.
    pub async fn next_line(&self) -> Line {
        self.notifier.receive().await
    }
}

// ===== Concrete device passed to the task (non-generic) =====================

struct RfDevice {
    pin: Input<'static>,
}

impl RfDevice {
    fn new(pin: Peri<'static, AnyPin>, pull: Pull) -> Self {
        let pin = Input::new(pin, pull);
        Self { pin }
    }
}

// ===== The non-generic task =================================================

/// The 16-bit free-running microsecond counter the demodulator compares
/// against.
fn counter_now() -> u16 {
    (Instant::now().as_micros() & 0xFFFF) as u16
}

/// 125 Hz tick counter for repeat timing.
fn ticks_now() -> u32 {
    (Instant::now().as_millis() / 8) as u32
}

#[embassy_executor::task]
async fn rf_task(
    mut device: RfDevice,
    mut receiver: Receiver,
    notifier: &'static RfNotifier,
    fht: Option<&'static FhtNotifier>,
) -> ! {
    // Emitted bytes collect here until a full line can be posted.
    let mut outbuf: Vec<u8, 256> = Vec::new();

    info!("sub-GHz receive task started");
    loop {
        match receiver.silence_deadline(counter_now()) {
            Some(us) => {
                match select(
                    device.pin.wait_for_any_edge(),
                    Timer::after_micros(u64::from(us)),
                )
                .await
                {
                    Either::First(()) => {
                        let falling = device.pin.is_low();
                        receiver.edge(falling, counter_now());
                    }
                    Either::Second(()) => receiver.silence_timeout(&mut outbuf),
                }
            }
            None => {
                device.pin.wait_for_any_edge().await;
                let falling = device.pin.is_low();
                receiver.edge(falling, counter_now());
            }
        }

        let frame = receiver.rf_analyze(&mut outbuf, &mut (), ticks_now());
        if let (Some(frame), Some(fht)) = (frame, fht) {
            if frame.frame_type == FrameType::Fht {
                let _ = fht.try_send(frame);
            }
        }
        if receiver.take_router_sync() {
            // The RF-router collaborator takes over raw reception here.
            info!("rf-router sync received");
        }

        flush_lines(&mut outbuf, notifier);
    }
}

/// Posts every finished line in `buf` to the notifier, dropping lines when
/// the consumer lags; the receive path never waits.
fn flush_lines(buf: &mut Vec<u8, 256>, notifier: &RfNotifier) {
    while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        let mut line = Line::new();
        for &byte in &buf[..pos] {
            if byte != b'\r' {
                let _ = line.push(byte);
            }
        }
        let rest: Vec<u8, 256> = Vec::from_slice(&buf[pos + 1..]).unwrap_or_default();
        *buf = rest;
        let _ = notifier.try_send(line);
    }
}
