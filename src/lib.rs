//! Receive-side demodulator and protocol classifier for sub-GHz pulse-width
//! home-automation protocols, for Pico 1 and 2.
//!
//! The core ([`Receiver`]) is pure logic driven by data-line edges and a
//! microsecond counter; it builds and tests everywhere, including on the
//! host. The [`rf`] module wraps it into an embassy device abstraction that
//! owns the GPIO pin and the silence deadline.
#![cfg_attr(not(feature = "host"), no_std)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Compile-time checks: exactly one architecture must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "arm", feature = "riscv")), not(feature = "host")))]
compile_error!("Must enable exactly one architecture feature: 'arm' or 'riscv'");

#[cfg(all(feature = "arm", feature = "riscv"))]
compile_error!("Cannot enable both 'arm' and 'riscv' features simultaneously");

// Compile-time check: pico1 only supports ARM
#[cfg(all(feature = "pico1", feature = "riscv"))]
compile_error!("Pico 1 (RP2040) only supports ARM architecture, not RISC-V");

pub mod bucket;
pub mod capabilities;
pub mod classify;
#[cfg(not(feature = "host"))]
mod error;
pub mod receiver;
pub mod repeat;
pub mod ring;
#[cfg(not(feature = "host"))]
pub mod rf;
pub mod shared_constants;
pub mod sink;
pub mod wave;

pub use capabilities::{Capabilities, EsaMode};
pub use classify::FrameType;
pub use receiver::{Frame, Receiver};
#[cfg(not(feature = "host"))]
pub use rf::{FhtNotifier, Line, Rf, RfNotifier};
pub use sink::{ByteSink, RssiSource};
pub use wave::Wave;

// Re-export error types and result (used throughout)
#[cfg(not(feature = "host"))]
pub use error::{Error, Result};

#[cfg(feature = "host")]
pub type Error = core::convert::Infallible;
#[cfg(feature = "host")]
pub type Result<T, E = Error> = core::result::Result<T, E>;
