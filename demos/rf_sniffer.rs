#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::Pull;
use panic_probe as _;
use slowrf::shared_constants::REP_KNOWN;
use slowrf::{Capabilities, Receiver, Rf, RfNotifier};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    info!("sub-GHz sniffer starting...");

    // Create the notifier channel
    static NOTIFIER: RfNotifier = Rf::notifier();

    // The radio chip's data slicer output is wired to GP15
    let receiver = Receiver::new(Capabilities::default(), REP_KNOWN);
    let rf = Rf::new(p.PIN_15, Pull::None, receiver, &NOTIFIER, spawner)
        .expect("Failed to start the receive task");

    info!("receiver listening on GP15");

    // Main loop: print every accepted frame
    loop {
        let line = rf.next_line().await;
        if let Ok(text) = core::str::from_utf8(&line) {
            info!("rx: {}", text);
        }
    }
}
