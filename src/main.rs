//! Keylink - Matrix Keypad to SPI Command Bridge
//!
//! This implements the firmware entry point for the RP2040 build.
//!
//! Hardware: Raspberry Pi Pico (RP2040)
//! Keypad: 3x4 matrix, columns on GPIO 2-4, rows on GPIO 6-9
//! Output: SPI0 (SCK GPIO 18, MOSI GPIO 19), one 16-bit word per key press

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use panic_halt as _;
use defmt_rtt as _; // global logger
use static_cell::StaticCell;

use keylink::hardware::{self, FirmwareKeyQueue, FirmwareTransferQueue};
use keylink::{AppSupervisor, PipelineConfig, SerialConfig};

// ===================================================================
// Pipeline Queues
// ===================================================================

static KEY_QUEUE: StaticCell<FirmwareKeyQueue> = StaticCell::new();
static TRANSFER_QUEUE: StaticCell<FirmwareTransferQueue> = StaticCell::new();

// ===================================================================
// Main Application Entry Point
// ===================================================================

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let pipeline = PipelineConfig::default();
    let serial = SerialConfig::default();
    let mut supervisor = AppSupervisor::new(pipeline, serial);
    supervisor.print_startup_banner();

    // Queues live for the whole program and are created before any task starts
    let keys: &'static FirmwareKeyQueue = KEY_QUEUE.init(FirmwareKeyQueue::new());
    let transfers: &'static FirmwareTransferQueue = TRANSFER_QUEUE.init(FirmwareTransferQueue::new());

    unwrap!(hardware::init_hardware_tasks(&spawner, p, keys, transfers, pipeline, serial));
    supervisor.print_init_success();

    supervisor.run(keys, transfers).await
}
