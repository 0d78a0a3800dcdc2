//! Keylink - Matrix Keypad to SPI Command Bridge for RP2040
//!
//! This library scans a 3x4 matrix keypad, translates every press into a
//! 16-bit command word and shifts it out of a synchronous serial port, using
//! the Embassy async framework.
//!
//! ## Pipeline
//! - **Scanner**: debounced keypad scan, one key event per press
//! - **Translator**: key code to command word through a fixed table
//! - **Transmitter**: blocking 16-bit transfer per command
//!
//! Stages are connected by bounded queues with a guard lock around every
//! enqueue and dequeue. A full queue or a contended guard drops the item.
//!
//! ## Building
//! - Host tests: `cargo test`
//! - Firmware: `cargo build --release --features rp2040 --target thumbv6m-none-eabi`

#![no_std]

// Use std when running tests on the host
#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
mod fmt;

pub mod channels;
pub mod config;
pub mod keypad;
pub mod supervisor;
pub mod translator;
pub mod transmitter;
pub mod types;

#[cfg(feature = "rp2040")]
pub mod hardware;

pub use channels::{GuardedQueue, KeyQueue, LockWait, PublishError, TransferQueue};
pub use config::{ConfigError, PipelineConfig, SerialConfig};
pub use keypad::{KeypadGpio, MatrixPins, Scanner};
pub use supervisor::AppSupervisor;
pub use translator::{translate, Translator};
pub use transmitter::{SerialPeripheral, Transmitter};
pub use types::{Column, CommandCode, KeyEvent, ScanState};
