//! Application supervisor and monitoring
//!
//! This module provides the startup banner and a periodic status line with
//! uptime and the depth of both pipeline queues.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

use crate::channels::{KeyQueue, TransferQueue};
use crate::config::{self, PipelineConfig, SerialConfig};
use crate::types::APP_VERSION;

const WAKE_INTERVAL_SECS: u32 = 10;

/// Application supervisor responsible for monitoring
pub struct AppSupervisor {
    pipeline: PipelineConfig,
    serial: SerialConfig,
    status_interval: u32,
    uptime_seconds: u32,
    last_status: u32,
}

impl AppSupervisor {
    /// Create a new application supervisor
    pub fn new(pipeline: PipelineConfig, serial: SerialConfig) -> Self {
        Self {
            pipeline,
            serial,
            status_interval: config::STATUS_INTERVAL_SECS,
            uptime_seconds: 0,
            last_status: 0,
        }
    }

    /// Print application startup banner with pipeline information
    pub fn print_startup_banner(&self) {
        info!("========================================");
        info!(
            "Keylink v{}.{}.{}",
            APP_VERSION.major,
            APP_VERSION.minor,
            APP_VERSION.patch
        );
        info!("Keypad to SPI command bridge");
        info!("========================================");
        info!("Hardware: RP2040 (Raspberry Pi Pico)");
        info!(
            "Keypad: {}x{} matrix, scan every {} ms",
            config::KEYPAD_COLS,
            config::KEYPAD_ROWS,
            self.pipeline.scan_tick.as_millis()
        );
        info!("Queues: {} entries each", config::QUEUE_CAPACITY);
        info!(
            "SPI: {}-bit frames, prescale {}, rate {}",
            self.serial.data_bits,
            self.serial.prescale,
            self.serial.clock_rate
        );
        info!("========================================");
    }

    /// Print successful initialization message
    pub fn print_init_success(&self) {
        info!("Keylink initialized successfully");
        info!("Waiting for key presses...");
    }

    /// Account for `seconds` of uptime; true when a status line is due
    pub fn advance(&mut self, seconds: u32) -> bool {
        self.uptime_seconds = self.uptime_seconds.saturating_add(seconds);
        if self.uptime_seconds - self.last_status >= self.status_interval {
            self.last_status = self.uptime_seconds;
            true
        } else {
            false
        }
    }

    /// Run the main supervisor loop
    pub async fn run<M: RawMutex>(&mut self, keys: &KeyQueue<M>, transfers: &TransferQueue<M>) -> ! {
        info!("Application supervisor started");

        loop {
            Timer::after(Duration::from_secs(WAKE_INTERVAL_SECS as u64)).await;

            if self.advance(WAKE_INTERVAL_SECS) {
                self.print_status(keys.len(), transfers.len());
            }
        }
    }

    /// Print current application status
    fn print_status(&self, pending_keys: usize, pending_transfers: usize) {
        let minutes = self.uptime_seconds / 60;
        let hours = minutes / 60;
        let remaining_minutes = minutes % 60;

        if hours > 0 {
            info!("Status: Uptime {}h{}m", hours, remaining_minutes);
        } else {
            info!("Status: Uptime {}m", minutes);
        }
        info!("Status: {} keys, {} transfers pending", pending_keys, pending_transfers);
    }

    /// Get current uptime in seconds
    pub fn uptime(&self) -> u32 {
        self.uptime_seconds
    }
}

impl Default for AppSupervisor {
    fn default() -> Self {
        Self::new(PipelineConfig::default(), SerialConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_due_once_per_interval() {
        let mut supervisor = AppSupervisor::default();
        let due: std::vec::Vec<bool> = (0..12).map(|_| supervisor.advance(10)).collect();

        assert_eq!(
            due,
            [false, false, false, false, false, true, false, false, false, false, false, true]
        );
        assert_eq!(supervisor.uptime(), 120);
    }

    #[test]
    fn long_gap_reports_immediately() {
        let mut supervisor = AppSupervisor::default();
        assert!(supervisor.advance(3600));
        assert!(!supervisor.advance(10));
    }
}
