//! Hardware and pipeline configuration for Keylink
//! RP2040-based 3x4 keypad to SPI command bridge

use core::fmt;

use embassy_time::Duration;

// ===================================================================
// Keypad Specifications
// ===================================================================

pub const KEYPAD_COLS: usize = 3; // Column lines driven by the scanner
pub const KEYPAD_ROWS: usize = 4; // Row lines read back as a 4-bit mask
pub const ROW_MASK: u8 = 0x0F; // Valid bits of a row read

// ===================================================================
// GPIO Pin Assignments - Raspberry Pi Pico
// ===================================================================

pub const KEYPAD_COL_PINS: [u8; KEYPAD_COLS] = [2, 3, 4]; // GPIO 2, 3, 4 (column 1..3)
pub const KEYPAD_ROW_PINS: [u8; KEYPAD_ROWS] = [6, 7, 8, 9]; // GPIO 6..9 (row bit 0..3)

// SPI0 command output
pub const SPI_SCK_PIN: u8 = 18; // Serial clock
pub const SPI_MOSI_PIN: u8 = 19; // Command words out

pub const LED_STATUS_PIN: u8 = 25; // Built-in LED on Pico

// ===================================================================
// Pipeline Timing
// ===================================================================

pub const QUEUE_CAPACITY: usize = 128; // Key and transfer queue depth

/// One scheduler tick; the scanner runs every tick so short presses are not missed
pub const SCAN_TICK: Duration = Duration::from_millis(1);
/// Consumers re-check an empty queue after this long
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Bounded wait the scanner allows for the key queue guard (10 ticks)
pub const KEY_GUARD_TIMEOUT: Duration = Duration::from_millis(10);

pub const COLUMN_SETTLE_CYCLES: u32 = 30; // Busy cycles after driving a column
pub const STATUS_INTERVAL_SECS: u32 = 60; // Supervisor status line period

// ===================================================================
// Serial Port Frame Format
// ===================================================================

pub const SPI_DATA_BITS: u8 = 16; // One command per frame
pub const SPI_CLOCK_PRESCALE: u8 = 2; // Smallest legal divisor
pub const SPI_SERIAL_CLOCK_RATE: u8 = 0; // No further division

/// Pipeline timing knobs, passed to every worker at construction
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    /// Delay between two scanner ticks
    pub scan_tick: Duration,
    /// Delay before a consumer polls an empty queue again
    pub poll_interval: Duration,
    /// Bounded wait for the key queue guard
    pub key_guard_timeout: Duration,
}

impl PipelineConfig {
    pub const fn new() -> Self {
        Self {
            scan_tick: SCAN_TICK,
            poll_interval: POLL_INTERVAL,
            key_guard_timeout: KEY_GUARD_TIMEOUT,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock polarity and phase of the serial port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Idle low, sample on first edge
    Mode0,
    /// Idle low, sample on second edge
    Mode1,
    /// Idle high, sample on first edge
    Mode2,
    /// Idle high, sample on second edge
    Mode3,
}

impl SpiMode {
    /// (polarity, phase) bits
    pub const fn bits(self) -> (bool, bool) {
        match self {
            SpiMode::Mode0 => (false, false),
            SpiMode::Mode1 => (false, true),
            SpiMode::Mode2 => (true, false),
            SpiMode::Mode3 => (true, true),
        }
    }
}

/// Frame format written to the serial port by `init()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Bits per frame (4..=16)
    pub data_bits: u8,
    /// Clock prescale divisor, even, 2..=254
    pub prescale: u8,
    /// Serial clock rate; bit rate = clk / (prescale * (1 + rate))
    pub clock_rate: u8,
    pub mode: SpiMode,
}

/// Rejected serial configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Frame size outside 4..=16 bits
    DataBits(u8),
    /// Prescale divisor odd or outside 2..=254
    Prescale(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DataBits(bits) => write!(f, "unsupported frame size: {} bits", bits),
            ConfigError::Prescale(div) => write!(f, "invalid clock prescale divisor: {}", div),
        }
    }
}

impl SerialConfig {
    pub const fn new() -> Self {
        Self {
            data_bits: SPI_DATA_BITS,
            prescale: SPI_CLOCK_PRESCALE,
            clock_rate: SPI_SERIAL_CLOCK_RATE,
            mode: SpiMode::Mode0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=16).contains(&self.data_bits) {
            return Err(ConfigError::DataBits(self.data_bits));
        }
        if self.prescale < 2 || self.prescale % 2 != 0 {
            return Err(ConfigError::Prescale(self.prescale));
        }
        Ok(())
    }

    /// Value of the data size select field (frame size minus one)
    pub const fn dss(&self) -> u8 {
        self.data_bits.saturating_sub(1)
    }

    /// Largest word a frame can carry
    pub const fn word_mask(&self) -> u16 {
        if self.data_bits >= 16 {
            u16::MAX
        } else {
            (1u16 << self.data_bits) - 1
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}
