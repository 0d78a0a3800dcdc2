//! Common types and data structures used across the Keylink pipeline
//!
//! This module contains the values that travel through the queues and the
//! small enums shared by the scanner and its GPIO driver.

/// Raw key code of a physical keypad key (`'0'`..`'9'`, `'*'`, `'#'`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent(pub u8);

impl KeyEvent {
    /// Placeholder code for "no key"
    pub const NONE: KeyEvent = KeyEvent(0x00);

    pub const fn from_char(ch: char) -> Self {
        Self(ch as u8)
    }

    pub const fn code(self) -> u8 {
        self.0
    }

    pub const fn as_char(self) -> char {
        self.0 as char
    }
}

/// 16-bit command word sent to the serial peripheral
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandCode(pub u16);

impl CommandCode {
    pub const fn word(self) -> u16 {
        self.0
    }
}

/// Keypad column line, listed in scan priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Column {
    One,
    Two,
    Three,
}

impl Column {
    /// Columns in the order the scanner tries them
    pub const ALL: [Column; 3] = [Column::One, Column::Two, Column::Three];

    /// Zero-based column index
    pub const fn index(self) -> usize {
        match self {
            Column::One => 0,
            Column::Two => 1,
            Column::Three => 2,
        }
    }
}

/// Debounce state of the keypad scanner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// No key held; the next row hit registers a press
    #[default]
    Idle,
    /// A press was registered; waiting for all rows to clear
    Pressed,
}

/// Application version information
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl AppVersion {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self { major, minor, patch }
    }

    pub fn is_newer_than(&self, other: &AppVersion) -> bool {
        (self.major, self.minor, self.patch) > (other.major, other.minor, other.patch)
    }
}

/// Current application version
pub const APP_VERSION: AppVersion = AppVersion::new(0, 1, 0);
