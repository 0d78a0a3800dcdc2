//! Keypad matrix scanning implementation
//!
//! This module handles the 3x4 keypad matrix: it drives one column at a time,
//! reads the four row lines back and runs a two-state debounce machine so
//! each physical press produces exactly one key event on the key queue.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::channels::{KeyQueue, LockWait};
use crate::config::*;
use crate::types::{Column, KeyEvent, ScanState};

// ===================================================================
// Key Layout
// ===================================================================

/// Key codes indexed by `[column][row]`; row 0 is row bit 0x01
const KEY_MATRIX: [[u8; KEYPAD_ROWS]; KEYPAD_COLS] = [
    [b'*', b'7', b'4', b'1'],
    [b'0', b'8', b'5', b'2'],
    [b'#', b'9', b'6', b'3'],
];

/// Row index for a single-bit row mask; `None` for zero or several rows
pub fn row_index(rows: u8) -> Option<usize> {
    match rows & ROW_MASK {
        0x01 => Some(0),
        0x02 => Some(1),
        0x04 => Some(2),
        0x08 => Some(3),
        _ => None,
    }
}

/// Key under `column` for the given row mask
pub fn key_at(column: Column, rows: u8) -> Option<KeyEvent> {
    row_index(rows).map(|row| KeyEvent(KEY_MATRIX[column.index()][row]))
}

// ===================================================================
// GPIO Driver
// ===================================================================

/// Column drive and row sense lines of the keypad
pub trait KeypadGpio {
    /// Drive `column` active and every other column inactive
    fn set_column_active(&mut self, column: Column);

    /// Current row lines as a 4-bit mask, bit 0 = row 1
    fn read_row_bits(&mut self) -> u8;
}

/// Keypad wired to plain GPIO pins: columns driven high, rows pulled down
pub struct MatrixPins<C, R> {
    cols: [C; KEYPAD_COLS],
    rows: [R; KEYPAD_ROWS],
    settle_cycles: u32,
}

impl<C: OutputPin, R: InputPin> MatrixPins<C, R> {
    pub fn new(cols: [C; KEYPAD_COLS], rows: [R; KEYPAD_ROWS]) -> Self {
        Self {
            cols,
            rows,
            settle_cycles: COLUMN_SETTLE_CYCLES,
        }
    }

    /// Override the busy delay between driving a column and reading rows
    pub fn with_settle_cycles(mut self, cycles: u32) -> Self {
        self.settle_cycles = cycles;
        self
    }
}

impl<C: OutputPin, R: InputPin> KeypadGpio for MatrixPins<C, R> {
    fn set_column_active(&mut self, column: Column) {
        for (idx, pin) in self.cols.iter_mut().enumerate() {
            let _ = if idx == column.index() { pin.set_high() } else { pin.set_low() };
        }

        // Small settling time
        for _ in 0..self.settle_cycles {
            core::hint::spin_loop();
        }
    }

    fn read_row_bits(&mut self) -> u8 {
        self.rows
            .iter_mut()
            .enumerate()
            .fold(0, |mask, (idx, pin)| {
                if matches!(pin.is_high(), Ok(true)) {
                    mask | (1 << idx)
                } else {
                    mask
                }
            })
    }
}

// ===================================================================
// Debounce State Machine
// ===================================================================

/// Keypad scanner owning the GPIO lines and the debounce state
pub struct Scanner<G> {
    gpio: G,
    state: ScanState,
}

impl<G: KeypadGpio> Scanner<G> {
    pub fn new(gpio: G) -> Self {
        Self {
            gpio,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Run one scan cycle; returns the key to publish on a new press.
    ///
    /// In `Idle` columns are tried in order and the first row hit wins; the
    /// remaining columns are not driven that cycle. In `Pressed` only the
    /// row lines are read, until they all clear.
    pub fn tick(&mut self) -> Option<KeyEvent> {
        match self.state {
            ScanState::Idle => {
                for column in Column::ALL {
                    self.gpio.set_column_active(column);
                    let rows = self.gpio.read_row_bits() & ROW_MASK;
                    if rows != 0 {
                        self.state = ScanState::Pressed;
                        let key = key_at(column, rows);
                        if key.is_none() {
                            warn!("Ignoring row mask {=u8:#x} on column {}", rows, column.index() + 1);
                        }
                        return key;
                    }
                }
                None
            }
            ScanState::Pressed => {
                if self.gpio.read_row_bits() & ROW_MASK == 0 {
                    self.state = ScanState::Idle;
                }
                None
            }
        }
    }

    /// Run one scan cycle and publish a new press to `queue`.
    ///
    /// The press is registered even if the publish is dropped.
    pub async fn scan<M: RawMutex>(&mut self, queue: &KeyQueue<M>, wait: LockWait) -> Option<KeyEvent> {
        let key = self.tick()?;
        debug!("Key '{}' pressed", key.as_char());
        let _ = queue.publish(key, wait).await;
        Some(key)
    }

    /// Scan forever, once per tick
    pub async fn run<M: RawMutex>(mut self, queue: &KeyQueue<M>, config: PipelineConfig) -> ! {
        info!("Keypad scanner started");
        let wait = LockWait::Bounded(config.key_guard_timeout);

        loop {
            Timer::after(config.scan_tick).await;
            self.scan(queue, wait).await;
        }
    }
}
