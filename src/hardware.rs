//! Hardware abstraction and initialization
//!
//! This module binds the pipeline to the RP2040: keypad GPIO lines, the SPI0
//! port used as a 16-bit transmit-only synchronous serial port, the status
//! LED, and the Embassy tasks that run each pipeline stage.

use core::fmt;

use embassy_executor::{SpawnError, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::spi::{self, Blocking, Spi};
use embassy_rp::{pac, peripherals, Peripherals};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_time::{Duration, Timer};

use crate::channels::{KeyQueue, TransferQueue};
use crate::config::{ConfigError, PipelineConfig, SerialConfig};
use crate::keypad::{MatrixPins, Scanner};
use crate::translator::Translator;
use crate::transmitter::{SerialPeripheral, Transmitter};

/// Queue types shared by the firmware tasks
pub type FirmwareKeyQueue = KeyQueue<ThreadModeRawMutex>;
pub type FirmwareTransferQueue = TransferQueue<ThreadModeRawMutex>;

/// Keypad on GPIO: three driven columns, four pulled-down rows
pub type KeypadPins = MatrixPins<Output<'static>, Input<'static>>;

/// Hardware bring-up failure
#[derive(Debug, defmt::Format)]
pub enum HardwareError {
    Spawn(SpawnError),
    Config(ConfigError),
}

impl From<SpawnError> for HardwareError {
    fn from(err: SpawnError) -> Self {
        HardwareError::Spawn(err)
    }
}

impl From<ConfigError> for HardwareError {
    fn from(err: ConfigError) -> Self {
        HardwareError::Config(err)
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::Spawn(_) => f.write_str("task spawn failed"),
            HardwareError::Config(err) => write!(f, "serial config rejected: {}", err),
        }
    }
}

// ===================================================================
// SPI0 as 16-bit Synchronous Serial Port
// ===================================================================

/// SPI0 driven directly through its PL022 registers with 16-bit frames
pub struct Ssp {
    // Owns the peripheral and pin muxing; register access goes through the PAC
    _spi: Spi<'static, peripherals::SPI0, Blocking>,
    config: SerialConfig,
}

impl Ssp {
    /// Claim SPI0 with SCK/MOSI pins; `init()` applies `config`
    pub fn new(spi: Spi<'static, peripherals::SPI0, Blocking>, config: SerialConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { _spi: spi, config })
    }
}

impl SerialPeripheral for Ssp {
    fn init(&mut self) {
        let regs = pac::SPI0;
        let (polarity, phase) = self.config.mode.bits();

        // Frame format may only change while the port is disabled
        regs.sspcr1().write(|w| w.set_sse(false));
        regs.sspcpsr().write(|w| w.set_cpsdvsr(self.config.prescale));
        regs.sspcr0().write(|w| {
            w.set_dss(self.config.dss());
            w.set_frf(0); // Motorola
            w.set_spo(polarity);
            w.set_sph(phase);
            w.set_scr(self.config.clock_rate);
        });
        regs.sspcr1().write(|w| w.set_sse(true));
    }

    fn is_tx_ready(&mut self) -> bool {
        pac::SPI0.sspsr().read().tnf()
    }

    fn write_word(&mut self, word: u16) {
        pac::SPI0.sspdr().write(|w| w.set_data(word & self.config.word_mask()));
    }
}

// ===================================================================
// Pipeline Tasks
// ===================================================================

#[embassy_executor::task]
pub async fn keypad_task(pins: KeypadPins, keys: &'static FirmwareKeyQueue, config: PipelineConfig) -> ! {
    Scanner::new(pins).run(keys, config).await
}

#[embassy_executor::task]
pub async fn translator_task(
    keys: &'static FirmwareKeyQueue,
    transfers: &'static FirmwareTransferQueue,
    config: PipelineConfig,
) -> ! {
    Translator::new().run(keys, transfers, config).await
}

#[embassy_executor::task]
pub async fn transmitter_task(ssp: Ssp, transfers: &'static FirmwareTransferQueue, config: PipelineConfig) -> ! {
    Transmitter::new(ssp).run(transfers, config).await
}

/// Status LED task implementation
#[embassy_executor::task]
pub async fn status_task(mut status_led: Output<'static>) {
    info!("Status LED task started");

    loop {
        // Heartbeat pattern - short blink every second
        status_led.set_high();
        Timer::after(Duration::from_millis(100)).await;
        status_led.set_low();
        Timer::after(Duration::from_millis(900)).await;
    }
}

/// Claim the pins and spawn every pipeline task
pub fn init_hardware_tasks(
    spawner: &Spawner,
    p: Peripherals,
    keys: &'static FirmwareKeyQueue,
    transfers: &'static FirmwareTransferQueue,
    pipeline: PipelineConfig,
    serial: SerialConfig,
) -> Result<(), HardwareError> {
    info!("Initializing keypad on GPIO 2-4 (columns) and 6-9 (rows)");
    let pins = MatrixPins::new(
        [
            Output::new(p.PIN_2, Level::Low),
            Output::new(p.PIN_3, Level::Low),
            Output::new(p.PIN_4, Level::Low),
        ],
        [
            Input::new(p.PIN_6, Pull::Down),
            Input::new(p.PIN_7, Pull::Down),
            Input::new(p.PIN_8, Pull::Down),
            Input::new(p.PIN_9, Pull::Down),
        ],
    );

    info!("Initializing SPI0 on GPIO 18 (SCK) and 19 (MOSI)");
    let mut spi_config = spi::Config::default();
    let (polarity, phase) = serial.mode.bits();
    spi_config.polarity = if polarity { spi::Polarity::IdleHigh } else { spi::Polarity::IdleLow };
    spi_config.phase = if phase { spi::Phase::CaptureOnSecondTransition } else { spi::Phase::CaptureOnFirstTransition };
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let ssp = Ssp::new(spi, serial)?;

    spawner.spawn(keypad_task(pins, keys, pipeline))?;
    spawner.spawn(translator_task(keys, transfers, pipeline))?;
    spawner.spawn(transmitter_task(ssp, transfers, pipeline))?;
    spawner.spawn(status_task(Output::new(p.PIN_25, Level::Low)))?;

    Ok(())
}
