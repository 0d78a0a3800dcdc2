//! Serial command transmitter
//!
//! Owns the serial peripheral and sends one 16-bit word per command drained
//! from the transfer queue.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;

use crate::channels::TransferQueue;
use crate::config::PipelineConfig;
use crate::types::CommandCode;

/// Synchronous serial port that shifts out 16-bit words
pub trait SerialPeripheral {
    /// Configure clocks, pins, frame format and divider, then enable the
    /// port. Calling it again must leave the port in the same state.
    fn init(&mut self);

    /// Whether the transmit FIFO can accept another word
    fn is_tx_ready(&mut self) -> bool;

    /// Write one word to the data register without checking readiness
    fn write_word(&mut self, word: u16);

    /// Blocking transfer of one word.
    ///
    /// Spins on the processor until the port is ready; this is not a
    /// cooperative wait and has no timeout. Interrupt or DMA driven ports
    /// override it with their own wait.
    fn transmit(&mut self, word: u16) {
        while !self.is_tx_ready() {
            core::hint::spin_loop();
        }
        self.write_word(word);
    }
}

/// Last pipeline stage: transfer queue to serial peripheral
pub struct Transmitter<S> {
    serial: S,
}

impl<S: SerialPeripheral> Transmitter<S> {
    /// Take ownership of the port and initialize it
    pub fn new(mut serial: S) -> Self {
        serial.init();
        info!("Serial port initialized");
        Self { serial }
    }

    /// Send one command, blocking until the port accepts it
    pub fn transfer(&mut self, command: CommandCode) {
        self.serial.transmit(command.word());
        debug!("Sent command {=u16:#x}", command.word());
    }

    /// Send the oldest pending command, if any
    pub async fn step<M: RawMutex>(&mut self, transfers: &TransferQueue<M>) -> Option<CommandCode> {
        let command = transfers.consume().await?;
        self.transfer(command);
        Some(command)
    }

    /// Transmit forever
    pub async fn run<M: RawMutex>(mut self, transfers: &TransferQueue<M>, config: PipelineConfig) -> ! {
        info!("Serial transmitter started");

        loop {
            if transfers.is_empty() {
                Timer::after(config.poll_interval).await;
                continue;
            }
            self.step(transfers).await;
        }
    }

    pub fn peripheral(&self) -> &S {
        &self.serial
    }

    pub fn peripheral_mut(&mut self) -> &mut S {
        &mut self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::LockWait;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::vec::Vec;

    /// Port that reports busy for `busy_polls` polls before every word
    #[derive(Default)]
    struct MockSerial {
        inits: u32,
        enabled: bool,
        busy_polls: u32,
        remaining_busy: u32,
        polls: u32,
        data: Vec<u16>,
    }

    impl SerialPeripheral for MockSerial {
        fn init(&mut self) {
            self.inits += 1;
            self.enabled = true;
            self.remaining_busy = self.busy_polls;
        }

        fn is_tx_ready(&mut self) -> bool {
            self.polls += 1;
            if self.remaining_busy > 0 {
                self.remaining_busy -= 1;
                false
            } else {
                true
            }
        }

        fn write_word(&mut self, word: u16) {
            assert!(self.enabled, "write before init");
            self.data.push(word);
            self.remaining_busy = self.busy_polls;
        }
    }

    #[test]
    fn new_initializes_once() {
        let tx = Transmitter::new(MockSerial::default());
        assert_eq!(tx.peripheral().inits, 1);
        assert!(tx.peripheral().data.is_empty());
    }

    #[test]
    fn transfer_writes_word() {
        let mut tx = Transmitter::new(MockSerial::default());
        tx.transfer(CommandCode(0x0005));
        assert_eq!(tx.peripheral().data, [0x0005]);
    }

    #[test]
    fn transfer_spins_until_ready() {
        let serial = MockSerial { busy_polls: 5, ..Default::default() };
        let mut tx = Transmitter::new(serial);

        tx.transfer(CommandCode(0x0012));
        assert_eq!(tx.peripheral().polls, 6);
        assert_eq!(tx.peripheral().data, [0x0012]);
    }

    #[test]
    fn second_init_keeps_transfers_working() {
        let mut tx = Transmitter::new(MockSerial::default());
        tx.transfer(CommandCode(0x0001));
        tx.peripheral_mut().init();
        tx.transfer(CommandCode(0x0002));

        assert_eq!(tx.peripheral().inits, 2);
        assert_eq!(tx.peripheral().data, [0x0001, 0x0002]);
    }

    #[test]
    fn step_sends_each_command_once_in_order() {
        let transfers: TransferQueue<NoopRawMutex> = TransferQueue::new();
        let mut tx = Transmitter::new(MockSerial::default());

        for word in [0x0011, 0x0003, 0x0010] {
            block_on(transfers.publish(CommandCode(word), LockWait::Forever)).unwrap();
        }
        while block_on(tx.step(&transfers)).is_some() {}

        assert_eq!(tx.peripheral().data, [0x0011, 0x0003, 0x0010]);
        assert_eq!(block_on(tx.step(&transfers)), None);
        assert_eq!(tx.peripheral().data.len(), 3);
    }
}
