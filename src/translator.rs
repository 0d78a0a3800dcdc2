//! Key to command translation
//!
//! Drains the key queue, looks each key code up in the fixed command table
//! and forwards the resulting word to the transfer queue.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;

use crate::channels::{KeyQueue, LockWait, TransferQueue};
use crate::config::PipelineConfig;
use crate::types::{CommandCode, KeyEvent};

/// Command word for every key on the pad
pub const COMMAND_TABLE: [(u8, CommandCode); 12] = [
    (b'1', CommandCode(0x0001)),
    (b'2', CommandCode(0x0002)),
    (b'3', CommandCode(0x0003)),
    (b'4', CommandCode(0x0004)),
    (b'5', CommandCode(0x0005)),
    (b'6', CommandCode(0x0006)),
    (b'7', CommandCode(0x0007)),
    (b'8', CommandCode(0x0008)),
    (b'9', CommandCode(0x0009)),
    (b'*', CommandCode(0x0010)),
    (b'0', CommandCode(0x0011)),
    (b'#', CommandCode(0x0012)),
];

/// Command for `key`, or `None` for a code outside the table
pub fn translate(key: KeyEvent) -> Option<CommandCode> {
    COMMAND_TABLE
        .iter()
        .find(|(code, _)| *code == key.code())
        .map(|&(_, command)| command)
}

/// Pipeline stage between the key queue and the transfer queue
pub struct Translator {
    last_key: KeyEvent,
}

impl Translator {
    pub const fn new() -> Self {
        Self {
            last_key: KeyEvent::NONE,
        }
    }

    /// Most recently received key still waiting for translation
    pub fn last_key(&self) -> KeyEvent {
        self.last_key
    }

    /// Translate one key and publish its command.
    ///
    /// The latch is cleared once a command has been produced so the same
    /// key is never translated twice. Unknown keys produce nothing. The
    /// command is returned even if the publish is dropped.
    pub async fn dispatch<M: RawMutex>(
        &mut self,
        key: KeyEvent,
        transfers: &TransferQueue<M>,
    ) -> Option<CommandCode> {
        self.last_key = key;

        let Some(command) = translate(key) else {
            debug!("No command for key {=u8:#x}", key.code());
            return None;
        };

        debug!("Key '{}' -> command {=u16:#x}", key.as_char(), command.word());
        let _ = transfers.publish(command, LockWait::Forever).await;
        self.last_key = KeyEvent::NONE;
        Some(command)
    }

    /// Take one pending key, if any, and dispatch it
    pub async fn step<M: RawMutex>(
        &mut self,
        keys: &KeyQueue<M>,
        transfers: &TransferQueue<M>,
    ) -> Option<CommandCode> {
        let key = keys.consume().await?;
        self.dispatch(key, transfers).await
    }

    /// Translate forever
    pub async fn run<M: RawMutex>(
        mut self,
        keys: &KeyQueue<M>,
        transfers: &TransferQueue<M>,
        config: PipelineConfig,
    ) -> ! {
        info!("Command translator started");

        loop {
            if keys.is_empty() {
                Timer::after(config.poll_interval).await;
                continue;
            }
            self.step(keys, transfers).await;
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
