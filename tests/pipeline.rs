//! End-to-end pipeline tests: mock keypad -> scanner -> translator ->
//! transmitter -> mock serial port, stepped one scan tick at a time.

use std::cell::RefCell;
use std::rc::Rc;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use keylink::config::{KEY_GUARD_TIMEOUT, QUEUE_CAPACITY};
use keylink::{
    Column, CommandCode, KeyEvent, KeyQueue, KeypadGpio, LockWait, Scanner, SerialPeripheral,
    TransferQueue, Translator, Transmitter,
};

fn position(key: char) -> (Column, u8) {
    match key {
        '1' => (Column::One, 0x08),
        '4' => (Column::One, 0x04),
        '7' => (Column::One, 0x02),
        '*' => (Column::One, 0x01),
        '2' => (Column::Two, 0x08),
        '5' => (Column::Two, 0x04),
        '8' => (Column::Two, 0x02),
        '0' => (Column::Two, 0x01),
        '3' => (Column::Three, 0x08),
        '6' => (Column::Three, 0x04),
        '9' => (Column::Three, 0x02),
        '#' => (Column::Three, 0x01),
        other => panic!("no key {:?} on the pad", other),
    }
}

#[derive(Default)]
struct Pad {
    held: Option<char>,
    active: Option<Column>,
}

/// Keypad handle shared between the scanner and the test
#[derive(Clone, Default)]
struct MockKeypad(Rc<RefCell<Pad>>);

impl MockKeypad {
    fn press(&self, key: char) {
        self.0.borrow_mut().held = Some(key);
    }

    fn release(&self) {
        self.0.borrow_mut().held = None;
    }
}

impl KeypadGpio for MockKeypad {
    fn set_column_active(&mut self, column: Column) {
        self.0.borrow_mut().active = Some(column);
    }

    fn read_row_bits(&mut self) -> u8 {
        let pad = self.0.borrow();
        match pad.held.map(position) {
            Some((column, rows)) if Some(column) == pad.active => rows,
            _ => 0,
        }
    }
}

#[derive(Default)]
struct Port {
    inits: u32,
    enabled: bool,
    data_register: Vec<u16>,
}

/// Serial port handle recording every data register write
#[derive(Clone, Default)]
struct MockSerial(Rc<RefCell<Port>>);

impl MockSerial {
    fn written(&self) -> Vec<u16> {
        self.0.borrow().data_register.clone()
    }
}

impl SerialPeripheral for MockSerial {
    fn init(&mut self) {
        let mut port = self.0.borrow_mut();
        port.inits += 1;
        port.enabled = true;
    }

    fn is_tx_ready(&mut self) -> bool {
        self.0.borrow().enabled
    }

    fn write_word(&mut self, word: u16) {
        self.0.borrow_mut().data_register.push(word);
    }
}

struct Bench {
    keypad: MockKeypad,
    serial: MockSerial,
    keys: KeyQueue<NoopRawMutex>,
    transfers: TransferQueue<NoopRawMutex>,
    scanner: Scanner<MockKeypad>,
    translator: Translator,
    transmitter: Transmitter<MockSerial>,
}

impl Bench {
    fn new() -> Self {
        let keypad = MockKeypad::default();
        let serial = MockSerial::default();
        Self {
            scanner: Scanner::new(keypad.clone()),
            transmitter: Transmitter::new(serial.clone()),
            keypad,
            serial,
            keys: KeyQueue::new(),
            transfers: TransferQueue::new(),
            translator: Translator::new(),
        }
    }

    fn scan(&mut self) -> Option<KeyEvent> {
        block_on(self.scanner.scan(&self.keys, LockWait::Bounded(KEY_GUARD_TIMEOUT)))
    }

    fn translate(&mut self) -> Option<CommandCode> {
        block_on(self.translator.step(&self.keys, &self.transfers))
    }

    fn transmit(&mut self) -> Option<CommandCode> {
        block_on(self.transmitter.step(&self.transfers))
    }

    /// One scheduler tick with every stage getting a turn
    fn tick(&mut self) {
        self.scan();
        self.translate();
        self.transmit();
    }

    fn type_key(&mut self, key: char) {
        self.keypad.press(key);
        for _ in 0..3 {
            self.tick();
        }
        self.keypad.release();
        for _ in 0..3 {
            self.tick();
        }
    }
}

#[test]
fn key_five_reaches_the_data_register_once() {
    let mut bench = Bench::new();
    bench.keypad.press('5');

    assert_eq!(bench.scan(), Some(KeyEvent::from_char('5')));
    assert_eq!(bench.keys.len(), 1);

    assert_eq!(bench.translate(), Some(CommandCode(0x0005)));
    assert!(bench.keys.is_empty());
    assert_eq!(bench.transfers.len(), 1);

    assert_eq!(bench.transmit(), Some(CommandCode(0x0005)));
    assert!(bench.transfers.is_empty());

    bench.keypad.release();
    for _ in 0..5 {
        bench.tick();
    }
    assert_eq!(bench.serial.written(), [0x0005]);
}

#[test]
fn special_keys_map_to_their_commands() {
    for (key, word) in [('*', 0x0010), ('0', 0x0011), ('#', 0x0012)] {
        let mut bench = Bench::new();
        bench.type_key(key);
        assert_eq!(bench.serial.written(), [word], "key {}", key);
    }
}

#[test]
fn held_key_sends_one_word() {
    let mut bench = Bench::new();
    bench.keypad.press('3');
    for _ in 0..40 {
        bench.tick();
    }
    assert_eq!(bench.serial.written(), [0x0003]);

    bench.keypad.release();
    for _ in 0..5 {
        bench.tick();
    }
    assert_eq!(bench.serial.written(), [0x0003]);
}

#[test]
fn typed_sequence_is_sent_in_order() {
    let mut bench = Bench::new();
    for key in "1#09*".chars() {
        bench.type_key(key);
    }
    assert_eq!(bench.serial.written(), [0x0001, 0x0012, 0x0011, 0x0009, 0x0010]);
}

#[test]
fn full_key_queue_drops_new_presses() {
    let mut bench = Bench::new();

    // Translator stalled: only the scanner runs
    for _ in 0..QUEUE_CAPACITY + 5 {
        bench.keypad.press('8');
        bench.scan();
        bench.keypad.release();
        bench.scan();
    }
    assert!(bench.keys.is_full());
    assert_eq!(bench.keys.len(), QUEUE_CAPACITY);

    while bench.translate().is_some() {}
    while bench.transmit().is_some() {}
    assert_eq!(bench.serial.written(), vec![0x0008; QUEUE_CAPACITY]);
}

#[test]
fn full_transfer_queue_loses_the_key() {
    let mut bench = Bench::new();

    // Transmitter stalled: the transfer queue is already full
    for word in 0..QUEUE_CAPACITY as u16 {
        block_on(bench.transfers.publish(CommandCode(0x0100 + word), LockWait::Forever)).unwrap();
    }
    bench.keypad.press('9');
    assert_eq!(bench.scan(), Some(KeyEvent::from_char('9')));
    assert_eq!(bench.keys.len(), 1);

    bench.translate();
    assert!(bench.keys.is_empty());
    assert_eq!(bench.transfers.len(), QUEUE_CAPACITY);

    bench.keypad.release();
    while bench.transmit().is_some() {}
    let expected: Vec<u16> = (0..QUEUE_CAPACITY as u16).map(|word| 0x0100 + word).collect();
    assert_eq!(bench.serial.written(), expected);
}

#[test]
fn unmapped_key_code_is_not_transmitted() {
    let mut bench = Bench::new();
    block_on(bench.keys.publish(KeyEvent(b'A'), LockWait::Forever)).unwrap();
    block_on(bench.keys.publish(KeyEvent(b'2'), LockWait::Forever)).unwrap();

    for _ in 0..4 {
        bench.tick();
    }
    assert_eq!(bench.serial.written(), [0x0002]);
}

#[test]
fn repeated_init_keeps_transfers_working() {
    let mut bench = Bench::new();
    bench.type_key('4');
    bench.transmitter.peripheral_mut().init();
    bench.type_key('6');

    assert_eq!(bench.serial.0.borrow().inits, 2);
    assert_eq!(bench.serial.written(), [0x0004, 0x0006]);
}
