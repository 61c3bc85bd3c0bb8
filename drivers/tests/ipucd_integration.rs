//! End-to-end tests of the IP-UCD driver against the simulated module.

#![cfg(feature = "sim")]

use std::sync::Arc;
use std::thread;

use common::sync::NoIrq;
use ipucd::hal::Space;
use ipucd::peripheral::ipucd::sim::{Access, AccessKind, SimModule, SimSpace};
use ipucd::peripheral::ipucd::{FifoEntry, IpUcd, UcdConfig, UcdError};
use ipucd::Status;

type TestUcd = IpUcd<SimSpace, SimSpace, NoIrq>;

const CONTROL: usize = 0x40;
const FIFO_WRITE: usize = 0x4a;
const FIFO_CLEAR: usize = 0x4b;
const FIFO: usize = 0x1200;

fn bring_up(module: &SimModule) -> TestUcd {
    let ucd = TestUcd::new(module.a16(), module.a32()).expect("module should be found");
    module.clear_log();
    ucd
}

fn write(space: Space, offset: usize, value: u16) -> (Space, usize, u16) {
    (space, offset, value)
}

fn writes_of(accesses: &[Access]) -> Vec<(Space, usize, u16)> {
    accesses
        .iter()
        .filter(|a| a.kind == AccessKind::Write)
        .map(|a| (a.space, a.offset, a.value))
        .collect()
}

#[test]
fn test_construction_sequence() {
    let module = SimModule::new();
    let _ucd = TestUcd::new(module.a16(), module.a32()).unwrap();

    let accesses = module.accesses();

    // Nothing is written before both PROM id bytes have been read.
    let first_write = accesses.iter().position(|a| a.is_write()).unwrap();
    let prom_reads: Vec<usize> = accesses[..first_write]
        .iter()
        .map(|a| {
            assert_eq!(a.kind, AccessKind::Read);
            a.offset
        })
        .collect();
    assert_eq!(prom_reads, [0x89, 0x8b]);

    let mut expected = vec![
        write(Space::A16, CONTROL, 0xff),
        write(Space::A16, FIFO_WRITE, 0),
        write(Space::A16, FIFO_CLEAR, 0),
    ];
    expected.extend((0..256).map(|event| write(Space::A32, event * 2, 0)));
    expected.push(write(Space::A16, CONTROL, 0x1));

    assert_eq!(writes_of(&accesses), expected);

    let status = module.status();
    assert!(status.contains(Status::TCLK_ENABLED | Status::FIFO_EMPTY));
}

#[test]
fn test_construction_resets_stale_state() {
    let module = SimModule::new();
    module.set_trigger(0x02, 0x00ff);
    module.push_event(0x0000_0102);

    let ucd = TestUcd::new(module.a16(), module.a32()).unwrap();

    assert_eq!(module.trigger(0x02), 0);
    assert!(!ucd.read_fifo().is_valid());
}

#[test]
fn test_wrong_module_is_never_written() {
    let module = SimModule::with_module_id(0xbb16);
    let result = TestUcd::new(module.a16(), module.a32());

    assert!(matches!(
        result,
        Err(UcdError::NotFound {
            found: 0xbb16,
            expected: 0xbb15
        })
    ));
    assert!(module.writes().is_empty());
    assert!(
        module
            .accesses()
            .iter()
            .all(|a| a.space == Space::A16 && (a.offset == 0x89 || a.offset == 0x8b))
    );
}

#[test]
fn test_absent_module() {
    // Unpopulated slots read back as all zeros.
    let module = SimModule::with_module_id(0x0000);
    let err = TestUcd::new(module.a16(), module.a32()).err().unwrap();
    assert!(!err.is_configuration());
    assert!(module.writes().is_empty());
}

#[test]
fn test_read_fifo_empty_does_not_pop() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    let entry = ucd.read_fifo();
    assert!(!entry.is_valid());
    assert_eq!(entry, FifoEntry::default());

    let accesses = module.accesses();
    assert_eq!(accesses.len(), 1);
    assert_eq!(accesses[0].kind, AccessKind::Read);
    assert_eq!(accesses[0].offset, 0x42);
    assert!(!module.status().contains(Status::FIFO_UNDERFLOW));
}

#[test]
fn test_read_fifo_pops_one_entry() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    module.push_event(0x0012_3402);
    module.push_event(0x0000_0a0f);

    let entry = ucd.read_fifo();
    assert!(entry.is_valid());
    assert_eq!(entry.raw(), 0x0012_3402);
    assert_eq!(entry.event(), 0x02);
    assert_eq!(entry.stamp(), 0x1234);
    assert_eq!(module.fifo_len(), 1);

    let pops: Vec<(usize, u16)> = module
        .accesses()
        .iter()
        .filter(|a| a.kind == AccessKind::Pop)
        .map(|a| (a.offset, a.value))
        .collect();
    assert_eq!(pops, [(FIFO, 0x0012), (FIFO + 2, 0x3402)]);
    assert!(module.writes().is_empty());

    let entry = ucd.read_fifo();
    assert_eq!(entry.event(), 0x0f);
    assert_eq!(entry.stamp(), 0x0a);
    assert!(!ucd.read_fifo().is_valid());
}

#[test]
fn test_fifo_is_first_in_first_out() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    for event in 0..10u32 {
        module.push_event((event * 100) << 8 | event);
    }
    for event in 0..10u8 {
        let entry = ucd.read_fifo();
        assert_eq!(entry.event(), event);
        assert_eq!(entry.stamp(), event as u32 * 100);
    }
}

#[test]
fn test_drain_fifo_bounded_by_buffer() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    for word in 0..5u32 {
        module.push_event(word << 8);
    }

    let mut buf = [FifoEntry::empty(); 3];
    assert_eq!(ucd.drain_fifo(&mut buf), 3);
    assert!(buf.iter().all(|e| e.is_valid()));
    assert_eq!(module.fifo_len(), 2);

    let mut buf = [FifoEntry::empty(); 8];
    assert_eq!(ucd.drain_fifo(&mut buf), 2);
    assert_eq!(buf[0].stamp(), 3);
    assert_eq!(buf[1].stamp(), 4);
    assert!(!buf[2].is_valid());

    assert_eq!(ucd.drain_fifo(&mut buf), 0);
}

#[test]
fn test_adjust_tclk_reception_idempotent() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    ucd.adjust_tclk_reception(true, 0x2a, 5).unwrap();
    let once = module.trigger(0x2a);
    ucd.adjust_tclk_reception(true, 0x2a, 5).unwrap();
    assert_eq!(module.trigger(0x2a), once);
    assert_eq!(once, 1 << 5);

    ucd.adjust_tclk_reception(false, 0x2a, 5).unwrap();
    assert_eq!(module.trigger(0x2a), 0);
}

#[test]
fn test_reception_affects_only_its_pair() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    ucd.adjust_tclk_reception(true, 0x02, 3).unwrap();

    for event in 0..=255u8 {
        for bit in 0..=7u8 {
            let expected = event == 0x02 && bit == 3;
            assert_eq!(ucd.tclk_reception(event, bit).unwrap(), expected);
        }
    }
}

#[test]
fn test_config_errors_touch_nothing() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    let err = ucd.set_fifo_threshold(0).unwrap_err();
    assert!(err.is_configuration());

    assert!(ucd.adjust_tclk_reception(true, 0, 8).is_err());
    assert!(ucd.tclk_reception(0, 9).is_err());
    assert!(ucd.set_write_fifo_trigger(0).is_err());
    assert!(ucd.set_write_fifo_trigger(8).is_err());
    assert!(ucd.set_reset_fifo_timestamp_trigger(0).is_err());
    assert!(ucd.set_reset_fifo_timestamp_trigger(8).is_err());

    assert!(module.accesses().is_empty());
}

#[test]
fn test_threshold_written_verbatim() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    for level in 1..=255u8 {
        ucd.set_fifo_threshold(level).unwrap();
        assert_eq!(module.peek(Space::A16, 0x4c), level as u16);
    }
    assert_eq!(
        writes_of(&module.accesses()).len(),
        255,
        "one write per call"
    );
}

#[test]
fn test_threshold_status_cycle() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    ucd.set_fifo_threshold(2).unwrap();
    module.push_event(0x100);
    assert!(!ucd.status().contains(Status::FIFO_THRESHOLD));
    module.push_event(0x200);

    let status = ucd.status();
    assert!(status.contains(Status::FIFO_THRESHOLD));
    assert!(status.fifo_has_data());

    // Latched bits are gone after the write-back; the level bits are not.
    let status = ucd.status();
    assert!(!status.contains(Status::FIFO_THRESHOLD));
    assert!(status.fifo_has_data());
}

#[test]
fn test_with_config_applies_settings() {
    let module = SimModule::new();
    let cfg = UcdConfig::new(0, 0)
        .fifo_threshold(16)
        .write_fifo_trigger(1)
        .reset_timestamp_trigger(2);

    let ucd = TestUcd::with_config(module.a16(), module.a32(), &cfg).unwrap();

    assert_eq!(module.peek(Space::A16, 0x4c), 16);
    assert_eq!(module.peek(Space::A16, FIFO_WRITE), 2);
    assert_eq!(module.peek(Space::A16, FIFO_CLEAR), 3);

    let mut regs = ucd.lock();
    assert_eq!(regs.write_fifo_trigger(), Some(1));
    assert_eq!(regs.reset_fifo_timestamp_trigger(), Some(2));
}

#[test]
fn test_with_config_rejects_before_reset() {
    let module = SimModule::new();
    let cfg = UcdConfig::new(0, 0).write_fifo_trigger(0);

    let result = TestUcd::with_config(module.a16(), module.a32(), &cfg);
    assert!(matches!(
        result,
        Err(UcdError::InvalidTriggerBit { bit: 0, min: 1, max: 7 })
    ));
    assert!(module.accesses().is_empty());
}

#[test]
fn test_lock_modes_are_exclusive() {
    let module = SimModule::new();
    let ucd = bring_up(&module);

    let guard = ucd.lock_plain();
    assert!(ucd.try_lock().is_none());
    drop(guard);

    let mut guard = ucd.try_lock().expect("lock is free");
    assert_eq!(guard.module_id(), 0xbb15);
}

#[test]
fn test_task_and_handler_contexts_serialize() {
    let module = SimModule::new();
    let ucd = Arc::new(bring_up(&module));

    // One thread plays the interrupt handler draining the FIFO through the
    // plain lock; the other plays a task reprogramming the trigger map.
    const EVENTS: u32 = 500;

    let producer = {
        let module = module.clone();
        thread::spawn(move || {
            for n in 0..EVENTS {
                module.push_event(n << 8 | 0x02);
            }
        })
    };

    let handler = {
        let ucd = Arc::clone(&ucd);
        thread::spawn(move || {
            let mut seen = Vec::new();
            while seen.len() < EVENTS as usize {
                let entry = ucd.lock_plain().read_fifo();
                if entry.is_valid() {
                    seen.push(entry);
                } else {
                    thread::yield_now();
                }
            }
            seen
        })
    };

    let task = {
        let ucd = Arc::clone(&ucd);
        thread::spawn(move || {
            for round in 0..200u32 {
                let event = (round % 256) as u8;
                ucd.adjust_tclk_reception(true, event, 1).unwrap();
                ucd.adjust_tclk_reception(false, event, 1).unwrap();
            }
        })
    };

    producer.join().unwrap();
    task.join().unwrap();
    let seen = handler.join().unwrap();

    for (n, entry) in seen.iter().enumerate() {
        assert_eq!(entry.event(), 0x02);
        assert_eq!(entry.stamp(), n as u32);
    }
    assert!(!module.status().contains(Status::FIFO_UNDERFLOW));
    assert!((0..=255u8).all(|event| module.trigger(event) == 0));
}
