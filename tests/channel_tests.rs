//! Byte Channel Tests
//!
//! Tests for the bounded FIFOs between the UART interrupt and the main loop.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test channel_tests

use srxe_dongle::channel::ByteChannel;
use srxe_dongle::config::CHANNEL_CAPACITY;

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn bytes_come_out_in_order() {
    let mut channel = ByteChannel::new();
    let (mut writer, mut reader) = channel.split();

    for &byte in b"AT\r\n" {
        assert!(writer.insert(byte));
    }

    let mut out = Vec::new();
    while let Some(byte) = reader.remove() {
        out.push(byte);
    }
    assert_eq!(out, b"AT\r\n");
}

#[test]
fn order_survives_wraparound() {
    let mut channel = ByteChannel::new();
    let (mut writer, mut reader) = channel.split();

    // Keep the channel half full while cycling through it several times
    let mut next_in: u32 = 0;
    let mut next_out: u32 = 0;
    for _ in 0..CHANNEL_CAPACITY * 4 {
        while writer.count() < CHANNEL_CAPACITY / 2 {
            assert!(writer.insert(next_in as u8));
            next_in += 1;
        }
        assert_eq!(reader.remove(), Some(next_out as u8));
        next_out += 1;
    }
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn insert_into_full_channel_is_dropped() {
    let mut channel = ByteChannel::new();
    let (mut writer, mut reader) = channel.split();

    for i in 0..CHANNEL_CAPACITY {
        assert!(writer.insert(i as u8));
    }
    assert!(writer.is_full());
    assert!(!writer.insert(0xEE));

    // The dropped byte never shows up; the earlier contents are intact
    for i in 0..CHANNEL_CAPACITY {
        assert_eq!(reader.remove(), Some(i as u8));
    }
    assert_eq!(reader.remove(), None);
}

#[test]
fn count_seen_from_both_ends() {
    let mut channel = ByteChannel::new();
    let (mut writer, mut reader) = channel.split();

    writer.insert(1);
    writer.insert(2);
    assert_eq!(writer.count(), 2);
    assert_eq!(reader.count(), 2);

    reader.remove();
    assert_eq!(writer.count(), 1);
    assert_eq!(reader.count(), 1);
}

#[test]
fn remove_from_empty_is_none() {
    let mut channel = ByteChannel::new();
    let (_writer, mut reader) = channel.split();

    assert!(reader.is_empty());
    assert_eq!(reader.peek(), None);
    assert_eq!(reader.remove(), None);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn producer_and_consumer_on_separate_threads() {
    const TOTAL: usize = 10_000;

    let mut channel = ByteChannel::new();
    let (mut writer, mut reader) = channel.split();

    let received = std::thread::scope(|scope| {
        scope.spawn(move || {
            let mut sent = 0;
            while sent < TOTAL {
                if writer.insert(sent as u8) {
                    sent += 1;
                }
            }
        });

        let mut received = Vec::with_capacity(TOTAL);
        while received.len() < TOTAL {
            if let Some(byte) = reader.remove() {
                received.push(byte);
            }
        }
        received
    });

    for (i, byte) in received.iter().enumerate() {
        assert_eq!(*byte, i as u8);
    }
}
