//! Bounded single-producer / single-consumer byte channels
//!
//! The bridge uses two of these: host to UART and UART to host. Each
//! channel is split once into a [`ChannelWriter`] and a [`ChannelReader`]
//! whose roles never change. The underlying queue publishes its indices
//! atomically, so one side may live in interrupt context without a lock.

use heapless::spsc::{Consumer, Producer, Queue};

use crate::config::CHANNEL_CAPACITY;

/// Queue slots; one slot stays empty to tell full from empty
const SLOTS: usize = CHANNEL_CAPACITY + 1;

/// Backing storage for one byte channel
pub struct ByteChannel {
    queue: Queue<u8, SLOTS>,
}

impl ByteChannel {
    /// Create an empty channel
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }

    /// Number of bytes the channel can hold
    #[must_use]
    pub const fn capacity(&self) -> usize {
        CHANNEL_CAPACITY
    }

    /// Split into the writing and reading halves
    pub fn split(&mut self) -> (ChannelWriter<'_>, ChannelReader<'_>) {
        let (producer, consumer) = self.queue.split();
        (ChannelWriter { producer }, ChannelReader { consumer })
    }
}

impl Default for ByteChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing half of a [`ByteChannel`]
pub struct ChannelWriter<'a> {
    producer: Producer<'a, u8, SLOTS>,
}

impl ChannelWriter<'_> {
    /// Append a byte. On a full channel the byte is discarded and the
    /// contents are left untouched. Returns whether the byte was stored.
    pub fn insert(&mut self, byte: u8) -> bool {
        self.producer.enqueue(byte).is_ok()
    }

    /// Check if another insert would be dropped
    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.producer.ready()
    }

    /// Bytes currently queued
    #[must_use]
    pub fn count(&self) -> usize {
        self.producer.len()
    }
}

/// Reading half of a [`ByteChannel`]
pub struct ChannelReader<'a> {
    consumer: Consumer<'a, u8, SLOTS>,
}

impl ChannelReader<'_> {
    /// Bytes currently queued
    #[must_use]
    pub fn count(&self) -> usize {
        self.consumer.len()
    }

    /// Check if there is nothing to read
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.consumer.ready()
    }

    /// Front byte without removing it
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.consumer.peek().copied()
    }

    /// Remove and return the front byte
    pub fn remove(&mut self) -> Option<u8> {
        self.consumer.dequeue()
    }
}
