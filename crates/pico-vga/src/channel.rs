//! Inter-core line requests.
//!
//! The interrupt side pushes one word per request without ever blocking; a
//! full FIFO drops the request. The render core blocks in [`LineReceiver::recv`]
//! until a word arrives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, Thread};
use std::time::Duration;

use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};

const LINE_MASK: u32 = 0x0FFF;
const PARITY_BIT: u32 = 1 << 16;

/// Upper bound on a single park; a lost unpark only costs this much.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Which of the two row buffers a line goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferParity {
    Even,
    Odd,
}

impl BufferParity {
    #[must_use]
    pub const fn of_line(line: u32) -> Self {
        if line & 1 == 0 { Self::Even } else { Self::Odd }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
        }
    }
}

/// A request for the render core to produce one logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest {
    pub line: u16,
    pub parity: BufferParity,
}

impl LineRequest {
    /// Request for `line`, targeting the buffer its parity selects.
    #[must_use]
    pub const fn new(line: u16) -> Self {
        Self {
            line,
            parity: BufferParity::of_line(line as u32),
        }
    }

    /// FIFO word: line in bits 0-11, parity in bit 16.
    #[must_use]
    pub const fn to_word(self) -> u32 {
        let parity = match self.parity {
            BufferParity::Even => 0,
            BufferParity::Odd => PARITY_BIT,
        };
        (self.line as u32 & LINE_MASK) | parity
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_word(word: u32) -> Self {
        Self {
            line: (word & LINE_MASK) as u16,
            parity: if word & PARITY_BIT == 0 {
                BufferParity::Even
            } else {
                BufferParity::Odd
            },
        }
    }
}

struct Shared {
    consumer: OnceLock<Thread>,
    closed: AtomicBool,
}

/// Interrupt-side half. Never blocks.
pub struct LineSender {
    producer: HeapProd<u32>,
    shared: Arc<Shared>,
    sent: u64,
    dropped: u64,
}

/// Render-core half.
pub struct LineReceiver {
    consumer: HeapCons<u32>,
    shared: Arc<Shared>,
}

/// Create a request FIFO holding `capacity` words.
#[must_use]
pub fn line_channel(capacity: usize) -> (LineSender, LineReceiver) {
    let (producer, consumer) = HeapRb::<u32>::new(capacity.max(1)).split();
    let shared = Arc::new(Shared {
        consumer: OnceLock::new(),
        closed: AtomicBool::new(false),
    });
    (
        LineSender {
            producer,
            shared: Arc::clone(&shared),
            sent: 0,
            dropped: 0,
        },
        LineReceiver { consumer, shared },
    )
}

impl LineSender {
    /// Push a request. Returns `false` if the FIFO was full and the request
    /// was dropped.
    pub fn try_send(&mut self, request: LineRequest) -> bool {
        if self.producer.try_push(request.to_word()).is_err() {
            self.dropped += 1;
            log::trace!("line FIFO full, dropped request for line {}", request.line);
            return false;
        }
        self.sent += 1;
        if let Some(consumer) = self.shared.consumer.get() {
            consumer.unpark();
        }
        true
    }

    /// Requests accepted by the FIFO.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// Requests dropped because the FIFO was full.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.producer.occupied_len()
    }
}

impl Drop for LineSender {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        if let Some(consumer) = self.shared.consumer.get() {
            consumer.unpark();
        }
    }
}

impl LineReceiver {
    /// Block until a request arrives. Returns `None` once the sender is
    /// gone and the FIFO is drained.
    pub fn recv(&mut self) -> Option<LineRequest> {
        let _ = self.shared.consumer.get_or_init(thread::current);
        loop {
            if let Some(word) = self.consumer.try_pop() {
                return Some(LineRequest::from_word(word));
            }
            if self.shared.closed.load(Ordering::Acquire) {
                return self.consumer.try_pop().map(LineRequest::from_word);
            }
            thread::park_timeout(PARK_TIMEOUT);
        }
    }

    pub fn try_recv(&mut self) -> Option<LineRequest> {
        self.consumer.try_pop().map(LineRequest::from_word)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}
