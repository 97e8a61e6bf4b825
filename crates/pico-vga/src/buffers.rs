use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};

use crate::BufferParity;

/// The two row buffers shared by the render core (writer) and the pixel
/// DMA (reader). Pixels are RGB444 in the low 12 bits.
///
/// Access is per-pixel relaxed; the request protocol keeps the writer one
/// line away from the row being scanned, so no further ordering is needed.
#[derive(Debug)]
pub struct ScanlineBuffers {
    rows: [Box<[AtomicU16]>; 2],
    published: AtomicU64,
}

impl ScanlineBuffers {
    #[must_use]
    pub fn new(width: usize) -> Self {
        let row = || (0..width).map(|_| AtomicU16::new(0)).collect::<Box<[_]>>();
        Self {
            rows: [row(), row()],
            published: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Store `pixels` into the row selected by `parity`. Extra pixels are
    /// ignored; a short slice leaves the tail untouched.
    pub fn publish(&self, parity: BufferParity, pixels: &[u16]) {
        for (slot, &px) in self.rows[parity.index()].iter().zip(pixels) {
            slot.store(px, Ordering::Relaxed);
        }
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Rows published since start-up.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Copy the row selected by `parity` into `out`.
    pub fn copy_out(&self, parity: BufferParity, out: &mut [u16]) {
        for (dst, slot) in out.iter_mut().zip(self.rows[parity.index()].iter()) {
            *dst = slot.load(Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn pixel(&self, parity: BufferParity, x: usize) -> Option<u16> {
        self.rows[parity.index()].get(x).map(|slot| slot.load(Ordering::Relaxed))
    }
}
