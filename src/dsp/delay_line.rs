//! Delay Line
//!
//! Fixed-capacity ring buffer with independent read and write cursors.
//! The write cursor leads the read cursor by the delay length, so a
//! sample pushed now is popped `offset` pushes later.

use crate::error::{FxError, Result};

/// Single-channel ring buffer used as a bounded delay line
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    read_pos: usize,
    write_pos: usize,
}

impl DelayLine {
    /// Allocate a zeroed delay line of `capacity` samples
    ///
    /// Allocation failure is reported instead of aborting, so a host can
    /// refuse to create the unit.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|e| FxError::OutOfMemory {
                details: format!("delay line of {} samples: {}", capacity, e),
            })?;
        buffer.resize(capacity, 0.0);

        Ok(Self {
            buffer,
            read_pos: 0,
            write_pos: 0,
        })
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Distance from read to write cursor, modulo capacity
    pub fn offset(&self) -> usize {
        (self.write_pos + self.capacity() - self.read_pos) % self.capacity()
    }

    /// Zero the contents, put the read cursor at the start and the write
    /// cursor `offset` samples ahead of it
    pub fn clear(&mut self, offset: isize) {
        self.buffer.fill(0.0);
        self.read_pos = 0;
        self.write_pos = self.wrap(offset);
    }

    /// Move the write cursor by `delta` samples, wrapping in both directions
    pub fn shift_write(&mut self, delta: isize) {
        self.write_pos = (self.write_pos + self.wrap(delta)) % self.capacity();
    }

    /// Store a sample at the write cursor and advance it
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Fetch the sample at the read cursor and advance it
    #[inline]
    pub fn pop(&mut self) -> f32 {
        let sample = self.buffer[self.read_pos];
        self.read_pos += 1;
        if self.read_pos == self.buffer.len() {
            self.read_pos = 0;
        }
        sample
    }

    /// Whether every stored sample is zero
    pub fn is_silent(&self) -> bool {
        self.buffer.iter().all(|&s| s == 0.0)
    }

    #[inline]
    fn wrap(&self, pos: isize) -> usize {
        pos.rem_euclid(self.buffer.len() as isize) as usize
    }
}
