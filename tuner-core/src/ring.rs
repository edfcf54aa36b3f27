//! # Sample Ring
//!
//! Fixed-capacity sliding buffer that accumulates incoming chunks into the
//! longer analysis window. Each insertion of `C` samples discards the `C`
//! oldest ones and appends the new chunk at the tail, so the buffer always
//! holds the most recent `capacity` samples in temporal order.

use crate::error::{AnalysisError, Result};

/// Scale factor mapping `i16` PCM onto `[-1.0, 1.0)`.
const I16_SCALE: f32 = 1.0 / 32768.0;

/// Strict FIFO of fixed length, zero-filled at creation.
#[derive(Debug, Clone)]
pub struct SampleRing {
    samples: Vec<f32>,
}

impl SampleRing {
    /// Creates a zero-filled ring holding `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Current contents, oldest sample first.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Pushes a chunk of normalized samples.
    ///
    /// Fails with `InvalidChunkSize` when the chunk is larger than the ring;
    /// the buffer is left untouched in that case.
    pub fn push(&mut self, chunk: &[f32]) -> Result<()> {
        let tail = self.make_room(chunk.len())?;
        tail.copy_from_slice(chunk);
        Ok(())
    }

    /// Pushes a chunk of 16-bit PCM, normalizing it on the way in.
    pub fn push_pcm(&mut self, chunk: &[i16]) -> Result<()> {
        let tail = self.make_room(chunk.len())?;
        for (slot, &sample) in tail.iter_mut().zip(chunk) {
            *slot = sample as f32 * I16_SCALE;
        }
        Ok(())
    }

    /// Zeroes every sample without reallocating.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Shifts the contents left by `len` and returns the freed tail.
    fn make_room(&mut self, len: usize) -> Result<&mut [f32]> {
        let capacity = self.samples.len();
        if len > capacity {
            return Err(AnalysisError::InvalidChunkSize {
                chunk: len,
                capacity,
            });
        }
        self.samples.copy_within(len.., 0);
        Ok(&mut self.samples[capacity - len..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_newest_samples_in_order() {
        let mut ring = SampleRing::new(6);
        ring.push(&[1.0, 2.0]).unwrap();
        ring.push(&[3.0, 4.0]).unwrap();
        ring.push(&[5.0, 6.0]).unwrap();
        ring.push(&[7.0, 8.0]).unwrap();
        assert_eq!(ring.as_slice(), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn partial_fill_leaves_leading_zeros() {
        let mut ring = SampleRing::new(4);
        ring.push(&[9.0]).unwrap();
        assert_eq!(ring.as_slice(), &[0.0, 0.0, 0.0, 9.0]);
    }

    #[test]
    fn full_capacity_chunk_replaces_everything() {
        let mut ring = SampleRing::new(3);
        ring.push(&[1.0, 2.0, 3.0]).unwrap();
        ring.push(&[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(ring.as_slice(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn oversized_chunk_is_rejected_without_mutation() {
        let mut ring = SampleRing::new(3);
        ring.push(&[1.0, 2.0, 3.0]).unwrap();
        let err = ring.push(&[0.0; 4]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidChunkSize {
                chunk: 4,
                capacity: 3
            }
        );
        assert_eq!(ring.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn pcm_is_normalized() {
        let mut ring = SampleRing::new(3);
        ring.push_pcm(&[i16::MIN, 0, 16384]).unwrap();
        assert_eq!(ring.as_slice(), &[-1.0, 0.0, 0.5]);
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut ring = SampleRing::new(2);
        ring.push(&[1.0, 2.0]).unwrap();
        ring.push(&[]).unwrap();
        assert_eq!(ring.as_slice(), &[1.0, 2.0]);
    }
}
