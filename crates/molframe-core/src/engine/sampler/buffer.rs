use crate::core::models::sample::EnergySample;
use std::collections::VecDeque;

/// Bounded FIFO of energy samples; the oldest sample is evicted first.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<EnergySample>,
    capacity: usize,
}

impl SampleBuffer {
    /// `capacity` is clamped to at least one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, returning the evicted one when the buffer was full.
    pub fn push(&mut self, sample: EnergySample) -> Option<EnergySample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&EnergySample> {
        self.samples.back()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &EnergySample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<EnergySample> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sequence: u64) -> EnergySample {
        EnergySample::new(sequence, sequence as f64 * 0.2, 0.0, 0.0)
    }

    #[test]
    fn buffer_keeps_most_recent_samples_in_order() {
        let mut buffer = SampleBuffer::new(150);
        for i in 0..151 {
            buffer.push(sample(i));
        }
        assert_eq!(buffer.len(), 150);
        let sequences: Vec<_> = buffer.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, (1..151).collect::<Vec<_>>());
        assert_eq!(buffer.latest().unwrap().sequence, 150);
    }

    #[test]
    fn push_reports_evicted_sample() {
        let mut buffer = SampleBuffer::new(2);
        assert!(buffer.push(sample(0)).is_none());
        assert!(buffer.push(sample(1)).is_none());
        assert_eq!(buffer.push(sample(2)).unwrap().sequence, 0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = SampleBuffer::new(0);
        buffer.push(sample(0));
        buffer.push(sample(1));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.to_vec(), vec![sample(1)]);
    }

    #[test]
    fn new_buffer_is_empty() {
        let buffer = SampleBuffer::new(150);
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }
}
