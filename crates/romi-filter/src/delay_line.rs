use crate::error::{FilterError, Result};

/// Ring buffer of the most recent `capacity` samples.
///
/// Starts zero-filled. `get(0)` is the newest sample, `get(capacity - 1)`
/// the oldest.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayLine {
    samples: Box<[f32]>,
    /// Index of the most recently written sample.
    cursor: usize,
}

impl DelayLine {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FilterError::ZeroCapacity);
        }
        Ok(Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
            cursor: capacity - 1,
        })
    }

    /// Append a sample, overwriting the oldest.
    pub fn push(&mut self, x: f32) {
        self.cursor = (self.cursor + 1) % self.samples.len();
        self.samples[self.cursor] = x;
    }

    /// Sample written `lag` pushes ago.
    pub fn get(&self, lag: usize) -> Result<f32> {
        let capacity = self.samples.len();
        if lag >= capacity {
            return Err(FilterError::LagOutOfRange { lag, capacity });
        }
        Ok(self.samples[(self.cursor + capacity - lag) % capacity])
    }

    /// Sum of every slot, including never-written zeros.
    pub fn sum(&self) -> f32 {
        self.samples.iter().sum()
    }

    /// `Σ coeffs[i] * get(i)` over the shorter of the two lengths.
    pub fn fir(&self, coeffs: &[f32]) -> f32 {
        let capacity = self.samples.len();
        coeffs
            .iter()
            .take(capacity)
            .enumerate()
            .map(|(lag, b)| b * self.samples[(self.cursor + capacity - lag) % capacity])
            .sum()
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Zero every sample.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.cursor = self.samples.len() - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(DelayLine::new(0).unwrap_err(), FilterError::ZeroCapacity);
    }

    #[test]
    fn starts_zeroed() {
        let line = DelayLine::new(3).unwrap();
        assert_eq!(line.capacity(), 3);
        for lag in 0..3 {
            assert_eq!(line.get(lag).unwrap(), 0.0);
        }
        assert_eq!(line.sum(), 0.0);
    }

    #[test]
    fn newest_sample_is_lag_zero() {
        let mut line = DelayLine::new(4).unwrap();
        line.push(1.0);
        line.push(2.0);
        line.push(3.0);

        assert_eq!(line.get(0).unwrap(), 3.0);
        assert_eq!(line.get(1).unwrap(), 2.0);
        assert_eq!(line.get(2).unwrap(), 1.0);
        assert_eq!(line.get(3).unwrap(), 0.0);
    }

    #[test]
    fn full_line_round_trip() {
        let capacity = 5;
        let mut line = DelayLine::new(capacity).unwrap();
        let values: Vec<f32> = (0..=capacity).map(|i| i as f32 * 1.5 - 2.0).collect();

        for &v in &values[..capacity] {
            line.push(v);
        }
        assert_eq!(line.get(capacity - 1).unwrap(), values[0]);
        for lag in 0..capacity {
            assert_eq!(line.get(lag).unwrap(), values[capacity - 1 - lag]);
        }

        line.push(values[capacity]);
        assert_eq!(line.get(0).unwrap(), values[capacity]);
        assert_eq!(line.get(capacity - 1).unwrap(), values[1]);
    }

    #[test]
    fn push_overwrites_oldest() {
        let mut line = DelayLine::new(3).unwrap();
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            line.push(x);
        }

        assert_eq!(line.get(0).unwrap(), 5.0);
        assert_eq!(line.get(2).unwrap(), 3.0);
        assert_eq!(line.sum(), 12.0);
    }

    #[test]
    fn lag_at_capacity_is_out_of_range() {
        let line = DelayLine::new(2).unwrap();
        assert_eq!(
            line.get(2).unwrap_err(),
            FilterError::LagOutOfRange {
                lag: 2,
                capacity: 2
            }
        );
    }

    #[test]
    fn single_tap_fir_is_newest_sample() {
        let mut line = DelayLine::new(5).unwrap();
        for x in [0.5, -1.25, 7.0] {
            line.push(x);
            assert_eq!(line.fir(&[1.0]), line.get(0).unwrap());
        }
    }

    #[test]
    fn fir_truncates_to_shorter_length() {
        let mut line = DelayLine::new(2).unwrap();
        line.push(1.0);
        line.push(2.0);

        // Extra coefficients past the capacity are ignored.
        assert_eq!(line.fir(&[1.0, 10.0, 100.0]), 2.0 + 10.0);
        assert_eq!(line.fir(&[]), 0.0);
    }

    #[test]
    fn moving_average() {
        let mut line = DelayLine::new(4).unwrap();
        for x in [2.0, 4.0, 6.0, 8.0, 10.0] {
            line.push(x);
        }
        assert_eq!(line.fir(&[0.25; 4]), 7.0);
    }

    #[test]
    fn capacity_one() {
        let mut line = DelayLine::new(1).unwrap();
        line.push(9.0);
        line.push(3.0);
        assert_eq!(line.get(0).unwrap(), 3.0);
        assert_eq!(line.sum(), 3.0);
    }

    #[test]
    fn clear_resets_samples() {
        let mut line = DelayLine::new(3).unwrap();
        line.push(1.0);
        line.clear();
        assert_eq!(line.sum(), 0.0);
        line.push(4.0);
        assert_eq!(line.get(0).unwrap(), 4.0);
    }
}
