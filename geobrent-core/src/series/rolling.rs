//! Sliding-window accumulator for rolling mean and standard deviation.
//!
//! Keeps a running sum and sum of squares so each push is O(1). A value only
//! ever enters the window after every earlier value, so a statistic emitted at
//! step i cannot see anything past i.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling period must be >= 1");
        Self {
            period,
            values: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Add a value, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
        if self.values.len() > self.period {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    /// Window mean, once the window has filled.
    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        Some(self.sum / self.period as f64)
    }

    /// Sample standard deviation (n - 1), once the window has filled.
    pub fn sample_std(&self) -> Option<f64> {
        if !self.is_full() || self.period < 2 {
            return None;
        }
        let n = self.period as f64;
        // Running sums can drift slightly negative on flat windows.
        let variance = ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0);
        Some(variance.sqrt())
    }
}
