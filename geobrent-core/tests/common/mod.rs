//! Shared fixtures for integration tests.
//!
//! Noise comes from a fixed splitmix64 stream so scenario data is identical on
//! every platform and run.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use geobrent_core::domain::PricePoint;

pub struct Noise {
    state: u64,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Standard normal draw (Box-Muller, cosine branch).
    pub fn gauss(&mut self) -> f64 {
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Concatenate `(count, level, sd)` segments with noise from one stream.
pub fn segments(seed: u64, parts: &[(usize, f64, f64)]) -> Vec<f64> {
    let mut noise = Noise::new(seed);
    let mut out = Vec::new();
    for &(count, level, sd) in parts {
        for _ in 0..count {
            out.push(level + sd * noise.gauss());
        }
    }
    out
}

/// Geometric random walk from `start` with log-return standard deviation `sd`.
pub fn random_walk(seed: u64, count: usize, start: f64, sd: f64) -> Vec<f64> {
    let mut noise = Noise::new(seed);
    let mut out = Vec::with_capacity(count);
    let mut price = start;
    for i in 0..count {
        if i > 0 {
            price *= (sd * noise.gauss()).exp();
        }
        out.push(price);
    }
    out
}

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap()
}

/// One point per calendar day from `base_date()`.
pub fn daily_points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(base_date() + Duration::days(i as i64), p))
        .collect()
}
