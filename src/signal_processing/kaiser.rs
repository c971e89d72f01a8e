use std::f64::consts::PI;

use crate::error::{CwaveError, Result};
use crate::signal_processing::bessel::bessel_i0;

/// Order and shape of a Kaiser-windowed Hilbert FIR filter
///
/// The order M is even and the group delay M/2 is odd, so every stored tap
/// sits at an odd offset from the center and is non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    order: usize,
    beta: f64,
}

impl FilterSpec {
    /// Validate an order and beta pair
    ///
    /// # Errors
    /// Returns `CwaveError::Config` if M < 2, M is odd, M/2 is even, or beta
    /// is negative. Use [`normalize_order`] beforehand to repair the order.
    pub fn new(order: usize, beta: f64) -> Result<Self> {
        if order < 2 || order % 2 != 0 || (order / 2) % 2 == 0 {
            return Err(CwaveError::Config(format!(
                "Hilbert FIR order {} must be even with an odd half",
                order
            )));
        }
        if !(beta >= 0.0) {
            return Err(CwaveError::Config(format!(
                "Kaiser beta must be non-negative, got {}",
                beta
            )));
        }
        Ok(Self { order, beta })
    }

    /// Filter order M (length of the per-channel delay line)
    pub fn order(&self) -> usize {
        self.order
    }

    /// Group delay in samples, M/2
    pub fn delay(&self) -> usize {
        self.order / 2
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

/// Largest filter order the CWAVE header's signed order field can carry
pub const MAX_FILTER_ORDER: u32 = i32::MAX as u32;

/// Raise an order to the nearest valid Hilbert FIR order
///
/// An odd order is bumped by one, an order whose half is even by two, and
/// anything below 2 becomes 2.
///
/// # Errors
/// Returns `CwaveError::Config` if the repaired order exceeds
/// [`MAX_FILTER_ORDER`].
pub fn normalize_order(order: u32) -> Result<u32> {
    let too_large = || {
        CwaveError::Config(format!(
            "Hilbert FIR order {} is too large, the maximum is {}",
            order, MAX_FILTER_ORDER
        ))
    };
    let mut repaired = order;
    if repaired % 2 == 1 {
        repaired = repaired.checked_add(1).ok_or_else(too_large)?;
        log::warn!("Order of Hilbert FIR filter must be even, using {}", repaired);
    }
    if (repaired / 2) % 2 == 0 {
        repaired = repaired.checked_add(2).ok_or_else(too_large)?;
        log::warn!("Order / 2 of Hilbert FIR filter must be odd, using {}", repaired);
    }
    if repaired > MAX_FILTER_ORDER {
        return Err(too_large());
    }
    Ok(repaired)
}

/// Compute the n-th Hilbert FIR coefficient, n in [0, M]
///
/// Kaiser window times the ideal Hilbert response 2/(pi d) at odd offsets
/// d = n - M/2; even offsets, including the center tap, are zero. Out of
/// range indices return zero.
pub fn filter_coeff(n: usize, order: usize, beta: f64) -> f64 {
    if n > order || order < 2 {
        return 0.0;
    }
    let n_delay = (order / 2) as f64;
    let offset = n as i64 - (order / 2) as i64;
    if offset % 2 == 0 {
        return 0.0;
    }
    let d = offset as f64;
    let ratio = d / n_delay;
    let window = bessel_i0(beta * (1.0 - ratio * ratio).sqrt()) / bessel_i0(beta);
    window * 2.0 / (PI * d)
}

/// Even-index taps of a designed Hilbert FIR filter
///
/// `taps()[k]` holds the coefficient at n = 2k for k in 0..=M/2. The odd-index
/// coefficients are identically zero and are never stored.
#[derive(Debug, Clone)]
pub struct FilterTaps {
    spec: FilterSpec,
    taps: Vec<f64>,
}

impl FilterTaps {
    /// Design the taps for a validated order and beta
    pub fn design(spec: FilterSpec) -> Self {
        let taps = (0..=spec.delay())
            .map(|k| filter_coeff(2 * k, spec.order(), spec.beta()))
            .collect();
        Self { spec, taps }
    }

    pub fn spec(&self) -> FilterSpec {
        self.spec
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_filter_spec_rejects_invalid_orders() {
        assert!(FilterSpec::new(0, 1.0).is_err());
        assert!(FilterSpec::new(5, 1.0).is_err());
        assert!(FilterSpec::new(8, 1.0).is_err());
        assert!(FilterSpec::new(6, -0.5).is_err());
        assert!(FilterSpec::new(2, 0.0).is_ok());
        assert!(FilterSpec::new(140_002, 2.629).is_ok());
    }

    #[test]
    fn test_normalize_order() {
        assert_eq!(normalize_order(0).unwrap(), 2);
        assert_eq!(normalize_order(1).unwrap(), 2);
        assert_eq!(normalize_order(2).unwrap(), 2);
        assert_eq!(normalize_order(4).unwrap(), 6);
        assert_eq!(normalize_order(5).unwrap(), 6);
        assert_eq!(normalize_order(7).unwrap(), 10);
        assert_eq!(normalize_order(140_002).unwrap(), 140_002);
        assert_eq!(normalize_order(140_000).unwrap(), 140_002);
    }

    #[test]
    fn test_normalize_order_rejects_huge_orders() {
        for order in [u32::MAX, u32::MAX - 1, u32::MAX - 2, MAX_FILTER_ORDER, MAX_FILTER_ORDER + 1] {
            assert!(
                matches!(normalize_order(order), Err(CwaveError::Config(_))),
                "order {} should be rejected",
                order
            );
        }
        // Largest valid order
        assert_eq!(normalize_order(MAX_FILTER_ORDER - 1).unwrap(), MAX_FILTER_ORDER - 1);
    }

    #[test]
    fn test_center_tap_is_zero() {
        for (m, beta) in [(2, 0.0), (6, 2.629), (142, 5.0), (1002, 8.5)] {
            assert_eq!(filter_coeff(m / 2, m, beta), 0.0);
        }
    }

    #[test]
    fn test_taps_are_antisymmetric() {
        for (m, beta) in [(6, 0.0), (30, 2.629), (142, 6.0), (1002, 12.0)] {
            for n in 0..=m {
                assert_eq!(
                    filter_coeff(n, m, beta),
                    -filter_coeff(m - n, m, beta),
                    "antisymmetry broken at n = {} for M = {}",
                    n,
                    m
                );
            }
        }
    }

    #[test]
    fn test_odd_offsets_are_zero() {
        let m = 30;
        for n in (1..m).step_by(2) {
            assert_eq!(filter_coeff(n, m, 2.629), 0.0);
        }
    }

    #[test]
    fn test_rectangular_window_matches_ideal_response() {
        // beta = 0 turns the Kaiser window into a rectangle
        let m = 10;
        assert_relative_eq!(filter_coeff(4, m, 0.0), -2.0 / PI, max_relative = 1e-15);
        assert_relative_eq!(filter_coeff(6, m, 0.0), 2.0 / PI, max_relative = 1e-15);
        assert_relative_eq!(filter_coeff(2, m, 0.0), -2.0 / (3.0 * PI), max_relative = 1e-15);
    }

    #[test]
    fn test_design_stores_even_index_taps() {
        let spec = FilterSpec::new(14, 2.629).unwrap();
        let taps = FilterTaps::design(spec);
        assert_eq!(taps.len(), 8);
        for (k, &tap) in taps.taps().iter().enumerate() {
            assert_eq!(tap, filter_coeff(2 * k, 14, 2.629));
            assert!(tap != 0.0);
        }
        // First half negative, second half positive
        assert!(taps.taps()[0] < 0.0);
        assert!(taps.taps()[7] > 0.0);
    }

    #[test]
    fn test_out_of_range_index_is_zero() {
        assert_eq!(filter_coeff(15, 14, 2.629), 0.0);
    }
}
