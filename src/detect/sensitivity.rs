//! Shared motion sensitivity threshold.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Minimum changed-pixel fraction required to declare motion, strictly in
/// (0, 1).
///
/// The handle is shared: the detector loads the value at decision time, so
/// a runtime update takes effect on the next detection call without
/// restarting the loop.
#[derive(Clone, Debug)]
pub struct Sensitivity {
    bits: Arc<AtomicU64>,
}

impl Sensitivity {
    pub fn new(value: f64) -> Result<Self> {
        validate_sensitivity(value)?;
        Ok(Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        })
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) -> Result<()> {
        validate_sensitivity(value)?;
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

pub fn validate_sensitivity(value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(anyhow!(
            "sensitivity must be strictly between 0 and 1, got {}",
            value
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Sensitivity::new(0.0).is_err());
        assert!(Sensitivity::new(1.0).is_err());
        assert!(Sensitivity::new(-0.2).is_err());
        assert!(Sensitivity::new(f64::NAN).is_err());
        assert!(Sensitivity::new(0.5).is_ok());
    }

    #[test]
    fn update_is_visible_through_clones() {
        let sensitivity = Sensitivity::new(0.1).unwrap();
        let shared = sensitivity.clone();
        sensitivity.set(0.4).unwrap();
        assert_eq!(shared.get(), 0.4);
    }
}
