//! Severity band classification
//!
//! Global invariants enforced:
//! - Bands are ordered ascending, inclusive on both ends
//! - Adjacent bands leave no gap at one-decimal resolution
//! - Comparison happens in integer tenths, so 3.9 and 4.0 never straddle a
//!   float representation error

use crate::error::SchemeError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named score range, `[lower, upper]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityBand {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// Ordered table of severity bands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityScale {
    bands: Vec<SeverityBand>,
}

/// Score expressed in whole tenths
fn tenths(score: f64) -> i64 {
    (score * 10.0).round() as i64
}

impl SeverityScale {
    pub fn new(bands: Vec<SeverityBand>) -> Result<Self, SchemeError> {
        let invalid = |msg: String| SchemeError::InvalidSeverityScale(msg);

        if bands.is_empty() {
            return Err(invalid("no bands defined".to_string()));
        }

        for (i, band) in bands.iter().enumerate() {
            if band.name.trim().is_empty() {
                return Err(invalid(format!("band #{} has an empty name", i + 1)));
            }
            if !band.lower.is_finite() || !band.upper.is_finite() || band.lower < 0.0 {
                return Err(invalid(format!(
                    "band `{}` must have finite, non-negative bounds",
                    band.name
                )));
            }
            if tenths(band.lower) > tenths(band.upper) {
                return Err(invalid(format!(
                    "band `{}` has lower bound {} above upper bound {}",
                    band.name, band.lower, band.upper
                )));
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &bands[p]) {
                if tenths(band.lower) != tenths(prev.upper) + 1 {
                    return Err(invalid(format!(
                        "band `{}` must start 0.1 above `{}` (expected {:.1}, got {:.1})",
                        band.name,
                        prev.name,
                        prev.upper + 0.1,
                        band.lower
                    )));
                }
            }
        }

        Ok(SeverityScale { bands })
    }

    /// Build bands from upper bounds only
    ///
    /// The first band starts at 0.0; every later band starts 0.1 above the
    /// previous band's upper bound.
    pub fn from_upper_bounds<I, S>(bounds: I) -> Result<Self, SchemeError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut bands: Vec<SeverityBand> = Vec::new();
        for (name, upper) in bounds {
            let lower = match bands.last() {
                Some(prev) => (tenths(prev.upper) + 1) as f64 / 10.0,
                None => 0.0,
            };
            bands.push(SeverityBand {
                name: name.into(),
                lower,
                upper,
            });
        }
        Self::new(bands)
    }

    pub fn bands(&self) -> &[SeverityBand] {
        &self.bands
    }

    /// Lowest score any band covers
    pub fn min(&self) -> f64 {
        self.bands.first().map_or(0.0, |b| b.lower)
    }

    /// Highest score any band covers
    pub fn max(&self) -> f64 {
        self.bands.last().map_or(0.0, |b| b.upper)
    }

    /// Check that the bands span exactly `[0, max]`
    pub(crate) fn check_covers(&self, max: f64) -> Result<(), SchemeError> {
        if tenths(self.min()) != 0 || tenths(self.max()) != tenths(max) {
            return Err(SchemeError::InvalidSeverityScale(format!(
                "bands cover [{:.1}, {:.1}] but scores range over [0.0, {:.1}]",
                self.min(),
                self.max(),
                max
            )));
        }
        Ok(())
    }

    /// Name of the first band containing `score`
    ///
    /// `None` means the score lies outside every band. A correctly computed
    /// score never does, so this points at inconsistent scheme data.
    pub fn classify(&self, score: f64) -> Option<&str> {
        if !score.is_finite() {
            warn!(score, "cannot classify non-finite score");
            return None;
        }

        let t = tenths(score);
        let band = self
            .bands
            .iter()
            .find(|b| tenths(b.lower) <= t && t <= tenths(b.upper));

        if band.is_none() {
            warn!(score, "score falls outside every severity band");
        }
        band.map(|b| b.name.as_str())
    }
}
