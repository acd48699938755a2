//! Dataset-level category distribution.

use crate::synthesis::{Diagnosis, Record, RhythmCategory};
use serde::Serialize;

/// Record counts per diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDistribution {
    /// Normal sinus rhythm.
    pub normal: usize,
    /// Tachycardia.
    pub tachycardia: usize,
    /// Bradycardia.
    pub bradycardia: usize,
    /// Arrhythmia.
    pub arrhythmia: usize,
}

impl CategoryDistribution {
    /// Counts the diagnoses of a set of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut dist = Self::default();
        for record in records {
            dist.add(record.diagnosis());
        }
        dist
    }

    /// Adds one observation.
    pub fn add(&mut self, diagnosis: Diagnosis) {
        *self.slot(diagnosis) += 1;
    }

    /// Count for one diagnosis.
    pub fn count(&self, diagnosis: Diagnosis) -> usize {
        match diagnosis {
            Diagnosis::Normal => self.normal,
            Diagnosis::Tachycardia => self.tachycardia,
            Diagnosis::Bradycardia => self.bradycardia,
            Diagnosis::Arrhythmia => self.arrhythmia,
        }
    }

    /// Total number of observations.
    pub fn total(&self) -> usize {
        self.normal + self.tachycardia + self.bradycardia + self.arrhythmia
    }

    /// Observed share of one diagnosis; zero when empty.
    pub fn proportion(&self, diagnosis: Diagnosis) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(diagnosis) as f64 / total as f64
        }
    }

    /// Checks every observed share against the configured category
    /// weights.
    pub fn check_weights(&self, tolerance: f64) -> Result<(), DistributionViolation> {
        self.check(
            RhythmCategory::ALL.map(|c| (Diagnosis::from(c), c.weight())),
            tolerance,
        )
    }

    /// Checks observed shares against expected ones.
    pub fn check(
        &self,
        expected: impl IntoIterator<Item = (Diagnosis, f64)>,
        tolerance: f64,
    ) -> Result<(), DistributionViolation> {
        if self.total() == 0 {
            return Err(DistributionViolation::Empty);
        }

        for (diagnosis, share) in expected {
            let observed = self.proportion(diagnosis);
            if (observed - share).abs() > tolerance {
                return Err(DistributionViolation::Deviation {
                    diagnosis,
                    observed,
                    expected: share,
                    tolerance,
                });
            }
        }
        Ok(())
    }

    fn slot(&mut self, diagnosis: Diagnosis) -> &mut usize {
        match diagnosis {
            Diagnosis::Normal => &mut self.normal,
            Diagnosis::Tachycardia => &mut self.tachycardia,
            Diagnosis::Bradycardia => &mut self.bradycardia,
            Diagnosis::Arrhythmia => &mut self.arrhythmia,
        }
    }
}

/// Distribution check failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionViolation {
    #[error("no records to check")]
    Empty,

    #[error("{diagnosis} share {observed:.4} deviates from {expected:.4} by more than {tolerance:.4}")]
    Deviation {
        diagnosis: Diagnosis,
        observed: f64,
        expected: f64,
        tolerance: f64,
    },
}
