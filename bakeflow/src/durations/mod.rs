//! Stage duration strategies.
//!
//! The pipeline never touches a global random source. Every stage asks the
//! [`DurationSource`] it was built with for a duration in time units, which
//! keeps runs reproducible under test and thread-safe under concurrency.

mod random;
mod scripted;

pub use random::RandomDurationSource;
pub use scripted::ScriptedDurationSource;

use crate::core::StageName;
use serde::{Deserialize, Serialize};

/// Inclusive range of durations a stage may draw, in time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Shortest duration.
    pub min: u64,
    /// Longest duration.
    pub max: u64,
}

impl StageTiming {
    /// Creates a new timing range.
    #[must_use]
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A range that always yields `units`.
    #[must_use]
    pub const fn fixed(units: u64) -> Self {
        Self::new(units, units)
    }

    /// Returns true if `min <= max`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Returns true if `units` lies within the range.
    #[must_use]
    pub fn contains(&self, units: u64) -> bool {
        (self.min..=self.max).contains(&units)
    }
}

/// Strategy producing stage durations.
pub trait DurationSource: Send + Sync {
    /// Draws the duration for one execution of `stage`.
    fn draw(&self, stage: StageName, timing: StageTiming) -> u64;
}

impl<F> DurationSource for F
where
    F: Fn(StageName, StageTiming) -> u64 + Send + Sync,
{
    fn draw(&self, stage: StageName, timing: StageTiming) -> u64 {
        self(stage, timing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Durations {}

        impl DurationSource for Durations {
            fn draw(&self, stage: StageName, timing: StageTiming) -> u64;
        }
    }

    #[test]
    fn test_stage_timing() {
        let timing = StageTiming::new(3, 8);
        assert!(timing.is_valid());
        assert!(timing.contains(3));
        assert!(timing.contains(8));
        assert!(!timing.contains(9));
        assert!(!StageTiming::new(5, 1).is_valid());
        assert_eq!(StageTiming::fixed(1), StageTiming::new(1, 1));
    }

    #[test]
    fn test_closure_is_a_duration_source() {
        let source = |stage: StageName, timing: StageTiming| match stage {
            StageName::Bake => timing.max,
            _ => timing.min,
        };

        assert_eq!(source.draw(StageName::Bake, StageTiming::new(3, 8)), 8);
        assert_eq!(source.draw(StageName::Make, StageTiming::new(1, 2)), 1);
    }

    #[test]
    fn test_mock_duration_source() {
        let mut mock = MockDurations::new();
        mock.expect_draw()
            .withf(|stage, _| *stage == StageName::Bake)
            .times(1)
            .return_const(5u64);

        assert_eq!(mock.draw(StageName::Bake, StageTiming::new(3, 8)), 5);
    }
}
