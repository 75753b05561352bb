//! Randomised failure injection for row sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nutype::nutype;
use rand::{random, rngs::StdRng, Rng, SeedableRng};
use rowcursor::{ReleaseError, RowSource};
use thiserror::Error;

/// Probability value for chaos injection rates.
///
/// Probability represents a value in the range [0.0, 1.0] where 0.0 means
/// never inject failures and 1.0 means always inject failures.
///
/// # Examples
///
/// ```ignore
/// use rowcursor_testing::chaos::Probability;
///
/// let never = Probability::try_new(0.0).unwrap();
/// let sometimes = Probability::try_new(0.5).unwrap();
///
/// // Values outside [0.0, 1.0] are rejected
/// assert!(Probability::try_new(1.5).is_err());
/// ```
#[nutype(
    validate(greater_or_equal = 0.0, less_or_equal = 1.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into)
)]
pub struct Probability(f32);

/// How a [`ChaosRowSource`] injects failures.
#[derive(Debug, Clone)]
pub struct ChaosConfig {
    deterministic_seed: Option<u64>,
    failure_probability: Probability,
}

impl ChaosConfig {
    /// Seeded configuration: the same seed injects the same failures.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            deterministic_seed: Some(seed),
            ..Self::default()
        }
    }

    /// Chance that any single pull fails. Clamped to [0.0, 1.0].
    #[must_use]
    pub fn with_failure_probability(mut self, probability: f32) -> Self {
        self.failure_probability = Probability::try_new(probability.clamp(0.0, 1.0))
            .expect("clamped value is always valid");
        self
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            deterministic_seed: None,
            failure_probability: Probability::try_new(0.0).expect("0.0 is valid probability"),
        }
    }
}

/// Error from a [`ChaosRowSource`].
#[derive(Debug, Error)]
pub enum ChaosError<E> {
    /// Failure injected instead of pulling
    #[error("injected row source failure on pull {pull}")]
    Injected {
        /// 1-based pull number
        pull: usize,
    },

    /// Failure from the wrapped source
    #[error(transparent)]
    Source(E),
}

/// Extension for wrapping a row source in chaos.
pub trait ChaosRowSourceExt: Sized {
    /// Wraps `self` so that pulls fail according to `config`.
    fn with_chaos(self, config: ChaosConfig) -> ChaosRowSource<Self>;
}

impl<S: RowSource> ChaosRowSourceExt for S {
    fn with_chaos(self, config: ChaosConfig) -> ChaosRowSource<Self> {
        ChaosRowSource::new(self, config)
    }
}

/// Row source wrapper that fails pulls at random.
///
/// An injected failure does not consume a row from the wrapped source.
#[derive(Debug)]
pub struct ChaosRowSource<S> {
    source: S,
    config: ChaosConfig,
    rng: StdRng,
    pulls: usize,
    injected: Arc<AtomicUsize>,
}

impl<S> ChaosRowSource<S> {
    /// Wraps `source`.
    pub fn new(source: S, config: ChaosConfig) -> Self {
        let rng = match config.deterministic_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(random()),
        };

        Self {
            source,
            config,
            rng,
            pulls: 0,
            injected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of injected failures
    pub fn injected_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.injected)
    }

    fn should_inject(&mut self) -> bool {
        let probability: f32 = self.config.failure_probability.into();

        if probability <= 0.0 {
            return false;
        }

        if probability >= 1.0 {
            return true;
        }

        self.rng.random_bool(f64::from(probability))
    }
}

impl<S: RowSource> RowSource for ChaosRowSource<S> {
    type Row = S::Row;
    type Error = ChaosError<S::Error>;

    fn pull_next(&mut self) -> Result<Option<Self::Row>, Self::Error> {
        self.pulls += 1;
        if self.should_inject() {
            self.injected.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(pull = self.pulls, "injecting row source failure");
            return Err(ChaosError::Injected { pull: self.pulls });
        }
        self.source.pull_next().map_err(ChaosError::Source)
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        self.source.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcursor_memory::VecRowSource;

    fn pattern(seed: u64) -> Vec<bool> {
        let mut source = VecRowSource::new(0..64)
            .with_chaos(ChaosConfig::deterministic(seed).with_failure_probability(0.5));
        (0..64).map(|_| source.pull_next().is_err()).collect()
    }

    #[test]
    fn zero_probability_passes_through() {
        let mut source = VecRowSource::new(["a", "b"]).with_chaos(ChaosConfig::default());

        assert_eq!(source.pull_next().unwrap(), Some("a"));
        assert_eq!(source.pull_next().unwrap(), Some("b"));
        assert_eq!(source.pull_next().unwrap(), None);
    }

    #[test]
    fn full_probability_always_fails_without_consuming_rows() {
        let inner = VecRowSource::new(["a"]);
        let mut source =
            ChaosRowSource::new(inner, ChaosConfig::default().with_failure_probability(1.0));
        let injected = source.injected_counter();

        assert!(matches!(source.pull_next(), Err(ChaosError::Injected { pull: 1 })));
        assert!(matches!(source.pull_next(), Err(ChaosError::Injected { pull: 2 })));
        assert_eq!(injected.load(Ordering::SeqCst), 2);
        assert_eq!(source.source.remaining(), 1);
    }

    #[test]
    fn same_seed_injects_same_failures() {
        assert_eq!(pattern(42), pattern(42));
    }

    #[test]
    fn probability_is_clamped() {
        let config = ChaosConfig::default().with_failure_probability(7.0);
        let value: f32 = config.failure_probability.into();
        assert!((value - 1.0).abs() < f32::EPSILON);
        assert!(Probability::try_new(-0.1).is_err());
    }
}
