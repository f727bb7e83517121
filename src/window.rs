/// Window lifecycle shared by all parsers: accumulate, then finalize once.
use crate::accumulator::MetricAccumulator;
use crate::error::{ConfigError, StateError};
use crate::metric::MetricObservation;
use std::sync::Arc;
use tracing::debug;

/// Immutable snapshot of one window's observations.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowResult {
    observations: Arc<[MetricObservation]>,
    duration_secs: f64,
}

impl WindowResult {
    pub fn observations(&self) -> &[MetricObservation] {
        &self.observations
    }

    /// Seconds over which the observations were collected, as supplied by the caller.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[derive(Debug)]
enum Lifecycle {
    Accumulating,
    Finalized(Arc<[MetricObservation]>),
}

/// An accumulator plus the two-state lifecycle around it.
///
/// `Accumulating` until [`Window::finalize`] succeeds, then `Finalized` for
/// good. Tallies stay readable after finalization; mutation does not.
#[derive(Debug)]
pub struct Window {
    accumulator: MetricAccumulator,
    lifecycle: Lifecycle,
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    pub fn new() -> Self {
        Self {
            accumulator: MetricAccumulator::new(),
            lifecycle: Lifecycle::Accumulating,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Finalized(_))
    }

    pub fn accumulator(&self) -> &MetricAccumulator {
        &self.accumulator
    }

    /// Fails once the window is finalized.
    pub fn ensure_accumulating(&self) -> Result<(), StateError> {
        match self.lifecycle {
            Lifecycle::Accumulating => Ok(()),
            Lifecycle::Finalized(_) => Err(StateError::AlreadyFinalized {
                operation: "parse line",
            }),
        }
    }

    /// Mutable access for recording a line's metrics.
    pub fn accumulator_mut(&mut self) -> Result<&mut MetricAccumulator, StateError> {
        self.ensure_accumulating()?;
        Ok(&mut self.accumulator)
    }

    /// Close the window and return its snapshot.
    ///
    /// `duration_secs` must be finite and non-negative. Calling again returns
    /// the same observations, paired with the duration given on that call.
    pub fn finalize(&mut self, duration_secs: f64) -> Result<WindowResult, ConfigError> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(ConfigError::InvalidDuration {
                duration: duration_secs,
            });
        }

        let observations = match &self.lifecycle {
            Lifecycle::Finalized(observations) => Arc::clone(observations),
            Lifecycle::Accumulating => {
                let observations: Arc<[MetricObservation]> =
                    self.accumulator.take_observations().into();
                debug!(
                    observations = observations.len(),
                    duration_secs, "window finalized"
                );
                self.lifecycle = Lifecycle::Finalized(Arc::clone(&observations));
                observations
            }
        };

        Ok(WindowResult {
            observations,
            duration_secs,
        })
    }
}
