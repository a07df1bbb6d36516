use crate::config::DEFAULT_HEADING_ALPHA;
use crate::geodesy::{interpolate_bearing, normalize_bearing};

/// Single-pole low-pass filter on compass headings.
///
/// The filter itself is stateless; its memory is the `smoothed_course` field of
/// the playback state so that resetting the state resets the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSmoother {
    alpha: f64,
}

impl Default for HeadingSmoother {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_HEADING_ALPHA,
        }
    }
}

impl HeadingSmoother {
    /// `alpha` outside `(0, 1]` falls back to the default coefficient.
    pub fn new(alpha: f64) -> Self {
        if alpha > 0.0 && alpha <= 1.0 {
            Self { alpha }
        } else {
            Self::default()
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn next(&self, prior: Option<f64>, target: f64) -> f64 {
        match prior {
            None => normalize_bearing(target),
            Some(prior) => interpolate_bearing(prior, target, self.alpha),
        }
    }

    /// Feed a raw reading, updating `memory` in place.
    pub fn update(&self, memory: &mut Option<f64>, target: f64) -> f64 {
        let next = self.next(*memory, target);
        *memory = Some(next);
        next
    }
}
