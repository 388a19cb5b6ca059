// Size schedule: the fixed per-layer channel-width progression.
//
// The hierarchy widens with depth: the base hidden-width sequence is
// (3, 16, 32, 64, 128, 256, 512). Each layer's error signal doubles the
// hidden width (positive and negative rectified halves), and each layer
// above the bottom consumes the error of the layer below as its input.

use std::fmt;

/// Base hidden widths: 3 frame channels at the bottom, then powers of two.
pub const BASE_WIDTHS: [usize; 7] = [3, 16, 32, 64, 128, 256, 512];

/// Maximum supported stack depth.
pub const MAX_LAYERS: usize = BASE_WIDTHS.len();

// ── Errors ───────────────────────────────────────────────────────────

/// Configuration failures during schedule / stack construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Requested a zero-layer stack.
    NoLayers,
    /// Requested more layers than the base width sequence supports.
    TooManyLayers { requested: usize, max: usize },
    /// A frame dimension cannot be halved down through the stack.
    OddSpatialDim { dim: &'static str, size: usize, layer: usize },
    /// An error-init shape's channel count disagrees with the schedule.
    ChannelMismatch { layer: usize, expected: usize, got: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoLayers => write!(f, "stack must have at least one layer"),
            ConfigError::TooManyLayers { requested, max } => {
                write!(f, "requested {requested} layers but at most {max} are supported")
            }
            ConfigError::OddSpatialDim { dim, size, layer } => {
                write!(f, "{dim}={size} is not divisible by 2 at layer {layer}")
            }
            ConfigError::ChannelMismatch { layer, expected, got } => {
                write!(f, "error-init channels at layer {layer} must be {expected}, got {got}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ── Schedule ─────────────────────────────────────────────────────────

/// Per-layer channel widths for a stack of `out.len()` layers.
///
/// Derived once at construction and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeSchedule {
    /// Hidden width of each layer's generative state output.
    pub out: Vec<usize>,
    /// Error width of each layer: `2 * out[l]`.
    pub err: Vec<usize>,
    /// Input width of each layer: 3 raw frame channels at the bottom,
    /// the error width of the layer below elsewhere.
    pub input: Vec<usize>,
}

impl SizeSchedule {
    pub fn layers(&self) -> usize {
        self.out.len()
    }
}

/// Compute the width schedule for a stack of `max_layers` layers.
pub fn size_schedule(max_layers: usize) -> Result<SizeSchedule, ConfigError> {
    if max_layers == 0 {
        return Err(ConfigError::NoLayers);
    }
    if max_layers > MAX_LAYERS {
        return Err(ConfigError::TooManyLayers { requested: max_layers, max: MAX_LAYERS });
    }

    let out: Vec<usize> = BASE_WIDTHS[..max_layers].to_vec();
    let err: Vec<usize> = out.iter().map(|&o| 2 * o).collect();
    let mut input = Vec::with_capacity(max_layers);
    input.push(3);
    input.extend_from_slice(&err[..max_layers - 1]);

    Ok(SizeSchedule { out, err, input })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_widths() {
        let s = size_schedule(4).unwrap();
        assert_eq!(s.out, vec![3, 16, 32, 64]);
        assert_eq!(s.err, vec![6, 32, 64, 128]);
        assert_eq!(s.input, vec![3, 6, 32, 64]);
        assert_eq!(s.layers(), 4);
    }

    #[test]
    fn test_schedule_single_layer() {
        let s = size_schedule(1).unwrap();
        assert_eq!(s.out, vec![3]);
        assert_eq!(s.err, vec![6]);
        assert_eq!(s.input, vec![3]);
    }

    #[test]
    fn test_schedule_full_depth() {
        let s = size_schedule(MAX_LAYERS).unwrap();
        assert_eq!(*s.out.last().unwrap(), 512);
        assert_eq!(*s.err.last().unwrap(), 1024);
        assert_eq!(*s.input.last().unwrap(), 512);
    }

    #[test]
    fn test_schedule_rejects_zero() {
        assert_eq!(size_schedule(0), Err(ConfigError::NoLayers));
    }

    #[test]
    fn test_schedule_rejects_too_deep() {
        assert_eq!(
            size_schedule(8),
            Err(ConfigError::TooManyLayers { requested: 8, max: 7 })
        );
    }

    #[test]
    fn test_err_is_double_out_everywhere() {
        for l in 1..=MAX_LAYERS {
            let s = size_schedule(l).unwrap();
            for i in 0..l {
                assert_eq!(s.err[i], 2 * s.out[i]);
            }
            for i in 1..l {
                assert_eq!(s.input[i], s.err[i - 1]);
            }
        }
    }
}
