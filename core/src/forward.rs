// Single-step composer: one time step over the whole stack.
//
// Phase 1 runs the generative units top-down: layer l reads its own error
// and state from the previous step plus the hidden just computed for layer
// l+1. Phase 2 runs the discriminative units bottom-up: layer 0 reads the
// raw frame, layer l>0 reads the error just computed for layer l-1, and
// every layer reads the hidden just computed for itself.
//
// The caller moves the recurrent vectors in and receives fresh ones back,
// so no buffer is aliased across steps. Absent entries (the first step)
// are filled with zeros by the cells. Cell failures propagate unchanged.

use std::fmt;

use crate::discriminative::discriminative_step;
use crate::generative::{generative_step, LayerState};
use crate::model::{PredNetConfig, PredNetWires};
use crate::tape::{BufId, Tape};

// ── Errors ───────────────────────────────────────────────────────────

/// Runtime failures during a composer step. Always fatal, never recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// A tensor arrived with the wrong shape. `expected`/`got` are empty when
    /// the mismatch is presence rather than dimensions.
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// A recurrent vector does not have one entry per layer.
    LayerCountMismatch { context: &'static str, expected: usize, got: usize },
    /// The frame and target sequences have different lengths.
    SequenceLengthMismatch { frames: usize, targets: usize },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::ShapeMismatch { context, expected, got } => {
                write!(f, "{context}: shape mismatch, expected {expected:?}, got {got:?}")
            }
            StepError::LayerCountMismatch { context, expected, got } => {
                write!(f, "{context}: expected {expected} per-layer entries, got {got}")
            }
            StepError::SequenceLengthMismatch { frames, targets } => {
                write!(f, "sequence lengths disagree: {frames} frames, {targets} targets")
            }
        }
    }
}

impl std::error::Error for StepError {}

// ── Composer ─────────────────────────────────────────────────────────

/// Run one full time step: generative pass top-down, then discriminative
/// pass bottom-up. Returns the new per-layer errors and states, bottom to
/// top.
pub fn step(
    tape: &mut Tape,
    wires: &PredNetWires,
    cfg: &PredNetConfig,
    frame: BufId,
    error: Vec<Option<BufId>>,
    state: Vec<Option<LayerState>>,
) -> Result<(Vec<BufId>, Vec<LayerState>), StepError> {
    let l = cfg.num_layers();
    debug_assert_eq!(wires.num_layers(), l);
    if error.len() != l {
        return Err(StepError::LayerCountMismatch {
            context: "error vector",
            expected: l,
            got: error.len(),
        });
    }
    if state.len() != l {
        return Err(StepError::LayerCountMismatch {
            context: "state vector",
            expected: l,
            got: state.len(),
        });
    }

    // Phase 1: generative, top to bottom. Each layer sees the hidden the
    // layer above produced in this same step.
    let mut new_state: Vec<Option<LayerState>> = vec![None; l];
    let mut up_hidden: Option<BufId> = None;
    for i in (0..l).rev() {
        let s = generative_step(tape, &wires.layers[i], &cfg.layers[i], error[i], up_hidden, state[i])?;
        up_hidden = Some(s.hidden);
        new_state[i] = Some(s);
    }
    // Every slot was filled by the loop above.
    let new_state: Vec<LayerState> = new_state.into_iter().flatten().collect();

    // Phase 2: discriminative, bottom to top. Layer 0 consumes the frame,
    // layer i>0 the error just produced below it.
    let mut new_error: Vec<BufId> = Vec::with_capacity(l);
    for i in 0..l {
        let bottom = if i == 0 { frame } else { new_error[i - 1] };
        let e = discriminative_step(
            tape,
            &wires.layers[i],
            &cfg.layers[i],
            bottom,
            new_state[i].hidden,
        )?;
        new_error.push(e);
    }

    Ok((new_error, new_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{error_init_shapes, PredNetConfig, PredNetParams};
    use crate::tensor::SimpleRng;

    fn setup(layers: usize, h: usize, w: usize) -> (PredNetConfig, PredNetParams) {
        let shapes = error_init_shapes(1, h, w, layers).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let params = PredNetParams::init(&cfg, 9);
        (cfg, params)
    }

    fn random_frame(rng: &mut SimpleRng, h: usize, w: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; 3 * h * w];
        rng.fill_uniform(&mut v, 1.0);
        v
    }

    #[test]
    fn test_first_step_all_absent() {
        let (cfg, params) = setup(2, 8, 12);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        let frame_data = random_frame(&mut SimpleRng::new(1), 8, 12);
        let frame = tape.register_input(&frame_data, vec![1, 3, 8, 12]);
        let (errs, states) =
            step(&mut tape, &wires, &cfg, frame, vec![None, None], vec![None, None]).unwrap();
        assert_eq!(tape.buf_shape(errs[0]), &[1, 6, 8, 12]);
        assert_eq!(tape.buf_shape(errs[1]), &[1, 32, 4, 6]);
        assert_eq!(tape.buf_shape(states[0].hidden), &[1, 3, 8, 12]);
        assert_eq!(tape.buf_shape(states[1].hidden), &[1, 16, 4, 6]);
    }

    #[test]
    fn test_wrong_vector_length_is_fatal() {
        let (cfg, params) = setup(2, 8, 12);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        let frame = tape.zeros(&[1, 3, 8, 12]);
        let res = step(&mut tape, &wires, &cfg, frame, vec![None], vec![None, None]);
        assert!(matches!(res, Err(StepError::LayerCountMismatch { .. })));
    }

    #[test]
    fn test_second_step_consumes_first_step_outputs() {
        let (cfg, params) = setup(2, 8, 12);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        let mut rng = SimpleRng::new(2);
        let f0 = random_frame(&mut rng, 8, 12);
        let f1 = random_frame(&mut rng, 8, 12);
        let frame0 = tape.register_input(&f0, vec![1, 3, 8, 12]);
        let (errs, states) =
            step(&mut tape, &wires, &cfg, frame0, vec![None; 2], vec![None; 2]).unwrap();

        let frame1 = tape.register_input(&f1, vec![1, 3, 8, 12]);
        let error_in = errs.into_iter().map(Some).collect();
        let state_in = states.into_iter().map(Some).collect();
        let (errs1, _) = step(&mut tape, &wires, &cfg, frame1, error_in, state_in).unwrap();
        assert_eq!(tape.buf_shape(errs1[0]), &[1, 6, 8, 12]);
    }
}
