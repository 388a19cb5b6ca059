// Discriminative unit: bottom-up error computation.
//
// Projects the bottom-up input (raw frame at layer 0, the layer below's
// error elsewhere) and the layer's own state output to the hidden width,
// then emits the rectified two-sided difference. Positive and negative
// halves are kept as separate channel blocks, so the error signal carries
// twice the hidden width.
//
// Layers above the bottom max-pool the input projection, halving the
// spatial dims to this layer's resolution.

use crate::forward::StepError;
use crate::model::{LayerConfig, LayerWires};
use crate::tape::{BufId, Tape};

fn check_shape(
    tape: &Tape,
    id: BufId,
    expected: [usize; 4],
    context: &'static str,
) -> Result<(), StepError> {
    let got = tape.buf_shape(id);
    if got != expected.as_slice() {
        return Err(StepError::ShapeMismatch {
            context,
            expected: expected.to_vec(),
            got: got.to_vec(),
        });
    }
    Ok(())
}

/// Run one discriminative step. Returns the layer's error buffer,
/// shape [B, 2 * hidden, H, W].
///
/// `bottom_input` is the raw frame at layer 0 (full resolution) or the error
/// of the layer below (double resolution, pooled down here). `state_output`
/// is this layer's generative hidden, already at this layer's resolution.
pub fn discriminative_step(
    tape: &mut Tape,
    wires: &LayerWires,
    cfg: &LayerConfig,
    bottom_input: BufId,
    state_output: BufId,
) -> Result<BufId, StepError> {
    let [b, _, h, w] = cfg.error_init;
    let hid = cfg.hidden_channels;

    let (in_h, in_w) = if cfg.first { (h, w) } else { (2 * h, 2 * w) };
    check_shape(tape, bottom_input, [b, cfg.in_channels, in_h, in_w], "discriminative input")?;
    check_shape(tape, state_output, [b, hid, h, w], "discriminative state")?;

    let mut input_proj = tape.conv2d(bottom_input, wires.w_input, wires.b_input);
    if !cfg.first {
        input_proj = tape.maxpool2(input_proj);
    }
    let input_proj = tape.relu(input_proj);

    let state_proj = tape.conv2d(state_output, wires.w_state, wires.b_state);
    let state_proj = tape.relu(state_proj);

    let pos = tape.sub(input_proj, state_proj);
    let neg = tape.sub(state_proj, input_proj);
    let both = tape.concat_channels(&[pos, neg]);
    Ok(tape.relu(both))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{error_init_shapes, PredNetConfig, PredNetParams};

    fn setup(layers: usize) -> (PredNetConfig, PredNetParams) {
        let shapes = error_init_shapes(1, 8, 12, layers).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let params = PredNetParams::init(&cfg, 3);
        (cfg, params)
    }

    #[test]
    fn test_error_doubles_channels() {
        let (cfg, params) = setup(1);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        let frame = tape.zeros(&[1, 3, 8, 12]);
        let state = tape.zeros(&[1, 3, 8, 12]);
        let err = discriminative_step(&mut tape, &wires.layers[0], &cfg.layers[0], frame, state)
            .unwrap();
        assert_eq!(tape.buf_shape(err), &[1, 6, 8, 12]);
    }

    #[test]
    fn test_non_first_layer_pools_input() {
        let (cfg, params) = setup(2);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        // Layer 1 consumes layer 0's error at full resolution, 6 channels.
        let below_err = tape.zeros(&[1, 6, 8, 12]);
        let state = tape.zeros(&[1, 16, 4, 6]);
        let err = discriminative_step(&mut tape, &wires.layers[1], &cfg.layers[1], below_err, state)
            .unwrap();
        assert_eq!(tape.buf_shape(err), &[1, 32, 4, 6]);
    }

    #[test]
    fn test_wrong_input_shape_is_fatal() {
        let (cfg, params) = setup(1);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        let frame = tape.zeros(&[1, 3, 8, 8]); // wrong width
        let state = tape.zeros(&[1, 3, 8, 12]);
        let res = discriminative_step(&mut tape, &wires.layers[0], &cfg.layers[0], frame, state);
        assert!(matches!(res, Err(StepError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_error_is_nonnegative_and_two_sided() {
        let (cfg, params) = setup(1);
        let mut tape = Tape::new();
        let wires = params.register(&mut tape, &cfg);
        let frame_data: Vec<f32> = (0..3 * 8 * 12).map(|i| (i as f32 * 0.01).sin()).collect();
        let frame = tape.register_input(&frame_data, vec![1, 3, 8, 12]);
        let state = tape.zeros(&[1, 3, 8, 12]);
        let err = discriminative_step(&mut tape, &wires.layers[0], &cfg.layers[0], frame, state)
            .unwrap();
        let data = tape.buf_data(err);
        assert!(data.iter().all(|&x| x >= 0.0));
        // pos[i] and neg[i] cannot both be positive.
        let half = data.len() / 2;
        for i in 0..half {
            assert!(data[i] == 0.0 || data[half + i] == 0.0);
        }
    }
}
