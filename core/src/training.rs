// Time unroller and training driver.
//
// One epoch records all T composer steps on a single fresh tape, accumulates
// the bottom-layer prediction error against the targets, and runs the tape
// backward once. Gradients therefore flow through every carried error/state
// tensor back to step 0 (full backpropagation through time). One plain SGD
// update is applied per epoch; the tape and all step intermediates are
// dropped afterwards.

use crate::forward::{step, StepError};
use crate::generative::LayerState;
use crate::model::{PredNetConfig, PredNetParams};
use crate::tape::{BufId, Tape};
use crate::tensor::Tensor;

/// Training hyperparameters. `seed` fixes the weight initialization so runs
/// reproduce bit-for-bit.
#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub epochs: usize,
    pub lr: f32,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions { epochs: 10, lr: 0.1, seed: 0 }
    }
}

/// Run one epoch over a T-step sequence and apply one SGD update.
/// Returns the summed loss over the sequence. `T = 0` is a zero-loss no-op;
/// frame and target sequences of different lengths are an error.
pub fn train_epoch(
    params: &mut PredNetParams,
    cfg: &PredNetConfig,
    frames: &[Tensor],
    targets: &[Tensor],
    lr: f32,
) -> Result<f32, StepError> {
    if frames.len() != targets.len() {
        return Err(StepError::SequenceLengthMismatch {
            frames: frames.len(),
            targets: targets.len(),
        });
    }
    if frames.is_empty() {
        return Ok(0.0);
    }

    let l = cfg.num_layers();
    let mut tape = Tape::new();
    let wires = params.register(&mut tape, cfg);

    let mut error: Vec<Option<BufId>> = vec![None; l];
    let mut state: Vec<Option<LayerState>> = vec![None; l];
    let mut total_loss: Option<BufId> = None;

    for (frame, target) in frames.iter().zip(targets.iter()) {
        let frame_id = tape.register_input(&frame.data, frame.shape.clone());
        let (new_error, new_state) = step(&mut tape, &wires, cfg, frame_id, error, state)?;

        // The bottom-layer error is the prediction residual; drive it to the
        // target error signal (typically zeros).
        let target_id = tape.register_input(&target.data, target.shape.clone());
        let loss_t = tape.mse_loss(new_error[0], target_id);
        total_loss = Some(match total_loss {
            Some(acc) => tape.add(acc, loss_t),
            None => loss_t,
        });

        error = new_error.into_iter().map(Some).collect();
        state = new_state.into_iter().map(Some).collect();
    }

    // frames is non-empty, so the accumulator was set.
    let loss_id = match total_loss {
        Some(id) => id,
        None => return Ok(0.0),
    };
    let loss_val = tape.buf_data(loss_id)[0];

    tape.backward(loss_id);
    let grads = wires.collect_grads(&tape);
    params.apply_weight_gradients(&grads, lr);

    Ok(loss_val)
}

/// Run `opts.epochs` epochs over the same sequence. Returns per-epoch losses.
pub fn train(
    params: &mut PredNetParams,
    cfg: &PredNetConfig,
    frames: &[Tensor],
    targets: &[Tensor],
    opts: &TrainOptions,
) -> Result<Vec<f32>, StepError> {
    let mut losses = Vec::with_capacity(opts.epochs);
    for _ in 0..opts.epochs {
        losses.push(train_epoch(params, cfg, frames, targets, opts.lr)?);
    }
    Ok(losses)
}

/// Initialize weights from `opts.seed` and train. Returns the trained
/// parameters and the per-epoch losses.
pub fn fit(
    cfg: &PredNetConfig,
    frames: &[Tensor],
    targets: &[Tensor],
    opts: &TrainOptions,
) -> Result<(PredNetParams, Vec<f32>), StepError> {
    let mut params = PredNetParams::init(cfg, opts.seed);
    let losses = train(&mut params, cfg, frames, targets, opts)?;
    Ok((params, losses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{error_init_shapes, PredNetConfig, PredNetParams};
    use crate::tensor::SimpleRng;

    fn make_sequence(t: usize, h: usize, w: usize, err_c: usize) -> (Vec<Tensor>, Vec<Tensor>) {
        let mut rng = SimpleRng::new(0);
        let frames = (0..t)
            .map(|_| {
                let mut data = vec![0.0f32; 3 * h * w];
                rng.fill_uniform(&mut data, 1.0);
                Tensor::from_vec(data, &[1, 3, h, w])
            })
            .collect();
        let targets = (0..t)
            .map(|_| Tensor::zeros(&[1, err_c, h, w]))
            .collect();
        (frames, targets)
    }

    #[test]
    fn test_empty_sequence_is_noop() {
        let shapes = error_init_shapes(1, 8, 12, 1).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let mut params = PredNetParams::init(&cfg, 0);
        let before = params.clone();
        let loss = train_epoch(&mut params, &cfg, &[], &[], 0.1).unwrap();
        assert_eq!(loss, 0.0);
        assert_eq!(params, before);
    }

    #[test]
    fn test_mismatched_sequence_lengths_rejected() {
        let shapes = error_init_shapes(1, 8, 12, 1).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let mut params = PredNetParams::init(&cfg, 0);
        let before = params.clone();
        let (frames, mut targets) = make_sequence(3, 8, 12, 6);
        targets.pop();
        let res = train_epoch(&mut params, &cfg, &frames, &targets, 0.1);
        assert_eq!(
            res,
            Err(StepError::SequenceLengthMismatch { frames: 3, targets: 2 })
        );
        assert_eq!(params, before);
    }

    #[test]
    fn test_epoch_loss_finite_nonnegative() {
        let shapes = error_init_shapes(1, 8, 12, 2).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let mut params = PredNetParams::init(&cfg, 0);
        let (frames, targets) = make_sequence(3, 8, 12, 6);
        let loss = train_epoch(&mut params, &cfg, &frames, &targets, 0.01).unwrap();
        assert!(loss.is_finite());
        assert!(loss >= 0.0);
    }

    #[test]
    fn test_update_changes_params() {
        let shapes = error_init_shapes(1, 8, 12, 1).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let mut params = PredNetParams::init(&cfg, 0);
        let before = params.clone();
        let (frames, targets) = make_sequence(2, 8, 12, 6);
        train_epoch(&mut params, &cfg, &frames, &targets, 0.1).unwrap();
        assert_ne!(params, before);
    }
}
