// Stack configuration and trainable parameters.
//
// A stack is an ordered list of layers, indexed bottom (0) to top (L-1).
// Each layer owns one discriminative unit (two 3x3 convs) and one generative
// unit (a ConvLSTM whose gate conv reads the concatenated error, upsampled
// top-down hidden, and previous hidden). The orchestrator owns no parameters
// of its own.
//
// Parameters live in flat Vec<f32> with shapes derived from the layer config,
// and serialize to JSON checkpoints.

use std::fs;
use std::io::{Error, ErrorKind};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::schedule::{size_schedule, ConfigError};
use crate::tape::{BufId, Tape};
use crate::tensor::{SimpleRng, KERNEL};

// ── Configuration ────────────────────────────────────────────────────

/// Static configuration of one layer, derived from the size schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Channels of the bottom-up input (3 for layer 0, ERR of the layer
    /// below elsewhere).
    pub in_channels: usize,
    /// Hidden width of both units' outputs.
    pub hidden_channels: usize,
    /// Error width: `2 * hidden_channels`.
    pub err_channels: usize,
    /// Hidden width of the layer above, 0 at the top (no top-down feed).
    pub up_channels: usize,
    /// Layer 0 skips the discriminative max-pool.
    pub first: bool,
    /// Shape [B, ERR, H, W] used to materialize an absent error signal.
    pub error_init: [usize; 4],
}

impl LayerConfig {
    /// Spatial dims at this layer (from the error-init shape).
    pub fn spatial(&self) -> (usize, usize) {
        (self.error_init[2], self.error_init[3])
    }

    pub fn batch(&self) -> usize {
        self.error_init[0]
    }

    /// Gate-conv input channels: error + upsampled top-down hidden + previous
    /// hidden, concatenated along the channel axis.
    pub fn gate_in_channels(&self) -> usize {
        self.err_channels + self.up_channels + self.hidden_channels
    }
}

/// Full stack configuration: one `LayerConfig` per layer, bottom to top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredNetConfig {
    pub layers: Vec<LayerConfig>,
}

impl PredNetConfig {
    /// Build an L-layer stack from per-layer error-init shapes (one per
    /// layer, bottom to top). Channel widths come from the size schedule;
    /// batch and spatial dims come from the shapes.
    pub fn build(error_init: &[[usize; 4]]) -> Result<Self, ConfigError> {
        let l = error_init.len();
        let sched = size_schedule(l)?;

        let mut layers = Vec::with_capacity(l);
        for i in 0..l {
            if error_init[i][1] != sched.err[i] {
                return Err(ConfigError::ChannelMismatch {
                    layer: i,
                    expected: sched.err[i],
                    got: error_init[i][1],
                });
            }
            layers.push(LayerConfig {
                in_channels: sched.input[i],
                hidden_channels: sched.out[i],
                err_channels: sched.err[i],
                up_channels: if i + 1 < l { sched.out[i + 1] } else { 0 },
                first: i == 0,
                error_init: error_init[i],
            });
        }

        Ok(PredNetConfig { layers })
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

/// Canonical error-init shapes for a stack fed `(batch, 3, frame_h, frame_w)`
/// frames: layer l sits at `(frame_h / 2^l, frame_w / 2^l)` with the
/// schedule's error width. Fails if a dimension cannot be halved all the way
/// up.
pub fn error_init_shapes(
    batch: usize,
    frame_h: usize,
    frame_w: usize,
    layers: usize,
) -> Result<Vec<[usize; 4]>, ConfigError> {
    let sched = size_schedule(layers)?;
    let (mut h, mut w) = (frame_h, frame_w);
    let mut shapes = Vec::with_capacity(layers);
    for l in 0..layers {
        shapes.push([batch, sched.err[l], h, w]);
        if l + 1 < layers {
            if h % 2 != 0 {
                return Err(ConfigError::OddSpatialDim { dim: "height", size: h, layer: l });
            }
            if w % 2 != 0 {
                return Err(ConfigError::OddSpatialDim { dim: "width", size: w, layer: l });
            }
            h /= 2;
            w /= 2;
        }
    }
    Ok(shapes)
}

// ── Parameters ───────────────────────────────────────────────────────

/// Discriminative unit weights: one conv over the bottom-up input, one over
/// the generative state output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminativeParams {
    /// [hidden, in, 3, 3]
    pub w_input: Vec<f32>,
    /// [hidden]
    pub b_input: Vec<f32>,
    /// [hidden, hidden, 3, 3]
    pub w_state: Vec<f32>,
    /// [hidden]
    pub b_state: Vec<f32>,
}

impl DiscriminativeParams {
    fn init(cfg: &LayerConfig, rng: &mut SimpleRng) -> Self {
        let (hid, inp) = (cfg.hidden_channels, cfg.in_channels);
        DiscriminativeParams {
            w_input: xavier(rng, hid * inp * KERNEL * KERNEL, inp),
            b_input: vec![0.0; hid],
            w_state: xavier(rng, hid * hid * KERNEL * KERNEL, hid),
            b_state: vec![0.0; hid],
        }
    }

    fn zeros_like(&self) -> Self {
        DiscriminativeParams {
            w_input: vec![0.0; self.w_input.len()],
            b_input: vec![0.0; self.b_input.len()],
            w_state: vec![0.0; self.w_state.len()],
            b_state: vec![0.0; self.b_state.len()],
        }
    }

    fn num_params(&self) -> usize {
        self.w_input.len() + self.b_input.len() + self.w_state.len() + self.b_state.len()
    }
}

/// Generative unit weights: the single gate conv of the ConvLSTM, producing
/// all four gates at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeParams {
    /// [4 * hidden, err + up + hidden, 3, 3]
    pub w_gates: Vec<f32>,
    /// [4 * hidden]
    pub b_gates: Vec<f32>,
}

impl GenerativeParams {
    fn init(cfg: &LayerConfig, rng: &mut SimpleRng) -> Self {
        let gates_out = 4 * cfg.hidden_channels;
        let gates_in = cfg.gate_in_channels();
        GenerativeParams {
            w_gates: xavier(rng, gates_out * gates_in * KERNEL * KERNEL, gates_in),
            b_gates: vec![0.0; gates_out],
        }
    }

    fn zeros_like(&self) -> Self {
        GenerativeParams {
            w_gates: vec![0.0; self.w_gates.len()],
            b_gates: vec![0.0; self.b_gates.len()],
        }
    }

    fn num_params(&self) -> usize {
        self.w_gates.len() + self.b_gates.len()
    }
}

/// All trainable weights of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub disc: DiscriminativeParams,
    pub gen: GenerativeParams,
}

/// All trainable weights of the stack, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredNetParams {
    pub layers: Vec<LayerParams>,
}

/// Xavier-scaled uniform init: scale = sqrt(1 / fan_in), fan_in counting the
/// full 3x3 receptive field.
fn xavier(rng: &mut SimpleRng, n: usize, c_in: usize) -> Vec<f32> {
    let fan_in = (c_in * KERNEL * KERNEL) as f32;
    let scale = (1.0 / fan_in).sqrt();
    let mut v = vec![0.0f32; n];
    rng.fill_uniform(&mut v, scale);
    v
}

impl PredNetParams {
    /// Deterministic initialization from a seed.
    pub fn init(cfg: &PredNetConfig, seed: u64) -> Self {
        let mut rng = SimpleRng::new(seed);
        let layers = cfg
            .layers
            .iter()
            .map(|lc| LayerParams {
                disc: DiscriminativeParams::init(lc, &mut rng),
                gen: GenerativeParams::init(lc, &mut rng),
            })
            .collect();
        PredNetParams { layers }
    }

    /// Same structure, all zeros. Used as a gradient container.
    pub fn zeros_like(&self) -> Self {
        PredNetParams {
            layers: self
                .layers
                .iter()
                .map(|lp| LayerParams {
                    disc: lp.disc.zeros_like(),
                    gen: lp.gen.zeros_like(),
                })
                .collect(),
        }
    }

    /// Total scalar parameter count.
    pub fn num_params(&self) -> usize {
        self.layers
            .iter()
            .map(|lp| lp.disc.num_params() + lp.gen.num_params())
            .sum()
    }

    /// L2 norm over all parameters. Diagnostic.
    pub fn norm(&self) -> f32 {
        let mut acc = 0.0f32;
        let mut add = |v: &[f32]| {
            for x in v {
                acc += x * x;
            }
        };
        for lp in &self.layers {
            add(&lp.disc.w_input);
            add(&lp.disc.b_input);
            add(&lp.disc.w_state);
            add(&lp.disc.b_state);
            add(&lp.gen.w_gates);
            add(&lp.gen.b_gates);
        }
        acc.sqrt()
    }

    /// One SGD step: `param -= lr * grad`. `grads` must have the same
    /// structure (as produced by `zeros_like` / `PredNetWires::collect_grads`).
    pub fn apply_weight_gradients(&mut self, grads: &PredNetParams, lr: f32) {
        debug_assert_eq!(self.layers.len(), grads.layers.len());
        fn sgd(p: &mut [f32], g: &[f32], lr: f32) {
            debug_assert_eq!(p.len(), g.len());
            for (pi, gi) in p.iter_mut().zip(g.iter()) {
                *pi -= lr * gi;
            }
        }
        for (lp, lg) in self.layers.iter_mut().zip(grads.layers.iter()) {
            sgd(&mut lp.disc.w_input, &lg.disc.w_input, lr);
            sgd(&mut lp.disc.b_input, &lg.disc.b_input, lr);
            sgd(&mut lp.disc.w_state, &lg.disc.w_state, lr);
            sgd(&mut lp.disc.b_state, &lg.disc.b_state, lr);
            sgd(&mut lp.gen.w_gates, &lg.gen.w_gates, lr);
            sgd(&mut lp.gen.b_gates, &lg.gen.b_gates, lr);
        }
    }

    /// Register every parameter on a tape (snapshot semantics) and return the
    /// resulting buffer ids.
    pub fn register(&self, tape: &mut Tape, cfg: &PredNetConfig) -> PredNetWires {
        debug_assert_eq!(self.layers.len(), cfg.layers.len());
        let layers = self
            .layers
            .iter()
            .zip(cfg.layers.iter())
            .map(|(lp, lc)| {
                let hid = lc.hidden_channels;
                LayerWires {
                    w_input: tape.register_param(
                        &lp.disc.w_input,
                        vec![hid, lc.in_channels, KERNEL, KERNEL],
                    ),
                    b_input: tape.register_param(&lp.disc.b_input, vec![hid]),
                    w_state: tape.register_param(
                        &lp.disc.w_state,
                        vec![hid, hid, KERNEL, KERNEL],
                    ),
                    b_state: tape.register_param(&lp.disc.b_state, vec![hid]),
                    w_gates: tape.register_param(
                        &lp.gen.w_gates,
                        vec![4 * hid, lc.gate_in_channels(), KERNEL, KERNEL],
                    ),
                    b_gates: tape.register_param(&lp.gen.b_gates, vec![4 * hid]),
                }
            })
            .collect();
        PredNetWires { layers }
    }
}

// ── Tape wiring ──────────────────────────────────────────────────────

/// Tape buffer ids of one layer's registered parameters.
#[derive(Debug, Clone, Copy)]
pub struct LayerWires {
    pub w_input: BufId,
    pub b_input: BufId,
    pub w_state: BufId,
    pub b_state: BufId,
    pub w_gates: BufId,
    pub b_gates: BufId,
}

/// Tape buffer ids of the whole stack's parameters, bottom to top.
#[derive(Debug, Clone)]
pub struct PredNetWires {
    pub layers: Vec<LayerWires>,
}

impl PredNetWires {
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Collect accumulated gradients after a backward pass into a parameter
    /// container (zeros where no gradient flowed).
    pub fn collect_grads(&self, tape: &Tape) -> PredNetParams {
        let layers = self
            .layers
            .iter()
            .map(|lw| LayerParams {
                disc: DiscriminativeParams {
                    w_input: tape.get_param_grad(lw.w_input),
                    b_input: tape.get_param_grad(lw.b_input),
                    w_state: tape.get_param_grad(lw.w_state),
                    b_state: tape.get_param_grad(lw.b_state),
                },
                gen: GenerativeParams {
                    w_gates: tape.get_param_grad(lw.w_gates),
                    b_gates: tape.get_param_grad(lw.b_gates),
                },
            })
            .collect();
        PredNetParams { layers }
    }
}

// ── Checkpoints ──────────────────────────────────────────────────────

/// JSON checkpoint: configuration plus weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamCheckpoint {
    pub config: PredNetConfig,
    pub params: PredNetParams,
}

/// Write configuration and weights to a JSON file.
pub fn save_checkpoint(
    path: &Path,
    config: &PredNetConfig,
    params: &PredNetParams,
) -> std::io::Result<()> {
    let ckpt = ParamCheckpoint { config: config.clone(), params: params.clone() };
    let json = serde_json::to_string(&ckpt)
        .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}

/// Load configuration and weights from a JSON file.
pub fn load_checkpoint(path: &Path) -> std::io::Result<ParamCheckpoint> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}
