/// Minimal tensor utilities for the predictive-coding stack.
///
/// All operations are free functions on flat f32 slices with explicit NCHW
/// dimensions. No generics, no traits on Tensor: every shape is spelled out
/// at the call site, which keeps the backward implementations checkable by
/// hand. Row-major layout throughout: index = ((b*C + c)*H + y)*W + x.

/// Flat f32 tensor with shape metadata.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Self {
        let n: usize = shape.iter().product();
        Tensor {
            data: vec![0.0; n],
            shape: shape.to_vec(),
        }
    }

    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Tensor { data, shape: shape.to_vec() }
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }
}

/// Convolution kernel size used throughout the stack (3x3, padding 1,
/// stride 1; spatial dimensions are preserved).
pub const KERNEL: usize = 3;
const PAD: isize = 1;

// ── Free-function math ops on flat NCHW slices ───────────────────────

/// 2D convolution, 3x3 kernel, padding 1, stride 1.
///
/// `input`: [B, C_in, H, W], `weight`: [C_out, C_in, 3, 3], `bias`: [C_out].
/// `out` must be pre-allocated with B*C_out*H*W elements (overwritten).
pub fn conv2d_f32(
    input: &[f32],
    weight: &[f32],
    bias: &[f32],
    out: &mut [f32],
    b: usize,
    c_in: usize,
    c_out: usize,
    h: usize,
    w: usize,
) {
    debug_assert_eq!(input.len(), b * c_in * h * w);
    debug_assert_eq!(weight.len(), c_out * c_in * KERNEL * KERNEL);
    debug_assert_eq!(bias.len(), c_out);
    debug_assert_eq!(out.len(), b * c_out * h * w);

    for bi in 0..b {
        for oc in 0..c_out {
            for y in 0..h {
                for x in 0..w {
                    let mut acc = bias[oc];
                    for ic in 0..c_in {
                        let in_base = (bi * c_in + ic) * h * w;
                        let w_base = ((oc * c_in + ic) * KERNEL) * KERNEL;
                        for ky in 0..KERNEL {
                            let iy = y as isize + ky as isize - PAD;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..KERNEL {
                                let ix = x as isize + kx as isize - PAD;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                acc += input[in_base + iy as usize * w + ix as usize]
                                    * weight[w_base + ky * KERNEL + kx];
                            }
                        }
                    }
                    out[(bi * c_out + oc) * h * w + y * w + x] = acc;
                }
            }
        }
    }
}

/// Backward pass for `conv2d_f32`.
///
/// `d_out`: [B, C_out, H, W] upstream gradient.
/// Returns (d_input [B, C_in, H, W], d_weight [C_out, C_in, 3, 3], d_bias [C_out]).
pub fn conv2d_backward_f32(
    d_out: &[f32],
    input: &[f32],
    weight: &[f32],
    b: usize,
    c_in: usize,
    c_out: usize,
    h: usize,
    w: usize,
) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    debug_assert_eq!(d_out.len(), b * c_out * h * w);
    debug_assert_eq!(input.len(), b * c_in * h * w);
    debug_assert_eq!(weight.len(), c_out * c_in * KERNEL * KERNEL);

    let mut d_input = vec![0.0f32; b * c_in * h * w];
    let mut d_weight = vec![0.0f32; c_out * c_in * KERNEL * KERNEL];
    let mut d_bias = vec![0.0f32; c_out];

    // Mirror the forward loop nest: every (output, input, weight) triple that
    // contributed forward receives the matching gradient contribution here.
    for bi in 0..b {
        for oc in 0..c_out {
            for y in 0..h {
                for x in 0..w {
                    let g = d_out[(bi * c_out + oc) * h * w + y * w + x];
                    d_bias[oc] += g;
                    for ic in 0..c_in {
                        let in_base = (bi * c_in + ic) * h * w;
                        let w_base = ((oc * c_in + ic) * KERNEL) * KERNEL;
                        for ky in 0..KERNEL {
                            let iy = y as isize + ky as isize - PAD;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..KERNEL {
                                let ix = x as isize + kx as isize - PAD;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                let in_idx = in_base + iy as usize * w + ix as usize;
                                d_weight[w_base + ky * KERNEL + kx] += g * input[in_idx];
                                d_input[in_idx] += g * weight[w_base + ky * KERNEL + kx];
                            }
                        }
                    }
                }
            }
        }
    }

    (d_input, d_weight, d_bias)
}

/// 2x2 max-pooling, stride 2. `input`: [B, C, H, W] with even H and W.
///
/// Returns (out [B, C, H/2, W/2], argmax) where `argmax[i]` is the flat index
/// into `input` of the winning element for output position `i`; the backward
/// pass scatters gradient to exactly those positions.
pub fn maxpool2_f32(
    input: &[f32],
    b: usize,
    c: usize,
    h: usize,
    w: usize,
) -> (Vec<f32>, Vec<usize>) {
    debug_assert_eq!(input.len(), b * c * h * w);
    debug_assert_eq!(h % 2, 0, "maxpool2 requires even height, got {h}");
    debug_assert_eq!(w % 2, 0, "maxpool2 requires even width, got {w}");

    let (oh, ow) = (h / 2, w / 2);
    let mut out = vec![0.0f32; b * c * oh * ow];
    let mut argmax = vec![0usize; b * c * oh * ow];

    for bc in 0..b * c {
        let in_base = bc * h * w;
        let out_base = bc * oh * ow;
        for oy in 0..oh {
            for ox in 0..ow {
                let mut best_idx = in_base + (2 * oy) * w + 2 * ox;
                let mut best = input[best_idx];
                for dy in 0..2 {
                    for dx in 0..2 {
                        let idx = in_base + (2 * oy + dy) * w + 2 * ox + dx;
                        if input[idx] > best {
                            best = input[idx];
                            best_idx = idx;
                        }
                    }
                }
                out[out_base + oy * ow + ox] = best;
                argmax[out_base + oy * ow + ox] = best_idx;
            }
        }
    }

    (out, argmax)
}

/// 2x nearest-neighbour upsampling. `input`: [B, C, H, W] → [B, C, 2H, 2W].
pub fn upsample2_f32(input: &[f32], b: usize, c: usize, h: usize, w: usize) -> Vec<f32> {
    debug_assert_eq!(input.len(), b * c * h * w);
    let (oh, ow) = (2 * h, 2 * w);
    let mut out = vec![0.0f32; b * c * oh * ow];
    for bc in 0..b * c {
        let in_base = bc * h * w;
        let out_base = bc * oh * ow;
        for oy in 0..oh {
            for ox in 0..ow {
                out[out_base + oy * ow + ox] = input[in_base + (oy / 2) * w + ox / 2];
            }
        }
    }
    out
}

/// Sigmoid: 1 / (1 + exp(-x)). Clamped to avoid overflow.
#[inline]
pub fn sigmoid_f32(x: f32) -> f32 {
    if x >= 15.0 { return 1.0; }
    if x <= -15.0 { return 0.0; }
    1.0 / (1.0 + (-x).exp())
}

/// Mean squared error between two equal-length slices.
pub fn mse_f32(pred: &[f32], target: &[f32]) -> f32 {
    debug_assert_eq!(pred.len(), target.len());
    if pred.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0f32;
    for i in 0..pred.len() {
        let d = pred[i] - target[i];
        sum += d * d;
    }
    sum / pred.len() as f32
}

/// Simple xorshift64 PRNG for deterministic weight init. Not crypto-safe.
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        SimpleRng { state: seed.max(1) } // avoid zero state
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform in [-scale, scale].
    pub fn uniform(&mut self, scale: f32) -> f32 {
        let u = (self.next_u64() as f64) / (u64::MAX as f64);
        (2.0 * u as f32 - 1.0) * scale
    }

    /// Fill slice with uniform random values in [-scale, scale].
    pub fn fill_uniform(&mut self, buf: &mut [f32], scale: f32) {
        for v in buf.iter_mut() {
            *v = self.uniform(scale);
        }
    }
}
