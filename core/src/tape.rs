// Wengert tape: reverse-mode AD via operation recording.
//
// Records operations during the forward pass into a linear tape, then
// replays them in reverse to compute gradients via the chain rule. The
// time-unrolled training loop records all T composer steps onto one tape,
// so the backward pass is full backpropagation through time: every
// intermediate error/state tensor stays reachable in the arena until the
// gradients have been computed.
//
// Parameters are snapshotted at registration, immune to later mutation.

use crate::tensor;

// ── Buffer management ────────────────────────────────────────────────

/// Arena index for tensor buffers. Immutable after creation.
pub type BufId = usize;

/// A flat tensor buffer in the tape arena.
#[derive(Clone, Debug)]
pub struct TapeBuf {
    /// Flat storage (row-major NCHW).
    pub data: Vec<f32>,
    /// Shape metadata, e.g., [batch, channels, height, width].
    pub shape: Vec<usize>,
    /// True for trainable parameters (conv weights/biases); these get
    /// gradient output.
    pub is_param: bool,
}

impl TapeBuf {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        TapeBuf { data, shape, is_param: false }
    }

    pub fn param(data: Vec<f32>, shape: Vec<usize>) -> Self {
        TapeBuf { data, shape, is_param: true }
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }
}

// ── Tape operations ──────────────────────────────────────────────────

/// A single recorded operation on the tape.
#[derive(Debug, Clone)]
pub enum TapeOp {
    /// out = conv3x3(input, weight) + bias, padding 1, stride 1.
    /// input: [B, C_in, H, W], weight: [C_out, C_in, 3, 3], bias: [C_out].
    Conv2d {
        input: BufId,
        weight: BufId,
        bias: BufId,
        out: BufId,
        b: usize,
        c_in: usize,
        c_out: usize,
        h: usize,
        w: usize,
    },
    /// 2x2 max pool, stride 2. `argmax[i]` is the flat input index that won
    /// output position `i` (recorded during forward).
    MaxPool2 { input: BufId, out: BufId, argmax: Vec<usize> },
    /// 2x nearest-neighbour upsample. Dims are the *input* dims.
    Upsample2 { input: BufId, out: BufId, b: usize, c: usize, h: usize, w: usize },

    // ── Element-wise ────────────────────────────────────────────
    /// out = A + B
    Add { a: BufId, b: BufId, out: BufId },
    /// out = A - B
    Sub { a: BufId, b: BufId, out: BufId },
    /// out = A * B  (element-wise)
    Mul { a: BufId, b: BufId, out: BufId },
    /// out = scalar * A
    Scale { input: BufId, scalar: f32, out: BufId },

    // ── Activations ─────────────────────────────────────────────
    /// out = max(x, 0); backward masks by the saved input sign.
    Relu { input: BufId, out: BufId },
    /// out = sigmoid(x); backward uses the saved output.
    Sigmoid { input: BufId, out: BufId },
    /// out = tanh(x); backward uses the saved output.
    Tanh { input: BufId, out: BufId },

    // ── Channel-axis structure ──────────────────────────────────
    /// out = concat(inputs) along the channel axis of NCHW tensors.
    /// `channels[i]` is input i's channel count; all inputs share B, H, W.
    ConcatChannels {
        inputs: Vec<BufId>,
        out: BufId,
        channels: Vec<usize>,
        batch: usize,
        hw: usize,
    },
    /// out = input[:, offset..offset+len, :, :] (channel slice).
    SliceChannels {
        input: BufId,
        out: BufId,
        offset: usize,
        len: usize,
        total: usize,
        batch: usize,
        hw: usize,
    },

    // ── Loss ────────────────────────────────────────────────────
    /// out = mean((pred - target)^2), scalar.
    MseLoss { pred: BufId, target: BufId, out: BufId },
}

// ── The Tape ─────────────────────────────────────────────────────────

/// Wengert tape for reverse-mode AD.
///
/// Records operations during the forward pass, replays them in reverse for
/// gradients. One tape spans one training epoch (T unrolled steps); it is
/// dropped after the backward pass completes.
pub struct Tape {
    /// Operations in forward order. Replayed in reverse during backward.
    ops: Vec<TapeOp>,
    /// Arena of tensor buffers. Indexed by BufId.
    bufs: Vec<TapeBuf>,
    /// Gradient accumulators, indexed by BufId. None until backward seeds them.
    grad_accum: Vec<Option<Vec<f32>>>,
    /// Whether we are currently recording (true between creation and backward).
    recording: bool,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// Create a new empty tape.
    pub fn new() -> Self {
        Tape {
            ops: Vec::new(),
            bufs: Vec::new(),
            grad_accum: Vec::new(),
            recording: true,
        }
    }

    // ── Buffer management ────────────────────────────────────────

    /// Allocate a new buffer in the arena. Returns its BufId.
    pub fn alloc(&mut self, data: Vec<f32>, shape: Vec<usize>) -> BufId {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        let id = self.bufs.len();
        self.bufs.push(TapeBuf::new(data, shape));
        self.grad_accum.push(None);
        id
    }

    /// Allocate a zero-filled leaf buffer (used for absent first-step inputs).
    pub fn zeros(&mut self, shape: &[usize]) -> BufId {
        let n: usize = shape.iter().product();
        self.alloc(vec![0.0; n], shape.to_vec())
    }

    /// Register a trainable parameter. CLONES the data; the tape holds its
    /// own snapshot, immune to later mutation of the original.
    pub fn register_param(&mut self, data: &[f32], shape: Vec<usize>) -> BufId {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        let id = self.bufs.len();
        self.bufs.push(TapeBuf::param(data.to_vec(), shape));
        self.grad_accum.push(None);
        id
    }

    /// Register an input (non-parameter) buffer. Clones the data.
    pub fn register_input(&mut self, data: &[f32], shape: Vec<usize>) -> BufId {
        self.alloc(data.to_vec(), shape)
    }

    /// Get the data for a buffer.
    pub fn buf_data(&self, id: BufId) -> &[f32] {
        &self.bufs[id].data
    }

    /// Get the shape for a buffer.
    pub fn buf_shape(&self, id: BufId) -> &[usize] {
        &self.bufs[id].shape
    }

    /// Get the number of elements in a buffer.
    pub fn buf_numel(&self, id: BufId) -> usize {
        self.bufs[id].numel()
    }

    /// Check if a buffer is a parameter.
    pub fn is_param(&self, id: BufId) -> bool {
        self.bufs[id].is_param
    }

    /// Number of buffers in the arena.
    pub fn num_bufs(&self) -> usize {
        self.bufs.len()
    }

    /// Number of ops recorded.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    // ── Recording ────────────────────────────────────────────────

    /// Record an operation on the tape.
    pub fn record(&mut self, op: TapeOp) {
        assert!(self.recording, "Tape::record called but tape is not recording");
        self.ops.push(op);
    }

    /// Record an operation and allocate its output buffer in one step.
    /// Returns the output BufId.
    pub fn record_with_output(
        &mut self,
        data: Vec<f32>,
        shape: Vec<usize>,
        op_fn: impl FnOnce(BufId) -> TapeOp,
    ) -> BufId {
        let out_id = self.alloc(data, shape);
        let op = op_fn(out_id);
        self.record(op);
        out_id
    }

    // ── Gradient seeding and access ──────────────────────────────

    /// Seed the gradient for a buffer (typically the scalar loss).
    pub fn seed_grad(&mut self, id: BufId, grad: Vec<f32>) {
        assert_eq!(
            grad.len(),
            self.bufs[id].numel(),
            "gradient size mismatch: grad={} buf={}",
            grad.len(),
            self.bufs[id].numel()
        );
        self.grad_accum[id] = Some(grad);
    }

    /// Accumulate gradient into a buffer's accumulator.
    fn accumulate_grad(&mut self, id: BufId, grad: &[f32]) {
        let n = self.bufs[id].numel();
        debug_assert_eq!(grad.len(), n);
        match &mut self.grad_accum[id] {
            Some(existing) => {
                for (e, g) in existing.iter_mut().zip(grad.iter()) {
                    *e += g;
                }
            }
            None => {
                self.grad_accum[id] = Some(grad.to_vec());
            }
        }
    }

    /// Get the accumulated gradient for a buffer. None if no gradient flowed.
    pub fn get_grad(&self, id: BufId) -> Option<&[f32]> {
        self.grad_accum[id].as_deref()
    }

    /// Get gradient for a parameter buffer, returning zeros if none flowed.
    pub fn get_param_grad(&self, id: BufId) -> Vec<f32> {
        assert!(self.bufs[id].is_param, "get_param_grad called on non-param buffer {id}");
        match &self.grad_accum[id] {
            Some(g) => g.clone(),
            None => vec![0.0; self.bufs[id].numel()],
        }
    }

    // ── Backward pass ────────────────────────────────────────────

    /// Run the backward pass: replay ops in reverse, computing VJPs.
    /// A scalar loss buffer is auto-seeded with 1.0 if not seeded explicitly.
    pub fn backward(&mut self, loss_id: BufId) {
        self.recording = false;

        if self.grad_accum[loss_id].is_none() {
            assert_eq!(
                self.bufs[loss_id].numel(),
                1,
                "auto-seeding only works for scalar loss (got {} elements)",
                self.bufs[loss_id].numel()
            );
            self.grad_accum[loss_id] = Some(vec![1.0]);
        }

        for op_idx in (0..self.ops.len()).rev() {
            // Clone the op to avoid borrow conflict with self.
            let op = self.ops[op_idx].clone();
            self.backward_op(&op);
        }
    }

    /// Compute the VJP for a single operation.
    fn backward_op(&mut self, op: &TapeOp) {
        match op {
            // ── Conv2d ──────────────────────────────────────────
            TapeOp::Conv2d { input, weight, bias, out, b, c_in, c_out, h, w } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let input_data = self.bufs[*input].data.clone();
                    let weight_data = self.bufs[*weight].data.clone();
                    let (d_input, d_weight, d_bias) = tensor::conv2d_backward_f32(
                        &d_out, &input_data, &weight_data, *b, *c_in, *c_out, *h, *w,
                    );
                    self.accumulate_grad(*input, &d_input);
                    self.accumulate_grad(*weight, &d_weight);
                    self.accumulate_grad(*bias, &d_bias);
                }
            }

            // ── MaxPool2: scatter to the winning positions ──────
            TapeOp::MaxPool2 { input, out, argmax } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let mut d_input = vec![0.0f32; self.bufs[*input].numel()];
                    for (i, &src) in argmax.iter().enumerate() {
                        d_input[src] += d_out[i];
                    }
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── Upsample2: each input cell fed a 2x2 block ──────
            TapeOp::Upsample2 { input, out, b, c, h, w } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let (oh, ow) = (2 * h, 2 * w);
                    let mut d_input = vec![0.0f32; b * c * h * w];
                    for bc in 0..b * c {
                        let in_base = bc * h * w;
                        let out_base = bc * oh * ow;
                        for oy in 0..oh {
                            for ox in 0..ow {
                                d_input[in_base + (oy / 2) * w + ox / 2] +=
                                    d_out[out_base + oy * ow + ox];
                            }
                        }
                    }
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── Add: out = A + B ────────────────────────────────
            TapeOp::Add { a, b, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    self.accumulate_grad(*a, &d_out);
                    self.accumulate_grad(*b, &d_out);
                }
            }

            // ── Sub: out = A - B ────────────────────────────────
            TapeOp::Sub { a, b, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    self.accumulate_grad(*a, &d_out);
                    let neg: Vec<f32> = d_out.iter().map(|x| -x).collect();
                    self.accumulate_grad(*b, &neg);
                }
            }

            // ── Mul: out = A * B (element-wise) ─────────────────
            TapeOp::Mul { a, b, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let d_a: Vec<f32> = d_out
                        .iter()
                        .zip(self.bufs[*b].data.iter())
                        .map(|(d, b)| d * b)
                        .collect();
                    self.accumulate_grad(*a, &d_a);
                    let d_b: Vec<f32> = d_out
                        .iter()
                        .zip(self.bufs[*a].data.iter())
                        .map(|(d, a)| d * a)
                        .collect();
                    self.accumulate_grad(*b, &d_b);
                }
            }

            // ── Scale: out = scalar * A ─────────────────────────
            TapeOp::Scale { input, scalar, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let d_input: Vec<f32> = d_out.iter().map(|d| *scalar * d).collect();
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── Relu: out = max(x, 0) ───────────────────────────
            TapeOp::Relu { input, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let x = &self.bufs[*input].data;
                    let d_input: Vec<f32> = d_out
                        .iter()
                        .zip(x.iter())
                        .map(|(d, &xi)| if xi > 0.0 { *d } else { 0.0 })
                        .collect();
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── Sigmoid: out = σ(x) ─────────────────────────────
            TapeOp::Sigmoid { input, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let out_data = &self.bufs[*out].data;
                    // d_x = d_out * out * (1 - out)
                    let d_input: Vec<f32> = d_out
                        .iter()
                        .zip(out_data.iter())
                        .map(|(d, o)| d * o * (1.0 - o))
                        .collect();
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── Tanh: out = tanh(x) ─────────────────────────────
            TapeOp::Tanh { input, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let out_data = &self.bufs[*out].data;
                    // d_x = d_out * (1 - out^2)
                    let d_input: Vec<f32> = d_out
                        .iter()
                        .zip(out_data.iter())
                        .map(|(d, o)| d * (1.0 - o * o))
                        .collect();
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── ConcatChannels ──────────────────────────────────
            TapeOp::ConcatChannels { inputs, out, channels, batch, hw } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let total_c: usize = channels.iter().sum();
                    let mut c_offset = 0;
                    for (inp, &ci) in inputs.iter().zip(channels.iter()) {
                        let mut d_inp = vec![0.0f32; *batch * ci * hw];
                        for bi in 0..*batch {
                            let src = (bi * total_c + c_offset) * hw;
                            let dst = bi * ci * hw;
                            d_inp[dst..dst + ci * hw]
                                .copy_from_slice(&d_out[src..src + ci * hw]);
                        }
                        self.accumulate_grad(*inp, &d_inp);
                        c_offset += ci;
                    }
                }
            }

            // ── SliceChannels ───────────────────────────────────
            TapeOp::SliceChannels { input, out, offset, len, total, batch, hw } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let mut d_input = vec![0.0f32; *batch * total * hw];
                    for bi in 0..*batch {
                        let dst = (bi * total + offset) * hw;
                        let src = bi * len * hw;
                        d_input[dst..dst + len * hw]
                            .copy_from_slice(&d_out[src..src + len * hw]);
                    }
                    self.accumulate_grad(*input, &d_input);
                }
            }

            // ── MseLoss ─────────────────────────────────────────
            TapeOp::MseLoss { pred, target, out } => {
                if let Some(d_out) = self.grad_accum[*out].clone() {
                    let scalar = d_out[0];
                    let pred_data = &self.bufs[*pred].data;
                    let target_data = &self.bufs[*target].data;
                    let n = pred_data.len() as f32;
                    let d_pred: Vec<f32> = pred_data
                        .iter()
                        .zip(target_data.iter())
                        .map(|(p, t)| scalar * 2.0 * (p - t) / n)
                        .collect();
                    let d_target: Vec<f32> = d_pred.iter().map(|d| -d).collect();
                    self.accumulate_grad(*pred, &d_pred);
                    self.accumulate_grad(*target, &d_target);
                }
            }
        }
    }
}

// ── Traced op constructors ───────────────────────────────────────────
//
// Each helper executes the forward computation eagerly and records the op.
// Shapes are read from the arena so call sites stay free of dimension
// plumbing; channel agreement is a programmer error and asserted in debug.

impl Tape {
    fn dims4(&self, id: BufId) -> (usize, usize, usize, usize) {
        let s = &self.bufs[id].shape;
        debug_assert_eq!(s.len(), 4, "expected a 4D NCHW buffer, got shape {s:?}");
        (s[0], s[1], s[2], s[3])
    }

    /// out = conv3x3(input, weight) + bias. Spatial dims preserved.
    pub fn conv2d(&mut self, input: BufId, weight: BufId, bias: BufId) -> BufId {
        let (b, c_in, h, w) = self.dims4(input);
        let ws = &self.bufs[weight].shape;
        debug_assert_eq!(ws.len(), 4);
        debug_assert_eq!(ws[1], c_in, "conv2d channel mismatch: weight expects {}, input has {c_in}", ws[1]);
        let c_out = ws[0];
        let mut out = vec![0.0f32; b * c_out * h * w];
        tensor::conv2d_f32(
            &self.bufs[input].data,
            &self.bufs[weight].data,
            &self.bufs[bias].data,
            &mut out,
            b,
            c_in,
            c_out,
            h,
            w,
        );
        self.record_with_output(out, vec![b, c_out, h, w], |out| TapeOp::Conv2d {
            input, weight, bias, out, b, c_in, c_out, h, w,
        })
    }

    /// 2x2 max pool, stride 2.
    pub fn maxpool2(&mut self, input: BufId) -> BufId {
        let (b, c, h, w) = self.dims4(input);
        let (out, argmax) = tensor::maxpool2_f32(&self.bufs[input].data, b, c, h, w);
        self.record_with_output(out, vec![b, c, h / 2, w / 2], |out| TapeOp::MaxPool2 {
            input, out, argmax,
        })
    }

    /// 2x nearest-neighbour upsample.
    pub fn upsample2(&mut self, input: BufId) -> BufId {
        let (b, c, h, w) = self.dims4(input);
        let out = tensor::upsample2_f32(&self.bufs[input].data, b, c, h, w);
        self.record_with_output(out, vec![b, c, 2 * h, 2 * w], |out| TapeOp::Upsample2 {
            input, out, b, c, h, w,
        })
    }

    pub fn add(&mut self, a: BufId, b: BufId) -> BufId {
        debug_assert_eq!(self.bufs[a].numel(), self.bufs[b].numel());
        let data: Vec<f32> = self.bufs[a]
            .data
            .iter()
            .zip(self.bufs[b].data.iter())
            .map(|(x, y)| x + y)
            .collect();
        let shape = self.bufs[a].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Add { a, b, out })
    }

    pub fn sub(&mut self, a: BufId, b: BufId) -> BufId {
        debug_assert_eq!(self.bufs[a].numel(), self.bufs[b].numel());
        let data: Vec<f32> = self.bufs[a]
            .data
            .iter()
            .zip(self.bufs[b].data.iter())
            .map(|(x, y)| x - y)
            .collect();
        let shape = self.bufs[a].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Sub { a, b, out })
    }

    pub fn mul(&mut self, a: BufId, b: BufId) -> BufId {
        debug_assert_eq!(self.bufs[a].numel(), self.bufs[b].numel());
        let data: Vec<f32> = self.bufs[a]
            .data
            .iter()
            .zip(self.bufs[b].data.iter())
            .map(|(x, y)| x * y)
            .collect();
        let shape = self.bufs[a].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Mul { a, b, out })
    }

    pub fn scale(&mut self, input: BufId, scalar: f32) -> BufId {
        let data: Vec<f32> = self.bufs[input].data.iter().map(|x| x * scalar).collect();
        let shape = self.bufs[input].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Scale { input, scalar, out })
    }

    pub fn relu(&mut self, input: BufId) -> BufId {
        let data: Vec<f32> = self.bufs[input].data.iter().map(|&x| x.max(0.0)).collect();
        let shape = self.bufs[input].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Relu { input, out })
    }

    pub fn sigmoid(&mut self, input: BufId) -> BufId {
        let data: Vec<f32> = self.bufs[input]
            .data
            .iter()
            .map(|&x| tensor::sigmoid_f32(x))
            .collect();
        let shape = self.bufs[input].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Sigmoid { input, out })
    }

    pub fn tanh(&mut self, input: BufId) -> BufId {
        let data: Vec<f32> = self.bufs[input].data.iter().map(|&x| x.tanh()).collect();
        let shape = self.bufs[input].shape.clone();
        self.record_with_output(data, shape, |out| TapeOp::Tanh { input, out })
    }

    /// Concatenate NCHW buffers along the channel axis.
    pub fn concat_channels(&mut self, inputs: &[BufId]) -> BufId {
        debug_assert!(!inputs.is_empty());
        let (batch, _, h, w) = self.dims4(inputs[0]);
        let hw = h * w;
        let channels: Vec<usize> = inputs
            .iter()
            .map(|&id| {
                let (bi, ci, hi, wi) = self.dims4(id);
                debug_assert_eq!((bi, hi, wi), (batch, h, w), "concat_channels B/H/W mismatch");
                ci
            })
            .collect();
        let total_c: usize = channels.iter().sum();

        let mut data = vec![0.0f32; batch * total_c * hw];
        let mut c_offset = 0;
        for (&id, &ci) in inputs.iter().zip(channels.iter()) {
            for bi in 0..batch {
                let dst = (bi * total_c + c_offset) * hw;
                let src = bi * ci * hw;
                data[dst..dst + ci * hw]
                    .copy_from_slice(&self.bufs[id].data[src..src + ci * hw]);
            }
            c_offset += ci;
        }

        let inputs = inputs.to_vec();
        self.record_with_output(data, vec![batch, total_c, h, w], |out| {
            TapeOp::ConcatChannels { inputs, out, channels, batch, hw }
        })
    }

    /// Take channels [offset, offset+len) of an NCHW buffer.
    pub fn slice_channels(&mut self, input: BufId, offset: usize, len: usize) -> BufId {
        let (batch, total, h, w) = self.dims4(input);
        debug_assert!(offset + len <= total);
        let hw = h * w;
        let mut data = vec![0.0f32; batch * len * hw];
        for bi in 0..batch {
            let src = (bi * total + offset) * hw;
            let dst = bi * len * hw;
            data[dst..dst + len * hw]
                .copy_from_slice(&self.bufs[input].data[src..src + len * hw]);
        }
        self.record_with_output(data, vec![batch, len, h, w], |out| TapeOp::SliceChannels {
            input, out, offset, len, total, batch, hw,
        })
    }

    /// Scalar mean-squared-error between a prediction and a target buffer.
    pub fn mse_loss(&mut self, pred: BufId, target: BufId) -> BufId {
        debug_assert_eq!(self.bufs[pred].numel(), self.bufs[target].numel());
        let loss = tensor::mse_f32(&self.bufs[pred].data, &self.bufs[target].data);
        self.record_with_output(vec![loss], vec![1], |out| TapeOp::MseLoss {
            pred, target, out,
        })
    }
}

/// Execute a closure with a fresh tape. The tape is dropped when the closure
/// returns, releasing the whole arena (all step intermediates) at once.
pub fn with_tape<F, R>(f: F) -> R
where
    F: FnOnce(&mut Tape) -> R,
{
    let mut tape = Tape::new();
    f(&mut tape)
}

// ── Tests ────────────────────────────────────────────────────────────
