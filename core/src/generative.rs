// Generative unit: top-down prediction via a convolutional LSTM.
//
// The gate input is the channel-concat of the layer's own error, the 2x
// upsampled hidden of the layer above (absent at the top), and the previous
// hidden. One 3x3 conv produces all four gates; the state update is the
// standard LSTM recurrence.
//
// Absent recurrent inputs (the first time step) are materialized as zero
// tensors of the configured shapes. Absence of a top-down feed is a
// property of the top layer's wiring, never a zero-sized tensor.

use crate::forward::StepError;
use crate::model::{LayerConfig, LayerWires};
use crate::tape::{BufId, Tape};

/// Recurrent state of one generative unit. `hidden` is the designated
/// output component read by the discriminative pass and the layer below's
/// top-down feed.
#[derive(Debug, Clone, Copy)]
pub struct LayerState {
    pub hidden: BufId,
    pub cell: BufId,
}

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

/// Run one generative step. Returns the new layer state; both components
/// have shape [B, hidden, H, W].
///
/// `error` is this layer's error from the previous time step, `up_state` the
/// hidden of the layer above from the *current* step (half resolution, `None`
/// at the top), `prev` this layer's state from the previous step. `None`
/// recurrent inputs become zeros of the configured shapes.
pub fn generative_step(
    tape: &mut Tape,
    wires: &LayerWires,
    cfg: &LayerConfig,
    error: Option<BufId>,
    up_state: Option<BufId>,
    prev: Option<LayerState>,
) -> Result<LayerState, StepError> {
    let [b, _, h, w] = cfg.error_init;
    let hid = cfg.hidden_channels;

    let error = match error {
        Some(id) => {
            check_shape(tape, id, cfg.error_init, "generative error input")?;
            id
        }
        None => tape.zeros(&cfg.error_init),
    };

    let prev = match prev {
        Some(s) => {
            check_shape(tape, s.hidden, [b, hid, h, w], "generative previous hidden")?;
            check_shape(tape, s.cell, [b, hid, h, w], "generative previous cell")?;
            s
        }
        None => LayerState {
            hidden: tape.zeros(&[b, hid, h, w]),
            cell: tape.zeros(&[b, hid, h, w]),
        },
    };

    // The top layer has no top-down feed; everywhere else the half-resolution
    // hidden from above is upsampled to this layer's grid.
    let gate_in = match (up_state, cfg.up_channels) {
        (None, 0) => tape.concat_channels(&[error, prev.hidden]),
        (Some(up), up_c) if up_c > 0 => {
            check_shape(tape, up, [b, up_c, h / 2, w / 2], "generative top-down state")?;
            let up_full = tape.upsample2(up);
            tape.concat_channels(&[error, up_full, prev.hidden])
        }
        // Only reachable when the guard above failed, i.e. up_c == 0.
        (Some(up), _) => {
            return Err(StepError::ShapeMismatch {
                context: "generative top-down state",
                expected: vec![],
                got: tape.buf_shape(up).to_vec(),
            })
        }
        (None, up_c) => {
            return Err(StepError::ShapeMismatch {
                context: "generative top-down state",
                expected: vec![b, up_c, h / 2, w / 2],
                got: vec![],
            })
        }
    };

    let gates = tape.conv2d(gate_in, wires.w_gates, wires.b_gates);
    let in_gate = tape.slice_channels(gates, 0, hid);
    let in_gate = tape.sigmoid(in_gate);
    let forget_gate = tape.slice_channels(gates, hid, hid);
    let forget_gate = tape.sigmoid(forget_gate);
    let cell_gate = tape.slice_channels(gates, 2 * hid, hid);
    let cell_gate = tape.tanh(cell_gate);
    let out_gate = tape.slice_channels(gates, 3 * hid, hid);
    let out_gate = tape.sigmoid(out_gate);

    let keep = tape.mul(forget_gate, prev.cell);
    let write = tape.mul(in_gate, cell_gate);
    let cell = tape.add(keep, write);
    let cell_act = tape.tanh(cell);
    let hidden = tape.mul(out_gate, cell_act);

    Ok(LayerState { hidden, cell })
}
