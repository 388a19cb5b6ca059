//! Hierarchical predictive-coding network for video-frame prediction.
//!
//! A stack of L layers alternates a top-down generative prediction with a
//! bottom-up error computation every time step, carrying per-layer
//! error/state tensors across steps. Training unrolls the composer over a
//! frame sequence on a Wengert tape and backpropagates through the whole
//! sequence.

pub mod tensor;
pub mod tape;
pub mod schedule;
pub mod model;
pub mod discriminative;
pub mod generative;
pub mod forward;
pub mod training;
