use thiserror::Error;

pub use movin_data::DocumentError;

/// A cross-document blend requires structurally matching documents: same
/// layer count, and per layer the same shape, contour, and vertex counts.
/// Validation runs before any track is touched, so a failed blend leaves the
/// animator exactly as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlendError {
    #[error("layer count mismatch: current {current}, target {target}")]
    LayerCount { current: usize, target: usize },
    #[error("layer {layer}: shape count mismatch: current {current}, target {target}")]
    ShapeCount {
        layer: u32,
        current: usize,
        target: usize,
    },
    #[error("layer {layer}, shape {shape}: contour count mismatch: current {current}, target {target}")]
    ContourCount {
        layer: u32,
        shape: usize,
        current: usize,
        target: usize,
    },
    #[error(
        "layer {layer}, shape {shape}, contour {contour}: vertex count mismatch: current {current}, target {target}"
    )]
    VertexCount {
        layer: u32,
        shape: usize,
        contour: usize,
        current: usize,
        target: usize,
    },
}
