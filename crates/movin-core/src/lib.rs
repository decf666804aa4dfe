//! Playback engine for Bodymovin vector animations.
//!
//! [`movin_data`] parses and validates a document; this crate instantiates it
//! into stateful layers and shapes, drives them with an [`Animator`], and
//! flattens each frame into a [`RenderTree`] for whatever renderer sits on
//! top. Cross-document transitions go through [`Animator::blend_to`].

pub mod animator;
pub mod ease;
pub mod error;
pub mod layer;
pub mod shape;
pub mod track;

pub use animator::{Animator, RenderContour, RenderLayer, RenderShape, RenderTree};
pub use error::{BlendError, DocumentError};
pub use layer::LayerNode;
pub use shape::{ShapeNode, ShapePath, ShapePoint};
pub use track::{Interpolate, MotionState, Track, TrackKey};
