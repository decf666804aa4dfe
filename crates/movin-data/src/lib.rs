//! Data structures and loader for Bodymovin vector-animation documents.

pub mod model;
pub mod parse;

pub use model::{
    Document, DocumentError, Keyframe, LayerTemplate, PathPoint, PathTemplate, PointSet,
    ShapeTemplate,
};
