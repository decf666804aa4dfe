use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];

/// Errors raised while loading or validating a document. All of these are
/// fatal: a document that fails validation never instantiates an animation.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document has no layers")]
    NoLayers,
    #[error("layer {ind} references unknown parent {parent}")]
    UnknownParent { ind: u32, parent: u32 },
    #[error("layer {ind} is part of a parent cycle")]
    ParentCycle { ind: u32 },
    #[error("layer {layer}: {property} keyframes are not sorted by time")]
    UnorderedKeyframes { layer: u32, property: &'static str },
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One timed control point of a keyframe track. `s` and `e` are the segment's
/// start and end values; `o` and `i` are the ease tangents shaping the segment
/// toward the next keyframe. A track with K keyframes has K-1 usable segments;
/// the last keyframe is the terminal hold value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub t: f32,
    pub s: T,
    pub e: T,
    pub o: Vec2,
    pub i: Vec2,
}

/// One bezier contour vertex: position plus in/out tangent handles, both
/// relative to the position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathPoint {
    pub p: Vec2,
    pub i: Vec2,
    pub o: Vec2,
}

/// An ordered vertex set, the payload of one path-morph keyframe.
pub type PointSet = Vec<PathPoint>;

/// One contour of a shape: its rest vertices plus an optional morph track.
/// When `keys` is non-empty, `points` holds the first keyframe's start set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathTemplate {
    pub closed: bool,
    pub points: PointSet,
    #[serde(default)]
    pub keys: Vec<Keyframe<PointSet>>,
}

/// One drawable shape: one or more contours sharing a fill and a stroke.
/// Colors are normalized 0-1 RGB; `None` means the style is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeTemplate {
    pub name: Option<String>,
    pub paths: Vec<PathTemplate>,
    pub fill_color: Option<Vec3>,
    pub fill_hidden: bool,
    #[serde(default)]
    pub fill_color_keys: Vec<Keyframe<Vec3>>,
    pub stroke_color: Option<Vec3>,
    pub stroke_width: f32,
    pub stroke_hidden: bool,
    #[serde(default)]
    pub stroke_color_keys: Vec<Keyframe<Vec3>>,
}

/// One animation layer: a transform, its keyframe tracks, and child shapes.
/// Scale and opacity are stored as fractions (1.0 = 100%); rotation is Euler
/// degrees per axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerTemplate {
    pub ind: u32,
    /// `ind` of the parent layer; 0 when the layer is a root.
    pub parent: u32,
    pub name: Option<String>,
    pub in_frame: f32,
    pub out_frame: f32,
    pub anchor_point: Vec3,
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Vec3,
    pub opacity: f32,
    #[serde(default)]
    pub position_keys: Vec<Keyframe<Vec3>>,
    #[serde(default)]
    pub scale_keys: Vec<Keyframe<Vec3>>,
    #[serde(default)]
    pub rotation_x_keys: Vec<Keyframe<f32>>,
    #[serde(default)]
    pub rotation_y_keys: Vec<Keyframe<f32>>,
    #[serde(default)]
    pub rotation_z_keys: Vec<Keyframe<f32>>,
    #[serde(default)]
    pub opacity_keys: Vec<Keyframe<f32>>,
    pub shapes: Vec<ShapeTemplate>,
}

impl Default for LayerTemplate {
    fn default() -> Self {
        LayerTemplate {
            ind: 0,
            parent: 0,
            name: None,
            in_frame: 0.0,
            out_frame: f32::MAX,
            anchor_point: [0.0; 3],
            position: [0.0; 3],
            scale: [1.0; 3],
            rotation: [0.0; 3],
            opacity: 1.0,
            position_keys: Vec::new(),
            scale_keys: Vec::new(),
            rotation_x_keys: Vec::new(),
            rotation_y_keys: Vec::new(),
            rotation_z_keys: Vec::new(),
            opacity_keys: Vec::new(),
            shapes: Vec::new(),
        }
    }
}

/// Immutable parsed animation definition. Owned by whichever animator is
/// displaying it, or shared read-only across animators behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: Option<String>,
    pub frame_rate: f32,
    pub in_frame: f32,
    pub total_frames: f32,
    pub width: u32,
    pub height: u32,
    pub layers: Vec<LayerTemplate>,
}

impl Document {
    /// Structural validation, run by the loader. Parent links must resolve
    /// and be acyclic; keyframe tracks must be sorted ascending by time.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.layers.is_empty() {
            return Err(DocumentError::NoLayers);
        }

        for layer in &self.layers {
            if layer.parent == 0 {
                continue;
            }
            // Walk the parent chain with a hop budget so malformed links
            // surface as an error instead of looping forever.
            let mut current = layer.parent;
            for _ in 0..=self.layers.len() {
                if current == 0 {
                    break;
                }
                if current == layer.ind {
                    return Err(DocumentError::ParentCycle { ind: layer.ind });
                }
                match self.layers.iter().find(|l| l.ind == current) {
                    Some(next) => current = next.parent,
                    None => {
                        return Err(DocumentError::UnknownParent {
                            ind: layer.ind,
                            parent: current,
                        })
                    }
                }
            }
            if current != 0 {
                return Err(DocumentError::ParentCycle { ind: layer.ind });
            }
        }

        for layer in &self.layers {
            check_sorted(&layer.position_keys, layer.ind, "position")?;
            check_sorted(&layer.scale_keys, layer.ind, "scale")?;
            check_sorted(&layer.rotation_x_keys, layer.ind, "rotation-x")?;
            check_sorted(&layer.rotation_y_keys, layer.ind, "rotation-y")?;
            check_sorted(&layer.rotation_z_keys, layer.ind, "rotation-z")?;
            check_sorted(&layer.opacity_keys, layer.ind, "opacity")?;
            for shape in &layer.shapes {
                check_sorted(&shape.fill_color_keys, layer.ind, "fill color")?;
                check_sorted(&shape.stroke_color_keys, layer.ind, "stroke color")?;
                for path in &shape.paths {
                    check_sorted(&path.keys, layer.ind, "path")?;
                }
            }
        }

        Ok(())
    }
}

fn check_sorted<T>(
    keys: &[Keyframe<T>],
    layer: u32,
    property: &'static str,
) -> Result<(), DocumentError> {
    if keys.windows(2).all(|w| w[0].t <= w[1].t) {
        Ok(())
    } else {
        Err(DocumentError::UnorderedKeyframes { layer, property })
    }
}
