//! Bodymovin JSON loader.
//!
//! Reads the exported short-name schema (`fr`/`ip`/`op`, `ks` transforms,
//! shape groups with `sh`/`fl`/`st` items) and produces the engine-facing
//! [`Document`] model. Only the subset the engine animates is read; unknown
//! shape items are skipped.
//!
//! Normalization happens here once: scale percent becomes a fraction,
//! opacity 0-100 becomes 0-1. Geometry stays in native document space.

use serde::Deserialize;
use std::path::Path;

use crate::model::{
    Document, DocumentError, Keyframe, LayerTemplate, PathPoint, PathTemplate, PointSet,
    ShapeTemplate, Vec2, Vec3,
};

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    nm: Option<String>,
    fr: f32,
    #[serde(default)]
    ip: f32,
    op: f32,
    #[serde(default)]
    w: u32,
    #[serde(default)]
    h: u32,
    #[serde(default)]
    layers: Vec<RawLayer>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    #[serde(default)]
    ind: Option<u32>,
    #[serde(default)]
    parent: Option<u32>,
    #[serde(default)]
    nm: Option<String>,
    #[serde(default)]
    ip: f32,
    /// Missing on some exports; the layer then runs to the document's end.
    #[serde(default)]
    op: Option<f32>,
    #[serde(default)]
    ks: RawTransform,
    #[serde(default)]
    shapes: Vec<RawShape>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransform {
    #[serde(default)]
    a: RawProperty,
    #[serde(default)]
    p: RawProperty,
    #[serde(default)]
    s: RawProperty,
    #[serde(default)]
    rx: RawProperty,
    #[serde(default)]
    ry: RawProperty,
    #[serde(default, alias = "r")]
    rz: RawProperty,
    #[serde(default)]
    o: RawProperty,
}

/// An animatable property: `a` flags animation, `k` is either a static value
/// or an array of keyframe objects. The payload shape depends on the property,
/// so `k` stays untyped here and is interpreted by the converters below.
#[derive(Debug, Default, Deserialize)]
struct RawProperty {
    #[serde(default)]
    a: u8,
    #[serde(default)]
    k: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawShape {
    #[serde(default)]
    nm: Option<String>,
    #[serde(default)]
    it: Vec<RawShapeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "ty")]
enum RawShapeItem {
    #[serde(rename = "sh")]
    Path {
        ks: RawProperty,
    },
    #[serde(rename = "fl")]
    Fill {
        c: RawProperty,
        #[serde(default)]
        hd: bool,
    },
    #[serde(rename = "st")]
    Stroke {
        c: RawProperty,
        w: RawProperty,
        #[serde(default)]
        hd: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct RawKeyframe {
    t: f32,
    #[serde(default)]
    s: Option<serde_json::Value>,
    #[serde(default)]
    e: Option<serde_json::Value>,
    #[serde(default)]
    i: Option<RawTangent>,
    #[serde(default)]
    o: Option<RawTangent>,
}

/// Ease tangent as exported: `{"x": [0.48], "y": [1]}`, occasionally with
/// bare numbers instead of one-element arrays.
#[derive(Debug, Deserialize)]
struct RawTangent {
    #[serde(default)]
    x: FloatOrVec,
    #[serde(default)]
    y: FloatOrVec,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FloatOrVec {
    Float(f32),
    Vec(Vec<f32>),
}

impl Default for FloatOrVec {
    fn default() -> Self {
        FloatOrVec::Vec(Vec::new())
    }
}

impl FloatOrVec {
    fn first(&self, fallback: f32) -> f32 {
        match self {
            FloatOrVec::Float(v) => *v,
            FloatOrVec::Vec(v) => v.first().copied().unwrap_or(fallback),
        }
    }
}

/// A path-morph payload: vertex array plus per-vertex tangent handles.
#[derive(Debug, Default, Deserialize)]
struct RawBezier {
    #[serde(default)]
    c: bool,
    #[serde(default)]
    i: Vec<Vec2>,
    #[serde(default)]
    o: Vec<Vec2>,
    #[serde(default)]
    v: Vec<Vec2>,
}

impl RawBezier {
    fn points(&self) -> PointSet {
        let zero = [0.0, 0.0];
        (0..self.v.len())
            .map(|idx| PathPoint {
                p: self.v[idx],
                i: self.i.get(idx).copied().unwrap_or(zero),
                o: self.o.get(idx).copied().unwrap_or(zero),
            })
            .collect()
    }
}

impl Document {
    pub fn from_json(json: &str) -> Result<Document, DocumentError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        let doc = convert(raw);
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Document, DocumentError> {
        let raw: RawDocument = serde_json::from_slice(bytes)?;
        let doc = convert(raw);
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Document, DocumentError> {
        let bytes = std::fs::read(path)?;
        Document::from_slice(&bytes)
    }
}

fn convert(raw: RawDocument) -> Document {
    let layers = raw
        .layers
        .iter()
        .enumerate()
        .map(|(idx, l)| convert_layer(l, idx as u32 + 1, raw.op))
        .collect();

    Document {
        name: raw.nm,
        frame_rate: raw.fr,
        in_frame: raw.ip,
        total_frames: raw.op,
        width: raw.w,
        height: raw.h,
        layers,
    }
}

fn convert_layer(raw: &RawLayer, fallback_ind: u32, doc_out: f32) -> LayerTemplate {
    let position_keys = vector_keys(&raw.ks.p, 0.0, 1.0);
    let scale_keys = vector_keys(&raw.ks.s, 100.0, 0.01);
    let rotation_x_keys = scalar_keys(&raw.ks.rx, 1.0);
    let rotation_y_keys = scalar_keys(&raw.ks.ry, 1.0);
    let rotation_z_keys = scalar_keys(&raw.ks.rz, 1.0);
    let opacity_keys = scalar_keys(&raw.ks.o, 0.01);

    // Static pose: the first keyframe's start value when animated, the
    // property's `k` otherwise.
    let position = position_keys
        .first()
        .map(|k| k.s)
        .unwrap_or_else(|| vec3(&raw.ks.p.k, 0.0, 1.0));
    let scale = scale_keys
        .first()
        .map(|k| k.s)
        .unwrap_or_else(|| vec3(&raw.ks.s.k, 100.0, 0.01));
    let rotation = [
        rotation_x_keys
            .first()
            .map(|k| k.s)
            .unwrap_or_else(|| scalar_or(&raw.ks.rx.k, 0.0)),
        rotation_y_keys
            .first()
            .map(|k| k.s)
            .unwrap_or_else(|| scalar_or(&raw.ks.ry.k, 0.0)),
        rotation_z_keys
            .first()
            .map(|k| k.s)
            .unwrap_or_else(|| scalar_or(&raw.ks.rz.k, 0.0)),
    ];
    let opacity = opacity_keys
        .first()
        .map(|k| k.s)
        .unwrap_or_else(|| scalar_or(&raw.ks.o.k, 100.0) * 0.01);

    LayerTemplate {
        ind: raw.ind.unwrap_or(fallback_ind),
        parent: raw.parent.unwrap_or(0),
        name: raw.nm.clone(),
        in_frame: raw.ip,
        out_frame: raw.op.unwrap_or(doc_out),
        anchor_point: vec3(&raw.ks.a.k, 0.0, 1.0),
        position,
        scale,
        rotation,
        opacity,
        position_keys,
        scale_keys,
        rotation_x_keys,
        rotation_y_keys,
        rotation_z_keys,
        opacity_keys,
        shapes: raw.shapes.iter().map(convert_shape).collect(),
    }
}

fn convert_shape(raw: &RawShape) -> ShapeTemplate {
    let mut shape = ShapeTemplate {
        name: raw.nm.clone(),
        ..ShapeTemplate::default()
    };

    for item in &raw.it {
        match item {
            RawShapeItem::Path { ks } => shape.paths.push(convert_path(ks)),
            RawShapeItem::Fill { c, hd } => {
                shape.fill_color_keys = color_keys(c);
                shape.fill_color = static_color(c, &shape.fill_color_keys);
                shape.fill_hidden = *hd;
            }
            RawShapeItem::Stroke { c, w, hd } => {
                shape.stroke_color_keys = color_keys(c);
                shape.stroke_color = static_color(c, &shape.stroke_color_keys);
                shape.stroke_width = scalar_or(&w.k, 1.0);
                shape.stroke_hidden = *hd;
            }
            RawShapeItem::Unknown => {}
        }
    }

    shape
}

fn convert_path(prop: &RawProperty) -> PathTemplate {
    let keys = build_keys(&prop.k, point_set, PointSet::new(), false);
    if let Some(first) = keys.first() {
        let closed = first_bezier_closed(&prop.k);
        return PathTemplate {
            closed,
            points: first.s.clone(),
            keys,
        };
    }

    match serde_json::from_value::<RawBezier>(prop.k.clone()) {
        Ok(bezier) => PathTemplate {
            closed: bezier.c,
            points: bezier.points(),
            keys: Vec::new(),
        },
        Err(_) => PathTemplate::default(),
    }
}

fn first_bezier_closed(k: &serde_json::Value) -> bool {
    k.as_array()
        .and_then(|keys| keys.first())
        .and_then(|kf| kf.get("s"))
        .and_then(|s| s.get(0))
        .and_then(|b| b.get("c"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

fn point_set(v: &serde_json::Value) -> PointSet {
    // Morph keyframe values wrap the bezier in a one-element array.
    match serde_json::from_value::<Vec<RawBezier>>(v.clone()) {
        Ok(beziers) => beziers.first().map(RawBezier::points).unwrap_or_default(),
        Err(_) => serde_json::from_value::<RawBezier>(v.clone())
            .map(|b| b.points())
            .unwrap_or_default(),
    }
}

fn scalar_keys(prop: &RawProperty, mul: f32) -> Vec<Keyframe<f32>> {
    build_keys(&prop.k, |v| scalar_or(v, 0.0) * mul, 0.0, false)
}

fn vector_keys(prop: &RawProperty, default: f32, mul: f32) -> Vec<Keyframe<Vec3>> {
    build_keys(&prop.k, |v| vec3(v, default, mul), [0.0; 3], false)
}

fn color_keys(prop: &RawProperty) -> Vec<Keyframe<Vec3>> {
    // Exports occasionally carry color ease tangents outside the unit box;
    // clamp them so the solver stays inside its domain.
    build_keys(&prop.k, |v| vec3(v, 0.0, 1.0), [0.0; 3], true)
}

fn static_color(prop: &RawProperty, keys: &[Keyframe<Vec3>]) -> Option<Vec3> {
    if let Some(first) = keys.first() {
        return Some(first.s);
    }
    let arr = prop.k.as_array()?;
    if arr.len() < 3 {
        return None;
    }
    Some(vec3(&prop.k, 0.0, 1.0))
}

fn build_keys<T: Clone>(
    k: &serde_json::Value,
    conv: impl Fn(&serde_json::Value) -> T,
    default: T,
    clamp_tangents: bool,
) -> Vec<Keyframe<T>> {
    // Animated `k` is an array of objects each carrying a time.
    let is_animated = k
        .as_array()
        .and_then(|a| a.first())
        .map(|first| first.get("t").is_some())
        .unwrap_or(false);
    if !is_animated {
        return Vec::new();
    }

    let raw: Vec<RawKeyframe> = match serde_json::from_value(k.clone()) {
        Ok(r) => r,
        Err(_) => return Vec::new(),
    };

    let mut keys: Vec<Keyframe<T>> = raw
        .iter()
        .map(|rk| Keyframe {
            t: rk.t,
            s: rk.s.as_ref().map(&conv).unwrap_or_else(|| default.clone()),
            e: rk.e.as_ref().map(&conv).unwrap_or_else(|| default.clone()),
            o: tangent(rk.o.as_ref(), [0.0, 0.0], clamp_tangents),
            i: tangent(rk.i.as_ref(), [1.0, 1.0], clamp_tangents),
        })
        .collect();

    // Newer exports drop the redundant end value; it is the next start.
    for idx in 0..keys.len() {
        if raw[idx].e.is_none() {
            keys[idx].e = if idx + 1 < keys.len() {
                keys[idx + 1].s.clone()
            } else {
                keys[idx].s.clone()
            };
        }
    }

    keys
}

fn tangent(raw: Option<&RawTangent>, fallback: Vec2, clamp: bool) -> Vec2 {
    let mut t = match raw {
        Some(rt) => [rt.x.first(fallback[0]), rt.y.first(fallback[1])],
        None => fallback,
    };
    if clamp {
        t = [t[0].clamp(-1.0, 1.0), t[1].clamp(-1.0, 1.0)];
    }
    t
}

fn scalar_or(v: &serde_json::Value, fallback: f32) -> f32 {
    match v {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32).unwrap_or(fallback),
        serde_json::Value::Array(arr) => arr
            .first()
            .and_then(serde_json::Value::as_f64)
            .map(|f| f as f32)
            .unwrap_or(fallback),
        _ => fallback,
    }
}

/// Reads up to three components, substituting `default` for any that are
/// missing. A wholly absent scale property must come out as 100 percent per
/// axis, not zero.
fn vec3(v: &serde_json::Value, default: f32, mul: f32) -> Vec3 {
    let get = |idx: usize| {
        v.as_array()
            .and_then(|a| a.get(idx))
            .and_then(serde_json::Value::as_f64)
            .map(|f| f as f32)
            .unwrap_or(default)
    };
    [get(0) * mul, get(1) * mul, get(2) * mul]
}
