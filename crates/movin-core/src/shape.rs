//! Shape instances: bezier contours with morph tracks plus fill and stroke
//! styles with color tracks.

use glam::{Vec2, Vec3};
use kurbo::BezPath;
use movin_data::{PathTemplate, PointSet, ShapeTemplate};

use crate::track::{track_keys, Interpolate, Track};

/// One contour vertex in engine form. Tangent handles are relative to the
/// vertex position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePoint {
    pub p: Vec2,
    pub i: Vec2,
    pub o: Vec2,
}

/// Pointwise morph. Sets from the same document always match in length; the
/// zip clamps to the shorter side rather than panicking on malformed data.
impl Interpolate for Vec<ShapePoint> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| ShapePoint {
                p: a.p.lerp(b.p, t),
                i: a.i.lerp(b.i, t),
                o: a.o.lerp(b.o, t),
            })
            .collect()
    }
}

fn convert_points(set: &PointSet) -> Vec<ShapePoint> {
    set.iter()
        .map(|pt| ShapePoint {
            p: Vec2::from(pt.p),
            i: Vec2::from(pt.i),
            o: Vec2::from(pt.o),
        })
        .collect()
}

/// One live contour: current vertices plus the morph track driving them.
#[derive(Debug, Clone)]
pub struct ShapePath {
    pub closed: bool,
    points: Vec<ShapePoint>,
    track: Track<Vec<ShapePoint>>,
    dirty: bool,
}

impl ShapePath {
    pub fn new(template: &PathTemplate) -> Self {
        ShapePath {
            closed: template.closed,
            points: convert_points(&template.points),
            track: Track::new(track_keys(&template.keys, convert_points)),
            dirty: true,
        }
    }

    pub fn points(&self) -> &[ShapePoint] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// True when the vertices changed since the dirty flag was last cleared.
    /// Fresh paths start dirty so the first frame always tessellates.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn advance(&mut self, frame: f32) {
        if let Some(eased) = self.track.advance(frame) {
            if let Some(points) = self.track.value(eased) {
                self.points = points;
                self.dirty = true;
            }
        }
    }

    pub fn seek(&mut self, frame: f32) {
        if let Some(points) = self.track.seek(frame) {
            self.points = points;
            self.dirty = true;
        }
    }

    pub fn reset(&mut self) {
        self.track.reset();
    }

    /// Installs a synthetic morph from the current vertices toward the
    /// target contour's rest vertices.
    pub fn retarget_from(
        &mut self,
        target: &PathTemplate,
        start_frame: f32,
        end_frame: f32,
        ease: [Vec2; 2],
    ) {
        let end = convert_points(&target.points);
        self.track
            .retarget(start_frame, end_frame, ease, self.points.clone(), end);
    }

    /// Swaps in the target contour's own morph track once a blend has landed
    /// on its rest vertices.
    pub fn rebind(&mut self, template: &PathTemplate) {
        *self = ShapePath::new(template);
    }

    /// Builds the cubic outline for the current vertices. Tangent handles
    /// are relative, so control points are vertex + handle.
    pub fn to_bez_path(&self) -> BezPath {
        let mut bez = BezPath::new();
        let Some(first) = self.points.first() else {
            return bez;
        };
        bez.move_to(to_kurbo(first.p));
        for pair in self.points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            bez.curve_to(to_kurbo(a.p + a.o), to_kurbo(b.p + b.i), to_kurbo(b.p));
        }
        if self.closed && self.points.len() > 1 {
            let last = &self.points[self.points.len() - 1];
            bez.curve_to(
                to_kurbo(last.p + last.o),
                to_kurbo(first.p + first.i),
                to_kurbo(first.p),
            );
            bez.close_path();
        }
        bez
    }
}

fn to_kurbo(v: Vec2) -> kurbo::Point {
    kurbo::Point::new(v.x as f64, v.y as f64)
}

/// One live shape: its contours plus animated fill and stroke colors. Layer
/// opacity is pushed down here every frame so a renderer reads one struct.
#[derive(Debug, Clone)]
pub struct ShapeNode {
    pub name: Option<String>,
    pub paths: Vec<ShapePath>,
    pub fill_color: Option<Vec3>,
    pub fill_hidden: bool,
    pub stroke_color: Option<Vec3>,
    pub stroke_width: f32,
    pub stroke_hidden: bool,
    pub opacity: f32,
    fill_track: Track<Vec3>,
    stroke_track: Track<Vec3>,
}

impl ShapeNode {
    pub fn new(template: &ShapeTemplate) -> Self {
        ShapeNode {
            name: template.name.clone(),
            paths: template.paths.iter().map(ShapePath::new).collect(),
            fill_color: template.fill_color.map(Vec3::from),
            fill_hidden: template.fill_hidden,
            stroke_color: template.stroke_color.map(Vec3::from),
            stroke_width: template.stroke_width,
            stroke_hidden: template.stroke_hidden,
            opacity: 1.0,
            fill_track: Track::new(track_keys(&template.fill_color_keys, |c| Vec3::from(*c))),
            stroke_track: Track::new(track_keys(&template.stroke_color_keys, |c| {
                Vec3::from(*c)
            })),
        }
    }

    pub fn advance(&mut self, frame: f32) {
        for path in &mut self.paths {
            path.advance(frame);
        }
        if let Some(color) = self.fill_track.sample(frame) {
            self.fill_color = Some(color);
        }
        if let Some(color) = self.stroke_track.sample(frame) {
            self.stroke_color = Some(color);
        }
    }

    pub fn seek(&mut self, frame: f32) {
        for path in &mut self.paths {
            path.seek(frame);
        }
        if let Some(color) = self.fill_track.seek(frame) {
            self.fill_color = Some(color);
        }
        if let Some(color) = self.stroke_track.seek(frame) {
            self.stroke_color = Some(color);
        }
    }

    pub fn reset(&mut self) {
        for path in &mut self.paths {
            path.reset();
        }
        self.fill_track.reset();
        self.stroke_track.reset();
    }

    /// Retargets every contour and color toward the matching shape of a new
    /// document. Contours are paired by index; the caller validates counts.
    pub fn retarget_from(
        &mut self,
        target: &ShapeTemplate,
        start_frame: f32,
        end_frame: f32,
        ease: [Vec2; 2],
    ) {
        for (path, template) in self.paths.iter_mut().zip(&target.paths) {
            path.retarget_from(template, start_frame, end_frame, ease);
        }
        if let (Some(current), Some(end)) = (self.fill_color, target.fill_color) {
            self.fill_track
                .retarget(start_frame, end_frame, ease, current, Vec3::from(end));
        }
        if let (Some(current), Some(end)) = (self.stroke_color, target.stroke_color) {
            self.stroke_track
                .retarget(start_frame, end_frame, ease, current, Vec3::from(end));
        }
    }

    pub fn rebind(&mut self, template: &ShapeTemplate) {
        let opacity = self.opacity;
        *self = ShapeNode::new(template);
        self.opacity = opacity;
    }
}
