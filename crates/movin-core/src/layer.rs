//! Layer instances: an animated transform, a visibility window, and the
//! shapes the layer owns.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use movin_data::LayerTemplate;

use crate::shape::ShapeNode;
use crate::track::{track_keys, Track};

/// One live layer. Transform channels each carry their own track; axes of
/// rotation animate independently, matching how the exporter splits them.
#[derive(Debug, Clone)]
pub struct LayerNode {
    pub ind: u32,
    pub parent: u32,
    pub name: Option<String>,
    pub shapes: Vec<ShapeNode>,
    in_frame: f32,
    out_frame: f32,
    visible: bool,
    anchor_point: Vec3,
    position: Vec3,
    scale: Vec3,
    /// Euler degrees per axis.
    rotation: Vec3,
    opacity: f32,
    position_track: Track<Vec3>,
    scale_track: Track<Vec3>,
    rotation_x_track: Track<f32>,
    rotation_y_track: Track<f32>,
    rotation_z_track: Track<f32>,
    opacity_track: Track<f32>,
}

impl LayerNode {
    pub fn new(template: &LayerTemplate) -> Self {
        LayerNode {
            ind: template.ind,
            parent: template.parent,
            name: template.name.clone(),
            shapes: template.shapes.iter().map(ShapeNode::new).collect(),
            in_frame: template.in_frame,
            out_frame: template.out_frame,
            visible: template.in_frame <= 0.0,
            anchor_point: Vec3::from(template.anchor_point),
            position: Vec3::from(template.position),
            scale: Vec3::from(template.scale),
            rotation: Vec3::from(template.rotation),
            opacity: template.opacity,
            position_track: Track::new(track_keys(&template.position_keys, |v| Vec3::from(*v))),
            scale_track: Track::new(track_keys(&template.scale_keys, |v| Vec3::from(*v))),
            rotation_x_track: Track::new(track_keys(&template.rotation_x_keys, |v| *v)),
            rotation_y_track: Track::new(track_keys(&template.rotation_y_keys, |v| *v)),
            rotation_z_track: Track::new(track_keys(&template.rotation_z_keys, |v| *v)),
            opacity_track: Track::new(track_keys(&template.opacity_keys, |v| *v)),
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Transform relative to the parent layer: scale and rotate about the
    /// anchor point, then translate. Rotation composes Z, then X, then Y.
    pub fn local_matrix(&self) -> Mat4 {
        let quat = Quat::from_euler(
            EulerRot::ZXY,
            self.rotation.z.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, quat, self.position)
            * Mat4::from_translation(-self.anchor_point)
    }

    /// Refreshes the visibility window, then advances every track. Outside
    /// the window the tracks hold their state; the catch-up walk on the next
    /// in-window frame lands the correct pose.
    pub fn advance(&mut self, frame: f32) {
        self.visible = frame >= self.in_frame && frame < self.out_frame;
        if !self.visible {
            return;
        }
        self.resolve(frame);
    }

    /// Lands the last frame of a run. The window end is inclusive here: a
    /// layer running to the document's final frame resolves and holds its
    /// terminal pose instead of winking out on the closing boundary.
    pub fn finish(&mut self, frame: f32) {
        self.visible = frame >= self.in_frame && frame <= self.out_frame;
        if !self.visible {
            return;
        }
        self.resolve(frame);
    }

    fn resolve(&mut self, frame: f32) {
        if let Some(v) = self.position_track.sample(frame) {
            self.position = v;
        }
        if let Some(v) = self.scale_track.sample(frame) {
            self.scale = v;
        }
        if let Some(v) = self.rotation_x_track.sample(frame) {
            self.rotation.x = v;
        }
        if let Some(v) = self.rotation_y_track.sample(frame) {
            self.rotation.y = v;
        }
        if let Some(v) = self.rotation_z_track.sample(frame) {
            self.rotation.z = v;
        }
        if let Some(v) = self.opacity_track.sample(frame) {
            self.opacity = v;
        }

        for shape in &mut self.shapes {
            shape.advance(frame);
            shape.opacity = self.opacity;
        }
    }

    pub fn seek(&mut self, frame: f32) {
        self.visible = frame >= self.in_frame && frame < self.out_frame;

        if let Some(v) = self.position_track.seek(frame) {
            self.position = v;
        }
        if let Some(v) = self.scale_track.seek(frame) {
            self.scale = v;
        }
        if let Some(v) = self.rotation_x_track.seek(frame) {
            self.rotation.x = v;
        }
        if let Some(v) = self.rotation_y_track.seek(frame) {
            self.rotation.y = v;
        }
        if let Some(v) = self.rotation_z_track.seek(frame) {
            self.rotation.z = v;
        }
        if let Some(v) = self.opacity_track.seek(frame) {
            self.opacity = v;
        }

        for shape in &mut self.shapes {
            shape.seek(frame);
            shape.opacity = self.opacity;
        }
    }

    pub fn reset(&mut self) {
        self.position_track.reset();
        self.scale_track.reset();
        self.rotation_x_track.reset();
        self.rotation_y_track.reset();
        self.rotation_z_track.reset();
        self.opacity_track.reset();
        for shape in &mut self.shapes {
            shape.reset();
        }
    }

    /// Installs single-segment tracks carrying every channel from its current
    /// value toward the target layer's rest pose. Shapes are paired by index;
    /// the caller validates counts beforehand.
    pub fn retarget_from(
        &mut self,
        target: &LayerTemplate,
        start_frame: f32,
        end_frame: f32,
        ease: [Vec2; 2],
    ) {
        self.position_track.retarget(
            start_frame,
            end_frame,
            ease,
            self.position,
            Vec3::from(target.position),
        );
        self.scale_track.retarget(
            start_frame,
            end_frame,
            ease,
            self.scale,
            Vec3::from(target.scale),
        );
        self.rotation_x_track.retarget(
            start_frame,
            end_frame,
            ease,
            self.rotation.x,
            target.rotation[0],
        );
        self.rotation_y_track.retarget(
            start_frame,
            end_frame,
            ease,
            self.rotation.y,
            target.rotation[1],
        );
        self.rotation_z_track.retarget(
            start_frame,
            end_frame,
            ease,
            self.rotation.z,
            target.rotation[2],
        );
        self.opacity_track.retarget(
            start_frame,
            end_frame,
            ease,
            self.opacity,
            target.opacity,
        );
        for (shape, template) in self.shapes.iter_mut().zip(&target.shapes) {
            shape.retarget_from(template, start_frame, end_frame, ease);
        }
    }

    /// Swaps in the target layer's own tracks once a blend has landed on its
    /// rest pose.
    pub fn rebind(&mut self, template: &LayerTemplate) {
        *self = LayerNode::new(template);
    }
}
