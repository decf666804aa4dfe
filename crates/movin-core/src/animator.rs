//! Playback driver: owns the layer instances for one document, runs the
//! frame clock, and flattens the current pose into a render tree.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use kurbo::BezPath;
use movin_data::{Document, DocumentError};

use crate::error::BlendError;
use crate::layer::LayerNode;

struct BlendState {
    target: Arc<Document>,
    restore_loop: bool,
}

/// Stateful player for one [`Document`]. Time is driven externally through
/// [`Animator::advance`] with wall-clock deltas; everything else (loop wrap,
/// completion, blending) falls out of the frame clock.
pub struct Animator {
    document: Arc<Document>,
    layers: Vec<LayerNode>,
    /// Layer indices ordered parents-first, for world transform composition.
    order: Vec<usize>,
    index_by_ind: HashMap<u32, usize>,
    time: f32,
    frame: f32,
    run_start: f32,
    run_end: f32,
    playing: bool,
    looping: bool,
    completed: bool,
    blend: Option<BlendState>,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl Animator {
    /// Validates and instantiates a document. Starts paused at the first
    /// frame. The layer ordering below relies on validation having proved
    /// the parent links acyclic.
    pub fn new(document: Arc<Document>) -> Result<Self, DocumentError> {
        document.validate()?;
        let layers: Vec<LayerNode> = document.layers.iter().map(LayerNode::new).collect();
        let order = layer_order(&layers);
        let index_by_ind = layers.iter().enumerate().map(|(i, l)| (l.ind, i)).collect();
        let run_start = document.in_frame;
        let run_end = document.total_frames;
        let mut animator = Animator {
            document,
            layers,
            order,
            index_by_ind,
            time: 0.0,
            frame: run_start,
            run_start,
            run_end,
            playing: false,
            looping: false,
            completed: false,
            blend: None,
            on_complete: None,
        };
        animator.seek(run_start);
        Ok(animator)
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn frame(&self) -> f32 {
        self.frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Called once when a non-looping run reaches its last frame, and once
    /// when a blend lands on its target.
    pub fn on_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn play(&mut self) {
        if self.completed {
            self.restart();
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Halts playback and rewinds to the first frame.
    pub fn stop(&mut self) {
        self.playing = false;
        self.restart();
    }

    fn restart(&mut self) {
        self.time = 0.0;
        self.completed = false;
        for layer in &mut self.layers {
            layer.reset();
        }
        self.frame = self.run_start;
        for layer in &mut self.layers {
            layer.advance(self.frame);
        }
    }

    /// Advances the clock by `dt` seconds and re-poses every layer.
    pub fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.time += dt;
        let fps = self.document.frame_rate;
        let mut frame = self.run_start + self.time * fps;

        if frame >= self.run_end {
            if self.blend.is_some() {
                // Land the exact target pose, then swap documents.
                self.frame = self.run_end;
                for layer in &mut self.layers {
                    layer.finish(self.run_end);
                }
                self.finish_blend();
                return;
            }
            if self.looping {
                // Modulo wrap keeps sub-frame remainder so long sessions
                // never drift, unlike a plain reset to zero.
                let span_secs = (self.run_end - self.run_start) / fps;
                if span_secs > 0.0 {
                    self.time %= span_secs;
                } else {
                    self.time = 0.0;
                }
                frame = self.run_start + self.time * fps;
                for layer in &mut self.layers {
                    layer.reset();
                }
            } else {
                self.frame = self.run_end;
                for layer in &mut self.layers {
                    layer.finish(self.run_end);
                }
                self.playing = false;
                self.fire_complete();
                return;
            }
        }

        self.frame = frame;
        for layer in &mut self.layers {
            layer.advance(frame);
        }
    }

    /// Jumps to an arbitrary frame, forward or backward, and re-poses every
    /// layer from scratch. Clears any pending completion.
    pub fn seek(&mut self, frame: f32) {
        let frame = frame.clamp(self.run_start, self.run_end);
        self.frame = frame;
        let fps = self.document.frame_rate;
        self.time = if fps > 0.0 {
            (frame - self.run_start) / fps
        } else {
            0.0
        };
        self.completed = false;
        for layer in &mut self.layers {
            layer.seek(frame);
        }
    }

    /// Starts a timed transition from the current live pose toward `target`'s
    /// rest pose. While blending, looping is suspended and the blend window
    /// replaces the document's frame range; on landing, the animator rebinds
    /// to `target` and keeps playing it from its first frame.
    pub fn blend_to(
        &mut self,
        target: Arc<Document>,
        duration_frames: f32,
        ease: [Vec2; 2],
    ) -> Result<(), BlendError> {
        check_topology(&self.document, &target)?;

        for (layer, template) in self.layers.iter_mut().zip(&target.layers) {
            layer.retarget_from(template, 0.0, duration_frames, ease);
        }

        let restore_loop = self.blend.take().map(|b| b.restore_loop).unwrap_or(self.looping);
        self.blend = Some(BlendState {
            target,
            restore_loop,
        });
        self.looping = false;
        self.run_start = 0.0;
        self.run_end = duration_frames;
        self.time = 0.0;
        self.frame = 0.0;
        self.completed = false;
        self.playing = true;
        Ok(())
    }

    fn finish_blend(&mut self) {
        let Some(blend) = self.blend.take() else {
            return;
        };
        tracing::debug!(
            target_name = blend.target.name.as_deref().unwrap_or(""),
            "blend complete, rebinding"
        );
        self.document = blend.target;
        for (layer, template) in self.layers.iter_mut().zip(&self.document.layers) {
            layer.rebind(template);
        }
        self.order = layer_order(&self.layers);
        self.index_by_ind = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.ind, i))
            .collect();
        self.looping = blend.restore_loop;
        self.run_start = self.document.in_frame;
        self.run_end = self.document.total_frames;
        self.time = 0.0;
        self.frame = self.run_start;
        self.completed = false;
        for layer in &mut self.layers {
            layer.advance(self.frame);
        }
        if let Some(callback) = &mut self.on_complete {
            callback();
        }
    }

    fn fire_complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        if let Some(callback) = &mut self.on_complete {
            callback();
        }
    }

    /// Flattens the current pose: world transforms composed parents-first,
    /// visible layers only, contours as ready-to-draw bezier outlines.
    pub fn render_tree(&self) -> RenderTree {
        let mut world = vec![Mat4::IDENTITY; self.layers.len()];
        for &i in &self.order {
            let local = self.layers[i].local_matrix();
            let parent = self.layers[i].parent;
            world[i] = match self.index_by_ind.get(&parent) {
                Some(&p) if parent != 0 => world[p] * local,
                _ => local,
            };
        }

        let mut layers = Vec::new();
        for &i in &self.order {
            let layer = &self.layers[i];
            if !layer.visible() {
                continue;
            }
            let shapes = layer
                .shapes
                .iter()
                .map(|shape| RenderShape {
                    fill_color: (!shape.fill_hidden).then_some(shape.fill_color).flatten(),
                    stroke_color: (!shape.stroke_hidden)
                        .then_some(shape.stroke_color)
                        .flatten(),
                    stroke_width: shape.stroke_width,
                    opacity: shape.opacity,
                    contours: shape
                        .paths
                        .iter()
                        .map(|path| RenderContour {
                            closed: path.closed,
                            path: path.to_bez_path(),
                        })
                        .collect(),
                })
                .collect();
            layers.push(RenderLayer {
                ind: layer.ind,
                name: layer.name.clone(),
                transform: world[i],
                opacity: layer.opacity(),
                shapes,
            });
        }

        RenderTree {
            width: self.document.width,
            height: self.document.height,
            frame: self.frame,
            layers,
        }
    }
}

/// Flattened snapshot of one frame, ready for a renderer.
#[derive(Debug, Clone)]
pub struct RenderTree {
    pub width: u32,
    pub height: u32,
    pub frame: f32,
    pub layers: Vec<RenderLayer>,
}

#[derive(Debug, Clone)]
pub struct RenderLayer {
    pub ind: u32,
    pub name: Option<String>,
    pub transform: Mat4,
    pub opacity: f32,
    pub shapes: Vec<RenderShape>,
}

#[derive(Debug, Clone)]
pub struct RenderShape {
    pub fill_color: Option<Vec3>,
    pub stroke_color: Option<Vec3>,
    pub stroke_width: f32,
    pub opacity: f32,
    pub contours: Vec<RenderContour>,
}

#[derive(Debug, Clone)]
pub struct RenderContour {
    pub closed: bool,
    pub path: BezPath,
}

/// Orders layer indices so every parent precedes its children. Parent links
/// are validated acyclic before instantiation, so every pass places at least
/// one layer and the walk terminates.
fn layer_order(layers: &[LayerNode]) -> Vec<usize> {
    let mut order = Vec::with_capacity(layers.len());
    let mut placed = vec![false; layers.len()];
    loop {
        let before = order.len();
        for i in 0..layers.len() {
            if placed[i] {
                continue;
            }
            let parent = layers[i].parent;
            let ready = parent == 0
                || layers
                    .iter()
                    .enumerate()
                    .any(|(j, l)| placed[j] && l.ind == parent);
            if ready {
                placed[i] = true;
                order.push(i);
            }
        }
        if order.len() == layers.len() || order.len() == before {
            break;
        }
    }
    order
}

fn check_topology(current: &Document, target: &Document) -> Result<(), BlendError> {
    if current.layers.len() != target.layers.len() {
        return Err(BlendError::LayerCount {
            current: current.layers.len(),
            target: target.layers.len(),
        });
    }
    for (a, b) in current.layers.iter().zip(&target.layers) {
        if a.shapes.len() != b.shapes.len() {
            return Err(BlendError::ShapeCount {
                layer: a.ind,
                current: a.shapes.len(),
                target: b.shapes.len(),
            });
        }
        for (si, (sa, sb)) in a.shapes.iter().zip(&b.shapes).enumerate() {
            if sa.paths.len() != sb.paths.len() {
                return Err(BlendError::ContourCount {
                    layer: a.ind,
                    shape: si,
                    current: sa.paths.len(),
                    target: sb.paths.len(),
                });
            }
            for (pi, (pa, pb)) in sa.paths.iter().zip(&sb.paths).enumerate() {
                if pa.points.len() != pb.points.len() {
                    return Err(BlendError::VertexCount {
                        layer: a.ind,
                        shape: si,
                        contour: pi,
                        current: pa.points.len(),
                        target: pb.points.len(),
                    });
                }
            }
        }
    }
    Ok(())
}
