//! Generic per-property animation state machine.
//!
//! A [`Track`] owns an ordered keyframe list and the live [`MotionState`]
//! that walks it: current segment, its frame bounds, ease tangents, and a
//! completion flag. With K keyframes there are K-1 usable segments; the last
//! keyframe is the terminal hold value.

use glam::Vec2;

use crate::ease;

pub trait Interpolate: Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }
}

impl Interpolate for glam::Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        glam::Vec3::lerp(*self, *other, t)
    }
}

/// One keyframe in engine form: segment start/end values plus the ease
/// tangents shaping the segment toward the next keyframe.
#[derive(Debug, Clone)]
pub struct TrackKey<T> {
    pub t: f32,
    pub s: T,
    pub e: T,
    pub out_tangent: Vec2,
    pub in_tangent: Vec2,
}

/// Live per-track state, mutated on every advance and replaced wholesale when
/// the track is retargeted for a blend.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub key: usize,
    pub start_frame: f32,
    pub end_frame: f32,
    pub percent: f32,
    pub completed: bool,
    pub out_tangent: Vec2,
    pub in_tangent: Vec2,
}

/// Converts parsed keyframes into engine keys, mapping the payload type
/// through `convert` (data-model arrays in, math types out).
pub fn track_keys<M, T: Interpolate>(
    keys: &[movin_data::Keyframe<M>],
    convert: impl Fn(&M) -> T,
) -> Vec<TrackKey<T>> {
    keys.iter()
        .map(|k| TrackKey {
            t: k.t,
            s: convert(&k.s),
            e: convert(&k.e),
            out_tangent: Vec2::from(k.o),
            in_tangent: Vec2::from(k.i),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct SegmentValues<T> {
    start: T,
    end: T,
}

#[derive(Debug, Clone)]
pub struct Track<T: Interpolate> {
    keys: Vec<TrackKey<T>>,
    state: MotionState,
    seg: Option<SegmentValues<T>>,
}

impl<T: Interpolate> Track<T> {
    /// A track with zero keyframes starts (and stays) completed: it holds the
    /// template's static value and is never advanced.
    pub fn new(keys: Vec<TrackKey<T>>) -> Self {
        let mut track = Track {
            keys,
            state: MotionState::default(),
            seg: None,
        };
        if track.keys.is_empty() {
            track.state.completed = true;
        } else {
            track.set_segment(0);
        }
        track
    }

    pub fn completed(&self) -> bool {
        self.state.completed
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Loads segment `k`'s bounds, tangents, and values. Out-of-range indices
    /// wrap to 0, which is what a loop restart relies on.
    pub fn set_segment(&mut self, k: usize) {
        if self.keys.is_empty() {
            return;
        }
        let k = if k >= self.keys.len() { 0 } else { k };

        let key = &self.keys[k];
        self.state.key = k;
        self.state.start_frame = key.t;
        self.state.end_frame = self.keys.get(k + 1).map(|n| n.t).unwrap_or(key.t);
        self.state.out_tangent = key.out_tangent;
        self.state.in_tangent = key.in_tangent;
        self.state.percent = 0.0;
        self.state.completed = false;
        self.seg = Some(SegmentValues {
            start: key.s.clone(),
            end: key.e.clone(),
        });
    }

    /// Back to segment 0; used on loop restart.
    pub fn reset(&mut self) {
        if self.keys.is_empty() {
            self.state.completed = true;
        } else {
            self.set_segment(0);
        }
    }

    /// Steps the state machine to `frame` and returns the eased fraction to
    /// apply, or `None` when there is nothing left to apply (empty or already
    /// completed track). The transition into the terminal hold returns
    /// `Some(1.0)` exactly once so the final value lands even on a frame skip.
    pub fn advance(&mut self, frame: f32) -> Option<f32> {
        if self.keys.is_empty() {
            self.state.completed = true;
            return None;
        }
        if self.state.completed {
            return None;
        }

        if frame >= self.state.end_frame {
            // Catch up across any skipped segment boundaries. Wrapping back
            // to segment 0 means the data ran out from under us; bail rather
            // than loop forever.
            while frame >= self.state.end_frame {
                if self.state.key + 1 >= self.keys.len().saturating_sub(1) {
                    self.state.completed = true;
                    self.state.percent = 1.0;
                    return Some(1.0);
                }
                self.set_segment(self.state.key + 1);
                if self.state.key == 0 {
                    break;
                }
            }
        }

        let span = self.state.end_frame - self.state.start_frame;
        self.state.percent = if span > 0.0 {
            (frame - self.state.start_frame) / span
        } else {
            // Zero-length segment: pin to the boundary instead of dividing.
            1.0
        };

        match ease::cubic_bezier(self.state.out_tangent, self.state.in_tangent, self.state.percent)
        {
            Some(eased) => Some(eased),
            None => {
                tracing::debug!(
                    key = self.state.key,
                    percent = self.state.percent,
                    "ease unsolvable, freezing at segment start"
                );
                Some(0.0)
            }
        }
    }

    /// Resolves the current segment at the given eased fraction. A `percent`
    /// outside [0,1] means the frame sits before the freshly pointed segment
    /// (or past a malformed one): hold the start value, never extrapolate.
    pub fn value(&self, eased: f32) -> Option<T> {
        let seg = self.seg.as_ref()?;
        if self.state.percent < 0.0 || self.state.percent > 1.0 {
            return Some(seg.start.clone());
        }
        Some(seg.start.lerp(&seg.end, eased))
    }

    /// Advance and resolve in one step.
    pub fn sample(&mut self, frame: f32) -> Option<T> {
        let eased = self.advance(frame)?;
        self.value(eased)
    }

    /// Re-points the track at an arbitrary frame: back to segment 0, then a
    /// forward walk. Total for any frame, including backward seeks.
    pub fn seek(&mut self, frame: f32) -> Option<T> {
        if self.keys.is_empty() {
            self.state.completed = true;
            return None;
        }
        self.set_segment(0);
        let eased = self.advance(frame)?;
        self.value(eased)
    }

    /// Replaces the whole track with a synthetic single-segment one, used to
    /// blend from a live value toward a target document's initial value.
    pub fn retarget(
        &mut self,
        start_frame: f32,
        end_frame: f32,
        ease: [Vec2; 2],
        start_value: T,
        end_value: T,
    ) {
        self.keys = vec![TrackKey {
            t: start_frame,
            s: start_value.clone(),
            e: end_value.clone(),
            out_tangent: ease[0],
            in_tangent: ease[1],
        }];
        self.state = MotionState {
            key: 0,
            start_frame,
            end_frame,
            percent: 0.0,
            completed: false,
            out_tangent: ease[0],
            in_tangent: ease[1],
        };
        self.seg = Some(SegmentValues {
            start: start_value,
            end: end_value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ease::LINEAR;

    fn key(t: f32, s: f32, e: f32) -> TrackKey<f32> {
        TrackKey {
            t,
            s,
            e,
            out_tangent: LINEAR[0],
            in_tangent: LINEAR[1],
        }
    }

    #[test]
    fn empty_track_is_completed() {
        let mut track: Track<f32> = Track::new(vec![]);
        assert!(track.completed());
        assert_eq!(track.advance(5.0), None);
    }

    #[test]
    fn two_key_track_interpolates_and_holds() {
        let mut track = Track::new(vec![key(0.0, 0.0, 100.0), key(30.0, 100.0, 100.0)]);

        let v = track.sample(15.0).unwrap();
        assert!((v - 50.0).abs() < 0.5, "midpoint was {v}");

        // Terminal transition applies the end value exactly once.
        assert_eq!(track.advance(30.0), Some(1.0));
        assert!(track.completed());
        assert_eq!(track.advance(31.0), None);
    }

    #[test]
    fn completes_exactly_once_over_contiguous_frames() {
        let mut track = Track::new(vec![
            key(0.0, 0.0, 10.0),
            key(10.0, 10.0, 20.0),
            key(20.0, 20.0, 20.0),
        ]);

        let mut completions = 0;
        for f in 0..40 {
            let was = track.completed();
            track.advance(f as f32);
            if track.completed() && !was {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
    }

    #[test]
    fn frame_skip_lands_on_terminal_value() {
        let mut track = Track::new(vec![
            key(0.0, 0.0, 10.0),
            key(10.0, 10.0, 20.0),
            key(20.0, 20.0, 20.0),
        ]);

        // Jump straight past every boundary.
        let eased = track.advance(100.0).unwrap();
        assert_eq!(eased, 1.0);
        assert_eq!(track.value(eased), Some(20.0));
        assert!(track.completed());
    }

    #[test]
    fn segment_stepping_crosses_boundaries() {
        let mut track = Track::new(vec![
            key(0.0, 0.0, 10.0),
            key(10.0, 10.0, 20.0),
            key(20.0, 20.0, 20.0),
        ]);

        let v = track.sample(5.0).unwrap();
        assert!((v - 5.0).abs() < 0.1);
        assert_eq!(track.state().key, 0);

        let v = track.sample(15.0).unwrap();
        assert!((v - 15.0).abs() < 0.1);
        assert_eq!(track.state().key, 1);
    }

    #[test]
    fn negative_percent_freezes_at_start() {
        let mut track = Track::new(vec![key(10.0, 5.0, 50.0), key(30.0, 50.0, 50.0)]);
        // Frame before the first segment's start.
        let eased = track.advance(2.0).unwrap();
        assert!(track.state().percent < 0.0);
        assert_eq!(track.value(eased), Some(5.0));
    }

    #[test]
    fn unsolvable_ease_freezes_at_segment_start() {
        let mut track = Track::new(vec![
            TrackKey {
                t: 0.0,
                s: 5.0,
                e: 50.0,
                out_tangent: Vec2::new(f32::NAN, 0.0),
                in_tangent: Vec2::new(1.0, 1.0),
            },
            key(30.0, 50.0, 50.0),
        ]);

        // Mid-segment with no bezier root: fraction 0, value held at start.
        let eased = track.advance(15.0).unwrap();
        assert_eq!(eased, 0.0);
        assert_eq!(track.value(eased), Some(5.0));
        assert!(!track.completed());

        // The segment boundary still completes and lands the end value.
        assert_eq!(track.advance(30.0), Some(1.0));
        assert_eq!(track.value(1.0), Some(50.0));
        assert!(track.completed());
    }

    #[test]
    fn seek_is_idempotent() {
        let mut track = Track::new(vec![
            key(0.0, 0.0, 10.0),
            key(10.0, 10.0, 20.0),
            key(20.0, 20.0, 20.0),
        ]);

        let a = track.seek(12.0);
        let b = track.seek(12.0);
        assert_eq!(a, b);

        // Backward seek after running ahead.
        track.seek(18.0);
        let c = track.seek(12.0);
        assert_eq!(a, c);
    }

    #[test]
    fn boundary_values_are_exact() {
        let mut track = Track::new(vec![key(0.0, 3.0, 7.0), key(10.0, 7.0, 7.0)]);
        assert_eq!(track.seek(0.0), Some(3.0));
        assert_eq!(track.seek(10.0), Some(7.0));
        assert_eq!(track.seek(25.0), Some(7.0));
    }

    #[test]
    fn retarget_installs_single_segment() {
        let mut track = Track::new(vec![key(0.0, 0.0, 10.0), key(10.0, 10.0, 10.0)]);
        track.sample(5.0);

        track.retarget(0.0, 20.0, LINEAR, 4.0, 8.0);
        let v = track.sample(10.0).unwrap();
        assert!((v - 6.0).abs() < 0.1, "blend midpoint was {v}");

        assert_eq!(track.advance(20.0), Some(1.0));
        assert!(track.completed());
    }

    #[test]
    fn reset_restarts_from_segment_zero() {
        let mut track = Track::new(vec![
            key(0.0, 0.0, 10.0),
            key(10.0, 10.0, 20.0),
            key(20.0, 20.0, 20.0),
        ]);
        track.advance(100.0);
        assert!(track.completed());

        track.reset();
        assert!(!track.completed());
        assert_eq!(track.state().key, 0);
        let v = track.sample(5.0).unwrap();
        assert!((v - 5.0).abs() < 0.1);
    }
}
