use glam::Mat4;
use rustc_hash::FxHashMap;
use tessel_common::{Color, UvRect};

/// One quad queued for drawing: the model matrix applied to the unit quad,
/// the texture region it samples and its tint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSubmission {
    pub transform: Mat4,
    pub uv: UvRect,
    pub tint: Color,
}

impl BatchSubmission {
    /// Full-texture, untinted quad.
    pub fn quad(transform: Mat4) -> Self {
        Self {
            transform,
            uv: UvRect::FULL,
            tint: Color::WHITE,
        }
    }

    pub fn with_uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }
}

/// Submissions sharing one texture, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureGroup {
    pub key: String,
    pub submissions: Vec<BatchSubmission>,
}

/// Anything that accepts quads keyed by texture. Render systems write into
/// this so they can target a renderer or a bare accumulator.
pub trait QuadSink {
    fn submit(&mut self, texture: &str, submission: BatchSubmission);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    Recording,
    Ended,
}

/// Collects one frame of submissions grouped by texture.
///
/// Groups come out in the order their texture was first submitted; each
/// group keeps its own submissions in submission order. Submitting outside
/// `begin_frame`/`end_frame` is a programming error and panics.
#[derive(Debug)]
pub struct BatchAccumulator {
    state: FrameState,
    groups: Vec<TextureGroup>,
    lookup: FxHashMap<String, usize>,
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self {
            state: FrameState::Idle,
            groups: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    /// Discard the previous frame and start recording.
    pub fn begin_frame(&mut self) {
        self.groups.clear();
        self.lookup.clear();
        self.state = FrameState::Recording;
    }

    pub fn submit(&mut self, texture: &str, submission: BatchSubmission) {
        assert!(
            self.state == FrameState::Recording,
            "batch submit outside begin_frame/end_frame"
        );
        let slot = match self.lookup.get(texture) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.lookup.insert(texture.to_owned(), slot);
                self.groups.push(TextureGroup {
                    key: texture.to_owned(),
                    submissions: Vec::new(),
                });
                slot
            }
        };
        self.groups[slot].submissions.push(submission);
    }

    pub fn submit_quad(&mut self, transform: Mat4, texture: &str) {
        self.submit(texture, BatchSubmission::quad(transform));
    }

    /// Close the frame and hand out its groups in first-seen texture order.
    pub fn end_frame(&mut self) -> &[TextureGroup] {
        assert!(
            self.state == FrameState::Recording,
            "end_frame without a matching begin_frame"
        );
        self.state = FrameState::Ended;
        &self.groups
    }

    pub fn is_recording(&self) -> bool {
        self.state == FrameState::Recording
    }

    /// Groups recorded so far (or by the last ended frame).
    pub fn groups(&self) -> &[TextureGroup] {
        &self.groups
    }

    pub fn submission_count(&self) -> usize {
        self.groups.iter().map(|g| g.submissions.len()).sum()
    }
}

impl QuadSink for BatchAccumulator {
    fn submit(&mut self, texture: &str, submission: BatchSubmission) {
        BatchAccumulator::submit(self, texture, submission);
    }
}
