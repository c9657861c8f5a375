//! The pausable, step-limited incremental content driver.

use crate::page_objects::{ObjectKind, PageObject};

/// Driver lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    ToBeContinued,
    Done,
}

/// Which phase of work the driver is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    GetContent,
    Parse,
    CheckClip,
}

/// One source content stream, loaded or still pending.
enum SourceStream {
    Pending,
    Loaded(Vec<u8>),
}

/// `Parse(data, len, step_limit) -> consumed_bytes`, the only thing the
/// driver needs from the (externally owned) operator-level content parser.
pub trait SubParser {
    fn parse(&mut self, data: &[u8], step_limit: u32) -> usize;
    fn type3_data(&self) -> Option<Type3Data> {
        None
    }

    /// Applied once, right after construction, when the driver was built via
    /// [`ContentDriver::new_for_form`] with a [`FormSetup`]: installs the
    /// `BBox` clip (already resolved to device space) as the sub-parser's
    /// initial clip, and resets blend mode/alpha/soft mask if the form is a
    /// transparency group. The graphics-state fields this mutates belong to
    /// the sub-parser, not this crate, so the default is a no-op.
    fn apply_initial_form_state(&mut self, _state: &FormInitialState) {}
}

/// A 2D affine transform, PDF's six-number `[a b c d e f]` matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self ∘ other`: apply `self` first, then `other` — matches the
    /// the form-setup "Matrix entry ∘ parent CTM" composition order.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// The axis-aligned bounding box of `r`'s four corners after transform.
    pub fn transform_rect(&self, r: &Rect) -> Rect {
        let pts = [
            self.apply(r.left, r.bottom),
            self.apply(r.right, r.bottom),
            self.apply(r.right, r.top),
            self.apply(r.left, r.top),
        ];
        let (mut left, mut bottom) = (f32::INFINITY, f32::INFINITY);
        let (mut right, mut top) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (x, y) in pts {
            left = left.min(x);
            right = right.max(x);
            bottom = bottom.min(y);
            top = top.max(y);
        }
        Rect { left, bottom, right, top }
    }
}

/// Inputs needed to set up a form XObject's initial graphics state.
/// `matrix` is the form dictionary's own `Matrix` entry;
/// `parent_ctm` is the CTM in force where the form is invoked.
pub struct FormSetup {
    pub matrix: Matrix,
    pub parent_ctm: Matrix,
    pub bbox: Option<Rect>,
    pub is_transparency_group: bool,
}

/// The resolved initial state a [`SubParser`] should apply to its current
/// graphics state before parsing a form's content, per
/// [`SubParser::apply_initial_form_state`].
pub struct FormInitialState {
    /// The `BBox` clip rectangle, already transformed into device space.
    pub clip: Option<Rect>,
    /// Whether to reset blend mode to Normal, stroke/fill alpha to 1.0, and
    /// clear the soft mask, because the form declares transparency-group
    /// membership.
    pub reset_transparency_group: bool,
}

impl FormSetup {
    /// `form_matrix = Matrix entry ∘ parent CTM`, plus the resolved initial
    /// state to apply to the sub-parser once it exists.
    fn resolve(&self) -> (Matrix, FormInitialState) {
        let form_matrix = self.matrix.concat(&self.parent_ctm);
        let clip = self.bbox.as_ref().map(|b| form_matrix.transform_rect(b));
        (
            form_matrix,
            FormInitialState {
                clip,
                reset_transparency_group: self.is_transparency_group,
            },
        )
    }
}

/// Type-3 glyph finalization data reported back from a sub-parser.
#[derive(Debug, Clone, Copy)]
pub struct Type3Data {
    pub colored: bool,
    pub advance_width_em_thousandths: i32,
    pub bbox: [f32; 4],
}

/// `need_pause_now() -> bool`, called exactly once per outer step.
pub trait PauseSignal {
    fn need_pause_now(&mut self) -> bool;
}

/// A rectangle in the same coordinate space as page object bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Rect {
    /// Whether `self` fully contains `other`.
    pub fn contains(&self, other: &Rect) -> bool {
        self.left <= other.left
            && other.right <= self.right
            && self.bottom <= other.bottom
            && other.top <= self.top
    }
}

/// Where the driver takes its content from.
pub enum ContentSource {
    /// A page (or form XObject) with a missing or unusable content source.
    Missing,
    /// A single content stream, already loaded.
    Single(Vec<u8>),
    /// An array of content streams, loaded lazily one at a time.
    Array(Vec<SourceLoader>),
}

/// A callback that loads one element of a `Contents` array on demand.
pub type SourceLoader = Box<dyn FnMut() -> Option<Vec<u8>>>;

/// The pausable state machine that gathers content, parses it, and
/// finalizes page objects.
pub struct ContentDriver<P: SubParser> {
    status: Status,
    stage: Stage,
    streams: Vec<SourceStream>,
    loaders: Vec<SourceLoader>,
    next_to_load: usize,
    buffer: Option<Vec<u8>>,
    offset: usize,
    sub_parser: Option<P>,
    step_limit: u32,
    objects: Vec<PageObject>,
    type3: Option<Type3Output>,
    pending_form_state: Option<FormInitialState>,
}

/// Slot the driver fills in when finalizing a Type-3 character.
#[derive(Default)]
pub struct Type3Output {
    pub colored: bool,
    pub advance_width_em_thousandths: i32,
    pub bbox: [f32; 4],
}

impl<P: SubParser> ContentDriver<P> {
    /// Build a driver for a page whose content source is already resolved
    /// into either nothing, one stream, or an array of lazy loaders, per
    /// the page's "Initial setup" sequence.
    pub fn new_for_page(source: ContentSource, step_limit: u32) -> Self {
        match source {
            ContentSource::Missing => Self {
                status: Status::Done,
                stage: Stage::GetContent,
                streams: Vec::new(),
                loaders: Vec::new(),
                next_to_load: 0,
                buffer: None,
                offset: 0,
                sub_parser: None,
                step_limit,
                objects: Vec::new(),
                type3: None,
                pending_form_state: None,
            },
            ContentSource::Single(data) => Self {
                status: Status::ToBeContinued,
                stage: Stage::Parse,
                streams: Vec::new(),
                loaders: Vec::new(),
                next_to_load: 0,
                buffer: Some(data),
                offset: 0,
                sub_parser: None,
                step_limit,
                objects: Vec::new(),
                type3: None,
                pending_form_state: None,
            },
            ContentSource::Array(loaders) => {
                let count = loaders.len();
                Self {
                    status: Status::ToBeContinued,
                    stage: Stage::GetContent,
                    streams: (0..count).map(|_| SourceStream::Pending).collect(),
                    loaders,
                    next_to_load: 0,
                    buffer: None,
                    offset: 0,
                    sub_parser: None,
                    step_limit,
                    objects: Vec::new(),
                    type3: None,
                    pending_form_state: None,
                }
            }
        }
    }

    /// Build a driver already positioned to parse a form XObject's content
    /// stream, per the "Initial setup for a form XObject" sequence. `setup`,
    /// when present, has its `form_matrix` and `BBox` clip resolved right
    /// away; the result is applied to the sub-parser's graphics state via
    /// [`SubParser::apply_initial_form_state`] the moment the sub-parser is
    /// constructed (lazily, on the first `Parse` step).
    pub fn new_for_form(content: Vec<u8>, step_limit: u32, setup: Option<FormSetup>) -> Self {
        Self {
            status: Status::ToBeContinued,
            stage: Stage::Parse,
            streams: Vec::new(),
            loaders: Vec::new(),
            next_to_load: 0,
            buffer: Some(content),
            offset: 0,
            sub_parser: None,
            step_limit,
            objects: Vec::new(),
            type3: None,
            pending_form_state: setup.map(|s| s.resolve().1),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn objects(&self) -> &[PageObject] {
        &self.objects
    }

    pub fn push_object(&mut self, obj: PageObject) {
        self.objects.push(obj);
    }

    /// Drive the state machine until it pauses or finishes.
    pub fn continue_parse(
        &mut self,
        make_sub_parser: impl FnOnce() -> P,
        pause: &mut impl PauseSignal,
    ) {
        let mut make_sub_parser = Some(make_sub_parser);

        while self.status == Status::ToBeContinued {
            log::trace!("content driver stage {:?}", self.stage);
            match self.stage {
                Stage::GetContent => self.step_get_content(),
                Stage::Parse => self.step_parse(&mut make_sub_parser),
                Stage::CheckClip => self.step_check_clip(),
            }

            if pause.need_pause_now() {
                break;
            }
        }
    }

    fn step_get_content(&mut self) {
        if self.next_to_load >= self.loaders.len() {
            let single_alias = if self.streams.len() == 1 {
                match &self.streams[0] {
                    SourceStream::Loaded(_) => true,
                    SourceStream::Pending => false,
                }
            } else {
                false
            };

            if single_alias {
                if let Some(SourceStream::Loaded(data)) = self.streams.drain(..).next() {
                    self.buffer = Some(data);
                }
            } else {
                self.buffer = Some(concatenate(&self.streams));
            }
            self.streams.clear();
            self.stage = Stage::Parse;
            return;
        }

        let idx = self.next_to_load;
        if let Some(data) = self.loaders[idx]() {
            self.streams[idx] = SourceStream::Loaded(data);
        } else {
            self.streams[idx] = SourceStream::Loaded(Vec::new());
        }
        self.next_to_load += 1;
    }

    fn step_parse(&mut self, make_sub_parser: &mut Option<impl FnOnce() -> P>) {
        if self.sub_parser.is_none() {
            if let Some(f) = make_sub_parser.take() {
                self.sub_parser = Some(f());
                if let Some(state) = self.pending_form_state.take() {
                    if let Some(p) = self.sub_parser.as_mut() {
                        p.apply_initial_form_state(&state);
                    }
                }
            }
        }

        let size = self.buffer.as_ref().map(|b| b.len()).unwrap_or(0);
        if self.offset >= size {
            self.stage = Stage::CheckClip;
            return;
        }

        let data = self.buffer.as_deref().unwrap_or(&[]);
        let advance = self
            .sub_parser
            .as_mut()
            .map(|p| p.parse(&data[self.offset..], self.step_limit))
            .unwrap_or(size - self.offset);
        self.offset += advance.max(1);
    }

    fn step_check_clip(&mut self) {
        if let Some(data) = self.sub_parser.as_ref().and_then(|p| p.type3_data()) {
            self.type3 = Some(Type3Output {
                colored: data.colored,
                advance_width_em_thousandths: data.advance_width_em_thousandths,
                bbox: data.bbox,
            });
        }

        simplify_clip_paths(&mut self.objects);
        self.status = Status::Done;
    }

    pub fn type3_output(&self) -> Option<&Type3Output> {
        self.type3.as_ref()
    }
}

/// Concatenate loaded streams with one `0x20` separator after each,
/// overflow-checked.
fn concatenate(streams: &[SourceStream]) -> Vec<u8> {
    let total: usize = streams
        .iter()
        .map(|s| match s {
            SourceStream::Loaded(data) => data.len(),
            SourceStream::Pending => 0,
        })
        .fold(0usize, |acc, len| acc.checked_add(len).expect("content size overflow"))
        .checked_add(streams.len())
        .expect("content size overflow");

    let mut out = Vec::with_capacity(total);
    for s in streams {
        if let SourceStream::Loaded(data) = s {
            out.extend_from_slice(data);
        }
        out.push(b' ');
    }
    out
}

/// For each object whose clip path is a single non-text rectangular path and
/// whose kind is not a shading, drop the clip path if it fully contains the
/// object's bounds. Idempotent: a dropped clip path can't be dropped twice.
fn simplify_clip_paths(objects: &mut [PageObject]) {
    for obj in objects.iter_mut() {
        if matches!(obj.kind(), ObjectKind::Shading) {
            continue;
        }
        let drop = match obj.clip_rect() {
            Some(clip) => clip.contains(&obj.bounds()),
            None => false,
        };
        if drop {
            obj.clear_clip_path();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopPause;
    impl PauseSignal for NoopPause {
        fn need_pause_now(&mut self) -> bool {
            false
        }
    }

    struct AlwaysPause;
    impl PauseSignal for AlwaysPause {
        fn need_pause_now(&mut self) -> bool {
            true
        }
    }

    struct FakeSubParser;
    impl SubParser for FakeSubParser {
        fn parse(&mut self, data: &[u8], _step_limit: u32) -> usize {
            data.len()
        }
    }

    #[test]
    fn rect_contains() {
        let outer = Rect {
            left: 0.0,
            bottom: 0.0,
            right: 10.0,
            top: 10.0,
        };
        let inner = Rect {
            left: 1.0,
            bottom: 1.0,
            right: 9.0,
            top: 9.0,
        };
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn missing_content_goes_straight_to_done() {
        let driver: ContentDriver<FakeSubParser> =
            ContentDriver::new_for_page(ContentSource::Missing, 100);
        assert_eq!(driver.status(), Status::Done);
    }

    #[test]
    fn single_stream_runs_to_completion() {
        let mut driver: ContentDriver<FakeSubParser> =
            ContentDriver::new_for_page(ContentSource::Single(b"q Q".to_vec()), 100);
        driver.continue_parse(|| FakeSubParser, &mut NoopPause);
        assert_eq!(driver.status(), Status::Done);
    }

    #[test]
    fn pause_signal_stops_between_stages() {
        let mut driver: ContentDriver<FakeSubParser> =
            ContentDriver::new_for_page(ContentSource::Single(b"q Q".to_vec()), 100);
        driver.continue_parse(|| FakeSubParser, &mut AlwaysPause);
        assert_eq!(driver.status(), Status::ToBeContinued);
    }

    #[test]
    fn two_stream_concatenation_scenario() {
        let streams = ["q 1 0 0 1 0 0 cm", "Q"];
        let loaders: Vec<SourceLoader> = streams
            .iter()
            .map(|s| {
                let owned = s.as_bytes().to_vec();
                let mut done = false;
                Box::new(move || {
                    if done {
                        None
                    } else {
                        done = true;
                        Some(owned.clone())
                    }
                }) as SourceLoader
            })
            .collect();

        let mut driver: ContentDriver<FakeSubParser> =
            ContentDriver::new_for_page(ContentSource::Array(loaders), 100);
        driver.continue_parse(|| FakeSubParser, &mut NoopPause);

        assert_eq!(driver.status(), Status::Done);
    }

    #[test]
    fn concatenation_length_and_separator_positions() {
        let streams = vec![
            SourceStream::Loaded(b"q 1 0 0 1 0 0 cm".to_vec()),
            SourceStream::Loaded(b"Q".to_vec()),
        ];
        let buf = concatenate(&streams);
        assert_eq!(buf.len(), 19);
        assert_eq!(buf[16], b' ');
        assert_eq!(buf[18], b' ');
    }

    #[test]
    fn matrix_concat_composes_translation_then_scale() {
        let translate = Matrix {
            e: 10.0,
            f: 0.0,
            ..Matrix::IDENTITY
        };
        let scale = Matrix {
            a: 2.0,
            d: 2.0,
            ..Matrix::IDENTITY
        };
        // Translate first, then scale: (0,0) -> (10,0) -> (20,0).
        let composed = translate.concat(&scale);
        assert_eq!(composed.apply(0.0, 0.0), (20.0, 0.0));
    }

    #[test]
    fn transform_rect_axis_aligns_a_rotated_box() {
        let identity_scaled = Matrix {
            a: 2.0,
            d: 3.0,
            ..Matrix::IDENTITY
        };
        let r = Rect {
            left: 0.0,
            bottom: 0.0,
            right: 1.0,
            top: 1.0,
        };
        let out = identity_scaled.transform_rect(&r);
        assert_eq!(
            out,
            Rect {
                left: 0.0,
                bottom: 0.0,
                right: 2.0,
                top: 3.0,
            }
        );
    }

    struct RecordingSubParser {
        applied: Option<Rect>,
        reset: bool,
    }
    impl SubParser for RecordingSubParser {
        fn parse(&mut self, data: &[u8], _step_limit: u32) -> usize {
            data.len()
        }
        fn apply_initial_form_state(&mut self, state: &FormInitialState) {
            self.applied = state.clip;
            self.reset = state.reset_transparency_group;
        }
    }

    #[test]
    fn form_setup_installs_bbox_clip_once_sub_parser_exists() {
        let setup = FormSetup {
            matrix: Matrix::IDENTITY,
            parent_ctm: Matrix {
                e: 5.0,
                ..Matrix::IDENTITY
            },
            bbox: Some(Rect {
                left: 0.0,
                bottom: 0.0,
                right: 1.0,
                top: 1.0,
            }),
            is_transparency_group: true,
        };
        let mut driver: ContentDriver<RecordingSubParser> =
            ContentDriver::new_for_form(b"q Q".to_vec(), 100, Some(setup));
        driver.continue_parse(
            || RecordingSubParser {
                applied: None,
                reset: false,
            },
            &mut NoopPause,
        );
        let sp = driver.sub_parser.as_ref().unwrap();
        assert_eq!(
            sp.applied,
            Some(Rect {
                left: 5.0,
                bottom: 0.0,
                right: 6.0,
                top: 1.0,
            })
        );
        assert!(sp.reset);
    }

    #[test]
    fn form_setup_none_leaves_pending_state_empty() {
        let mut driver: ContentDriver<FakeSubParser> =
            ContentDriver::new_for_form(b"q Q".to_vec(), 100, None);
        driver.continue_parse(|| FakeSubParser, &mut NoopPause);
        assert_eq!(driver.status(), Status::Done);
    }
}
