//! Finished page objects and the clip-path simplification pass.

use crate::driver::Rect;

/// The kind of drawing a [`PageObject`] represents. Sufficient to exclude
/// shadings from clip simplification without
/// reimplementing color spaces, fonts or the graphics-state stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Path,
    Image,
    Text,
    Shading,
    Form,
}

/// A clip path: one or more sub-paths. Rectangle simplification only ever
/// looks at a clip made of exactly one rectangular sub-path.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    subpaths: Vec<SubPath>,
}

/// A single clip sub-path: either an axis-aligned rectangle (the common
/// case PDFium fast-paths) or an arbitrary point list.
#[derive(Debug, Clone, PartialEq)]
pub enum SubPath {
    Rect(Rect),
    Points(Vec<(f32, f32)>),
}

impl ClipPath {
    pub fn from_subpaths(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    pub fn single_rect(&self) -> Option<Rect> {
        if self.subpaths.len() != 1 {
            return None;
        }
        match &self.subpaths[0] {
            SubPath::Rect(r) => Some(*r),
            // A four-point rectangular path: corners 0 and 2 are opposite
            // corners (the rectangle-contains test's convention).
            SubPath::Points(pts) if pts.len() == 4 => {
                let (x0, y0) = pts[0];
                let (x2, y2) = pts[2];
                Some(Rect {
                    left: x0.min(x2),
                    right: x0.max(x2),
                    bottom: y0.min(y2),
                    top: y0.max(y2),
                })
            }
            _ => None,
        }
    }
}

/// A finished drawing command, ready for clip-path simplification and
/// eventual hand-off to the page's rendering pipeline.
#[derive(Debug, Clone)]
pub struct PageObject {
    kind: ObjectKind,
    bounds: Rect,
    clip: Option<ClipPath>,
}

impl PageObject {
    pub fn new(kind: ObjectKind, bounds: Rect) -> Self {
        Self {
            kind,
            bounds,
            clip: None,
        }
    }

    pub fn with_clip(mut self, clip: ClipPath) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn clip_path(&self) -> Option<&ClipPath> {
        self.clip.as_ref()
    }

    /// The clip's single rectangle, if its clip path is exactly one
    /// rectangular sub-path and this object isn't text (text glyphs are
    /// excluded from rectangle simplification since their "bounds" don't
    /// mean the same thing as a filled path's).
    pub fn clip_rect(&self) -> Option<Rect> {
        if self.kind == ObjectKind::Text {
            return None;
        }
        self.clip.as_ref().and_then(ClipPath::single_rect)
    }

    pub fn clear_clip_path(&mut self) {
        self.clip = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f32, bottom: f32, right: f32, top: f32) -> Rect {
        Rect {
            left,
            bottom,
            right,
            top,
        }
    }

    #[test]
    fn rect_clip_path_from_four_points() {
        let clip = ClipPath::from_subpaths(vec![SubPath::Points(vec![
            (0.0, 10.0),
            (10.0, 10.0),
            (10.0, 0.0),
            (0.0, 0.0),
        ])]);
        assert_eq!(clip.single_rect(), Some(rect(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn non_rectangular_clip_has_no_single_rect() {
        let clip = ClipPath::from_subpaths(vec![
            SubPath::Rect(rect(0.0, 0.0, 1.0, 1.0)),
            SubPath::Rect(rect(2.0, 2.0, 3.0, 3.0)),
        ]);
        assert_eq!(clip.single_rect(), None);
    }

    #[test]
    fn text_objects_never_report_a_clip_rect_for_simplification() {
        let clip = ClipPath::from_subpaths(vec![SubPath::Rect(rect(0.0, 0.0, 100.0, 100.0))]);
        let obj = PageObject::new(ObjectKind::Text, rect(1.0, 1.0, 2.0, 2.0)).with_clip(clip);
        assert_eq!(obj.clip_rect(), None);
    }

    #[test]
    fn clear_clip_path_is_idempotent() {
        let clip = ClipPath::from_subpaths(vec![SubPath::Rect(rect(0.0, 0.0, 10.0, 10.0))]);
        let mut obj = PageObject::new(ObjectKind::Path, rect(1.0, 1.0, 2.0, 2.0)).with_clip(clip);
        obj.clear_clip_path();
        obj.clear_clip_path();
        assert!(obj.clip_path().is_none());
    }
}
