//! SVG path data for filled shapes.
//!
//! Parsing, bounds and re-serialisation are delegated to `kurbo`. On top of
//! that this module enforces the cutting-machine rule that every subpath is
//! closed, and exposes the path's on-curve points as editable vertices.

use crate::error::PathError;
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Vec2};
use serde::Serialize;
use smallvec::SmallVec;

/// Validated, non-empty SVG path data whose subpaths are all closed.
///
/// The source string is kept as given; it is only re-serialised when the
/// geometry is edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PathData(String);

/// An on-curve point of a path, addressed by its element index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Index into the path's element list.
    pub element: usize,
    pub point: Point,
}

/// Distance under which two points are treated as the same vertex.
const COINCIDENT_EPSILON: f64 = 1e-6;

impl PathData {
    pub fn parse(d: &str) -> Result<Self, PathError> {
        if d.trim().is_empty() {
            return Err(PathError::Empty);
        }
        let path = BezPath::from_svg(d).map_err(|e| PathError::Syntax(e.to_string()))?;
        check_finite(&path)?;
        check_closed(&path)?;
        Ok(Self(d.to_string()))
    }

    /// Serialise kurbo geometry, checking the same invariants as `parse`.
    pub fn from_bez_path(path: &BezPath) -> Result<Self, PathError> {
        check_finite(path)?;
        check_closed(path)?;
        Ok(Self(path.to_svg()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_bez_path(&self) -> BezPath {
        // Validated at construction; an empty path is unreachable.
        BezPath::from_svg(&self.0).unwrap_or_default()
    }

    pub fn bounds(&self) -> Rect {
        self.to_bez_path().bounding_box()
    }

    pub fn transformed(&self, affine: Affine) -> Result<Self, PathError> {
        let mut path = self.to_bez_path();
        path.apply_affine(affine);
        Self::from_bez_path(&path)
    }

    /// On-curve points in element order. A closing point that coincides
    /// with its subpath's start is reported once, as the `MoveTo`.
    pub fn vertices(&self) -> SmallVec<[Vertex; 16]> {
        let path = self.to_bez_path();
        let elements = path.elements();
        let mut out = SmallVec::new();
        let mut subpath_start: Option<Point> = None;

        for (i, el) in elements.iter().enumerate() {
            let point = match el {
                PathEl::MoveTo(p) => {
                    subpath_start = Some(*p);
                    *p
                }
                PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => {
                    let closes_here = matches!(elements.get(i + 1), Some(PathEl::ClosePath));
                    if closes_here
                        && subpath_start.is_some_and(|s| s.distance(*p) < COINCIDENT_EPSILON)
                    {
                        continue;
                    }
                    *p
                }
                PathEl::ClosePath => continue,
            };
            out.push(Vertex { element: i, point });
        }
        out
    }

    /// Return the path with the vertex at element `element` moved to `to`.
    ///
    /// Adjacent cubic handles travel with the vertex so curves keep their
    /// shape near the point. Moving a subpath start also moves a coincident
    /// closing point.
    pub fn with_vertex_moved(&self, element: usize, to: Point) -> Result<Self, PathError> {
        let mut elements: Vec<PathEl> = self.to_bez_path().elements().to_vec();
        let count = elements.len();
        let from = match elements.get(element) {
            Some(PathEl::MoveTo(p))
            | Some(PathEl::LineTo(p))
            | Some(PathEl::QuadTo(_, p))
            | Some(PathEl::CurveTo(_, _, p)) => *p,
            _ => return Err(PathError::VertexOutOfRange { index: element, count }),
        };
        let delta = to - from;

        move_endpoint(&mut elements[element], delta);
        if let Some(PathEl::CurveTo(p1, _, _)) = elements.get_mut(element + 1) {
            *p1 += delta;
        }

        if matches!(elements[element], PathEl::MoveTo(_)) {
            // Find the last drawing element of this subpath.
            let mut end = element + 1;
            while end < count && !matches!(elements[end], PathEl::MoveTo(_)) {
                end += 1;
            }
            if end >= element + 2 && matches!(elements[end - 1], PathEl::ClosePath) {
                let last = end - 2;
                if last > element && endpoint(&elements[last]).is_some_and(|p| p.distance(from) < COINCIDENT_EPSILON) {
                    move_endpoint(&mut elements[last], delta);
                }
            }
        }

        Self::from_bez_path(&BezPath::from_vec(elements))
    }
}

fn endpoint(el: &PathEl) -> Option<Point> {
    match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => {
            Some(*p)
        }
        PathEl::ClosePath => None,
    }
}

fn move_endpoint(el: &mut PathEl, delta: Vec2) {
    match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::QuadTo(_, p) => *p += delta,
        PathEl::CurveTo(_, p2, p3) => {
            *p2 += delta;
            *p3 += delta;
        }
        PathEl::ClosePath => {}
    }
}

fn check_finite(path: &BezPath) -> Result<(), PathError> {
    let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
    let ok = path.elements().iter().all(|el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => finite(p),
        PathEl::QuadTo(a, b) => finite(a) && finite(b),
        PathEl::CurveTo(a, b, c) => finite(a) && finite(b) && finite(c),
        PathEl::ClosePath => true,
    });
    if ok { Ok(()) } else { Err(PathError::NonFinite) }
}

/// Every subpath must end with `Z`. Drawing after a `Z` without a new `M`
/// starts another subpath, which must be closed too.
fn check_closed(path: &BezPath) -> Result<(), PathError> {
    let elements = path.elements();
    if elements.is_empty() {
        return Err(PathError::Empty);
    }
    let mut open = false;
    for el in elements {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    return Err(PathError::Open);
                }
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => open = true,
        }
    }
    if open { Err(PathError::Open) } else { Ok(()) }
}
