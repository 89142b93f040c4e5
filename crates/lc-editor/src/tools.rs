//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into a [`ToolOutput`]: nothing, a
//! transient preview the host should redraw, or a patch to commit through
//! history. Tools never touch the document directly.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Point Edit | Magic Edit |
//! |----------|------------|------------|
//! | **Shift** | Axis-constrain vertex drag | Square mask |

use crate::error::EditorError;
use crate::input::InputEvent;
use lc_core::{
    Affine, Document, DocumentError, Layer, LayerId, LayerKind, PathAttributes, PathData, Patch,
    Point, Rect, TextAttributes, Vertex,
};
use smallvec::SmallVec;

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    PointEdit,
    MagicEdit,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::PointEdit => "pointEdit",
            ToolKind::MagicEdit => "magicEdit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(ToolKind::Select),
            "pointEdit" => Some(ToolKind::PointEdit),
            "magicEdit" => Some(ToolKind::MagicEdit),
            _ => None,
        }
    }
}

/// What a tool asks the session to do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    None,
    /// Transient state changed; redraw, but the document is untouched.
    Preview,
    /// Commit this patch as one history entry.
    Commit { patch: Patch, description: &'static str },
}

/// Read-only view of the session a tool needs.
pub struct ToolContext<'a> {
    pub document: &'a Document,
    pub selected: Option<LayerId>,
    pub handle_radius: f64,
}

/// Trait for tools that handle pointer input.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Result<ToolOutput, DocumentError>;

    /// Drop any in-progress gesture.
    fn reset(&mut self);
}

/// Normalize a drag rectangle from start + current positions.
fn normalize_rect(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

// ─── Select Tool Affordances ─────────────────────────────────────────────

/// Patch moving `layer` by `(dx, dy)`.
pub fn translate_layer(layer: &Layer, dx: f64, dy: f64) -> Result<Patch, DocumentError> {
    if !(dx.is_finite() && dy.is_finite()) {
        return Err(DocumentError::NonFinite(layer.id));
    }
    let kind = match &layer.kind {
        LayerKind::Path(p) => LayerKind::Path(PathAttributes {
            d: p.d.transformed(Affine::translate((dx, dy)))?,
            fill: p.fill.clone(),
        }),
        LayerKind::Text(t) => LayerKind::Text(TextAttributes {
            x: t.x + dx,
            y: t.y + dy,
            ..t.clone()
        }),
    };
    Ok(Patch::SetAttributes { id: layer.id, kind })
}

/// Patch fitting `layer` into `bounds`. Paths are scaled per axis; text is
/// scaled uniformly by height and re-centred.
pub fn fit_layer_to(layer: &Layer, bounds: Rect) -> Result<Patch, EditorError> {
    if !bounds.is_finite() {
        return Err(DocumentError::NonFinite(layer.id).into());
    }
    let target = bounds.abs();
    if target.width() <= 0.0 || target.height() <= 0.0 {
        return Err(EditorError::Input("a layer cannot be resized to zero size".into()));
    }
    let current = layer.bounds();
    let kind = match &layer.kind {
        LayerKind::Path(p) => {
            let sx = scale_factor(target.width(), current.width());
            let sy = scale_factor(target.height(), current.height());
            let affine = Affine::translate(target.origin().to_vec2())
                * Affine::scale_non_uniform(sx, sy)
                * Affine::translate(-current.origin().to_vec2());
            LayerKind::Path(PathAttributes {
                d: p.d.transformed(affine).map_err(DocumentError::from)?,
                fill: p.fill.clone(),
            })
        }
        LayerKind::Text(t) => {
            let font_size = target.height();
            LayerKind::Text(TextAttributes {
                x: target.center().x,
                y: target.y0 + font_size * 0.8,
                font_size,
                ..t.clone()
            })
        }
    };
    Ok(Patch::SetAttributes { id: layer.id, kind })
}

/// Degenerate axes (a horizontal line, say) keep their extent.
fn scale_factor(target: f64, current: f64) -> f64 {
    if current.abs() <= f64::EPSILON { 1.0 } else { target / current }
}

// ─── Point Edit Tool ─────────────────────────────────────────────────────

/// An in-progress vertex drag.
#[derive(Debug, Clone)]
struct VertexDrag {
    layer: LayerId,
    element: usize,
    start: Point,
    original: PathAttributes,
    preview: PathData,
}

/// Drags individual vertices of the selected path layer.
#[derive(Debug, Default)]
pub struct PointEditTool {
    drag: Option<VertexDrag>,
}

impl PointEditTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draggable vertices of the selected layer. Text layers have none.
    pub fn vertices(ctx: &ToolContext<'_>) -> SmallVec<[Vertex; 16]> {
        match ctx.selected.and_then(|id| ctx.document.get(id)).map(|l| &l.kind) {
            Some(LayerKind::Path(p)) => p.d.vertices(),
            _ => SmallVec::new(),
        }
    }

    /// Path data to draw while dragging, in place of the committed one.
    pub fn preview(&self) -> Option<(LayerId, &PathData)> {
        self.drag.as_ref().map(|d| (d.layer, &d.preview))
    }

    fn target(drag: &VertexDrag, event: &InputEvent) -> Point {
        let p = event.position();
        if !event.modifiers().shift {
            return p;
        }
        let delta = p - drag.start;
        if delta.x.abs() >= delta.y.abs() {
            Point::new(p.x, drag.start.y)
        } else {
            Point::new(drag.start.x, p.y)
        }
    }
}

impl Tool for PointEditTool {
    fn kind(&self) -> ToolKind {
        ToolKind::PointEdit
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Result<ToolOutput, DocumentError> {
        match event {
            InputEvent::PointerDown { .. } => {
                self.drag = None;
                let Some(layer) = ctx.selected.and_then(|id| ctx.document.get(id)) else {
                    return Ok(ToolOutput::None);
                };
                let LayerKind::Path(attrs) = &layer.kind else {
                    return Ok(ToolOutput::None);
                };
                let p = event.position();
                let hit = attrs
                    .d
                    .vertices()
                    .into_iter()
                    .map(|v| (v, v.point.distance(p)))
                    .filter(|(_, dist)| *dist <= ctx.handle_radius)
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                let Some((vertex, _)) = hit else {
                    return Ok(ToolOutput::None);
                };
                self.drag = Some(VertexDrag {
                    layer: layer.id,
                    element: vertex.element,
                    start: vertex.point,
                    original: attrs.clone(),
                    preview: attrs.d.clone(),
                });
                Ok(ToolOutput::Preview)
            }
            InputEvent::PointerMove { .. } => {
                let Some(drag) = self.drag.as_mut() else {
                    return Ok(ToolOutput::None);
                };
                let to = Self::target(drag, event);
                drag.preview = drag.original.d.with_vertex_moved(drag.element, to)?;
                Ok(ToolOutput::Preview)
            }
            InputEvent::PointerUp { .. } => {
                let Some(drag) = self.drag.take() else {
                    return Ok(ToolOutput::None);
                };
                let to = Self::target(&drag, event);
                let d = drag.original.d.with_vertex_moved(drag.element, to)?;
                if to == drag.start {
                    return Ok(ToolOutput::Preview);
                }
                Ok(ToolOutput::Commit {
                    patch: Patch::SetAttributes {
                        id: drag.layer,
                        kind: LayerKind::Path(PathAttributes {
                            d,
                            fill: drag.original.fill,
                        }),
                    },
                    description: "move point",
                })
            }
        }
    }

    fn reset(&mut self) {
        self.drag = None;
    }
}

// ─── Magic Edit Tool ─────────────────────────────────────────────────────

/// Draws the rectangular mask for a region-scoped regeneration.
#[derive(Debug, Default)]
pub struct MagicEditTool {
    /// Drag origin while the mask is being drawn.
    start: Option<Point>,
    mask: Option<Rect>,
}

impl MagicEditTool {
    /// Masks smaller than this on either axis are discarded.
    pub const MIN_MASK_SIZE: f64 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask(&self) -> Option<Rect> {
        self.mask
    }

    fn rect_to(start: Point, event: &InputEvent) -> Rect {
        let mut end = event.position();
        if event.modifiers().shift {
            let side = (end.x - start.x).abs().max((end.y - start.y).abs());
            end = Point::new(
                start.x + side.copysign(end.x - start.x),
                start.y + side.copysign(end.y - start.y),
            );
        }
        normalize_rect(start, end)
    }
}

impl Tool for MagicEditTool {
    fn kind(&self) -> ToolKind {
        ToolKind::MagicEdit
    }

    fn handle(&mut self, event: &InputEvent, _ctx: &ToolContext<'_>) -> Result<ToolOutput, DocumentError> {
        match event {
            InputEvent::PointerDown { .. } => {
                let p = event.position();
                self.start = Some(p);
                self.mask = Some(normalize_rect(p, p));
            }
            InputEvent::PointerMove { .. } => {
                let Some(start) = self.start else {
                    return Ok(ToolOutput::None);
                };
                self.mask = Some(Self::rect_to(start, event));
            }
            InputEvent::PointerUp { .. } => {
                let Some(start) = self.start.take() else {
                    return Ok(ToolOutput::None);
                };
                let rect = Self::rect_to(start, event);
                self.mask = (rect.width() >= Self::MIN_MASK_SIZE
                    && rect.height() >= Self::MIN_MASK_SIZE)
                    .then_some(rect);
            }
        }
        Ok(ToolOutput::Preview)
    }

    fn reset(&mut self) {
        self.start = None;
        self.mask = None;
    }
}
