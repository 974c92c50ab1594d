//! Cairo rendering for every drawable variant.
//!
//! Objects draw themselves in a local frame centred on the origin; unless
//! `no_transform` is set, [`render_object`] first moves the context to the
//! object's center and applies its rotation and scale.

use super::color::{BLACK, Color};
use super::eraser::EraserPath;
use super::geometry::Point;
use super::image::ImageShape;
use super::line::ArrowShape;
use super::object::DrawObject;
use super::path::PathCommand;
use super::polygon::PolygonGeometry;
use super::props::ObjectProps;
use super::text::TextShape;

/// Radius of the dot drawn for a polygon that has only one point so far.
const SINGLE_POINT_RADIUS: f64 = 2.0;

/// Renders one object onto `ctx`.
///
/// Hidden objects are skipped, so eraser paths are a no-op here unless the
/// caller has made them visible.
pub fn render_object(ctx: &cairo::Context, object: &DrawObject, no_transform: bool) {
    let props = object.props();
    if !props.visible {
        return;
    }

    ctx.save().ok();
    if !no_transform {
        let (w, h) = object.dimensions();
        apply_transform(ctx, props, w, h);
    }

    match object {
        DrawObject::Polygon(s) => render_closed(ctx, s.geometry(), props),
        DrawObject::Rect(s) => render_closed(ctx, s.geometry(), props),
        DrawObject::Circle(s) => render_closed(ctx, s.geometry(), props),
        DrawObject::Triangle(s) => render_closed(ctx, s.geometry(), props),
        DrawObject::Line(s) => render_open(ctx, s.geometry(), props),
        DrawObject::Arrow(s) => render_arrow(ctx, s),
        DrawObject::Path(s) => render_path(ctx, s.geometry().local_commands(), props),
        DrawObject::Eraser(s) => render_eraser_stroke(ctx, s),
        DrawObject::Text(s) => render_text(ctx, s),
        DrawObject::Image(s) => render_image(ctx, s),
    }

    ctx.restore().ok();
}

/// Moves the origin to the object center, then rotates and scales.
fn apply_transform(ctx: &cairo::Context, props: &ObjectProps, width: f64, height: f64) {
    let center = props.center(width, height);
    ctx.translate(center.x, center.y);
    ctx.rotate(props.angle.to_radians());
    ctx.scale(props.scale_x, props.scale_y);
}

fn set_paint(ctx: &cairo::Context, color: Color, opacity: f64) {
    color.with_opacity(opacity).apply(ctx);
}

fn stroke_current(ctx: &cairo::Context, props: &ObjectProps, fallback: Option<Color>) {
    let Some(stroke) = props.stroke.or(fallback) else {
        ctx.new_path();
        return;
    };
    if props.stroke_width <= 0.0 {
        ctx.new_path();
        return;
    }
    set_paint(ctx, stroke, props.opacity);
    ctx.set_line_width(props.stroke_width);
    let _ = ctx.stroke();
}

fn trace_segments(ctx: &cairo::Context, segments: &[Vec<Point>], close: bool) {
    for segment in segments {
        let Some((first, rest)) = segment.split_first() else {
            continue;
        };
        ctx.move_to(first.x, first.y);
        for p in rest {
            ctx.line_to(p.x, p.y);
        }
        if close {
            ctx.close_path();
        }
    }
}

/// Filled and stroked closed contours; a lone point becomes a small dot.
fn render_closed(ctx: &cairo::Context, geometry: &PolygonGeometry, props: &ObjectProps) {
    if geometry.is_single_point() {
        let p = geometry.segments()[0][0];
        let color = props.stroke.or(props.fill).unwrap_or(BLACK);
        set_paint(ctx, color, props.opacity);
        ctx.arc(p.x, p.y, SINGLE_POINT_RADIUS, 0.0, std::f64::consts::TAU);
        let _ = ctx.fill();
        return;
    }

    ctx.set_line_join(cairo::LineJoin::Miter);
    trace_segments(ctx, geometry.segments(), true);
    if let Some(fill) = props.fill {
        ctx.set_fill_rule(cairo::FillRule::EvenOdd);
        set_paint(ctx, fill, props.opacity);
        let _ = ctx.fill_preserve();
    }
    stroke_current(ctx, props, None);
}

/// Open polylines; a line with no stroke colour falls back to its fill.
fn render_open(ctx: &cairo::Context, geometry: &PolygonGeometry, props: &ObjectProps) {
    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_join(cairo::LineJoin::Round);
    trace_segments(ctx, geometry.segments(), false);
    stroke_current(ctx, props, props.fill);
}

fn render_arrow(ctx: &cairo::Context, arrow: &ArrowShape) {
    let props = arrow.props();
    render_open(ctx, arrow.line().geometry(), props);

    for (tip, [left, right]) in arrow.local_heads() {
        ctx.move_to(left.x, left.y);
        ctx.line_to(tip.x, tip.y);
        ctx.line_to(right.x, right.y);
    }
    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_join(cairo::LineJoin::Round);
    stroke_current(ctx, props, props.fill);
}

fn trace_commands(ctx: &cairo::Context, commands: impl Iterator<Item = PathCommand>) {
    for command in commands {
        command.trace(ctx);
    }
}

fn render_path(
    ctx: &cairo::Context,
    commands: impl Iterator<Item = PathCommand>,
    props: &ObjectProps,
) {
    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_join(cairo::LineJoin::Round);
    trace_commands(ctx, commands);
    if let Some(fill) = props.fill {
        set_paint(ctx, fill, props.opacity);
        let _ = ctx.fill_preserve();
    }
    stroke_current(ctx, props, None);
}

/// Strokes an eraser path with full coverage.
///
/// Colour is irrelevant under subtractive compositing; only alpha counts.
/// The polygon offset is not applied here, see [`EraserPath::set_polygon_offset`].
fn render_eraser_stroke(ctx: &cairo::Context, eraser: &EraserPath) {
    let props = &eraser.props;
    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_join(cairo::LineJoin::Round);
    ctx.set_line_width(props.stroke_width.max(0.0));
    trace_commands(ctx, eraser.geometry().local_commands());
    BLACK.with_opacity(props.opacity).apply(ctx);
    let _ = ctx.stroke();
}

fn render_text(ctx: &cairo::Context, text: &TextShape) {
    let props = &text.props;
    let (w, h) = text.dimensions();

    ctx.set_antialias(cairo::Antialias::Best);
    let layout = pangocairo::functions::create_layout(ctx);
    layout.set_font_description(Some(&text.font().to_pango(text.font_size())));
    layout.set_text(text.text());

    ctx.move_to(-w / 2.0, -h / 2.0);
    pangocairo::functions::layout_path(ctx, &layout);
    let fill = props.fill.unwrap_or(BLACK);
    set_paint(ctx, fill, props.opacity);
    let _ = ctx.fill_preserve();
    stroke_current(ctx, props, None);
}

fn render_image(ctx: &cairo::Context, image: &ImageShape) {
    let (w, h) = image.dimensions();
    let (nw, nh) = image.natural_size();
    if nw == 0 || nh == 0 || w <= 0.0 || h <= 0.0 {
        return;
    }
    ctx.translate(-w / 2.0, -h / 2.0);
    ctx.scale(w / nw as f64, h / nh as f64);
    if ctx.set_source_surface(image.surface(), 0.0, 0.0).is_ok() {
        let _ = ctx.paint_with_alpha(image.props.opacity.clamp(0.0, 1.0));
    }
}

/// Draws the floating edit icon of a text object, in canvas coordinates.
///
/// The icon is a rounded square with a pencil stroke, rotated with the text.
pub fn render_edit_icon(ctx: &cairo::Context, text: &TextShape) {
    let props = &text.props;
    let center = text.edit_icon_center();
    let scale = props.scale_x.abs().max(props.scale_y.abs());
    let half = text.edit_icon().size * scale / 2.0;
    if half <= 0.0 {
        return;
    }

    ctx.save().ok();
    ctx.translate(center.x, center.y);
    ctx.rotate(props.angle.to_radians());

    let r = half * 0.3;
    ctx.new_sub_path();
    ctx.arc(half - r, -half + r, r, -std::f64::consts::FRAC_PI_2, 0.0);
    ctx.arc(half - r, half - r, r, 0.0, std::f64::consts::FRAC_PI_2);
    ctx.arc(-half + r, half - r, r, std::f64::consts::FRAC_PI_2, std::f64::consts::PI);
    ctx.arc(-half + r, -half + r, r, std::f64::consts::PI, 1.5 * std::f64::consts::PI);
    ctx.close_path();
    ctx.set_source_rgba(1.0, 1.0, 1.0, 0.9);
    let _ = ctx.fill_preserve();
    ctx.set_source_rgba(0.2, 0.2, 0.2, 1.0);
    ctx.set_line_width(1.0);
    let _ = ctx.stroke();

    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_width((half * 0.25).max(1.0));
    ctx.move_to(-half * 0.5, half * 0.5);
    ctx.line_to(half * 0.5, -half * 0.5);
    let _ = ctx.stroke();

    ctx.restore().ok();
}

/// Fills the whole clip area with `color`, replacing what is there.
pub fn fill_background(ctx: &cairo::Context, color: Color) {
    ctx.save().ok();
    ctx.set_operator(cairo::Operator::Source);
    color.apply(ctx);
    let _ = ctx.paint();
    ctx.restore().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::color::RED;
    use crate::draw::polygon::{PolygonShape, RectShape};

    fn surface() -> (cairo::ImageSurface, cairo::Context) {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 40, 40).unwrap();
        let ctx = cairo::Context::new(&surface).unwrap();
        (surface, ctx)
    }

    fn alpha_at(surface: &mut cairo::ImageSurface, x: usize, y: usize) -> u8 {
        surface.flush();
        let stride = surface.stride() as usize;
        let data = surface.data().unwrap();
        data[y * stride + x * 4 + 3]
    }

    #[test]
    fn rect_fills_its_box() {
        let (mut surface, ctx) = surface();
        let rect: DrawObject = RectShape::new(10.0, 10.0, ObjectProps::at(5.0, 5.0).with_fill(RED))
            .unwrap()
            .into();
        render_object(&ctx, &rect, false);
        drop(ctx);
        assert_eq!(alpha_at(&mut surface, 10, 10), 255);
        assert_eq!(alpha_at(&mut surface, 20, 20), 0);
    }

    #[test]
    fn hidden_objects_draw_nothing() {
        let (mut surface, ctx) = surface();
        let mut props = ObjectProps::at(0.0, 0.0).with_fill(RED);
        props.visible = false;
        let rect: DrawObject = RectShape::new(40.0, 40.0, props).unwrap().into();
        render_object(&ctx, &rect, false);
        drop(ctx);
        assert_eq!(alpha_at(&mut surface, 20, 20), 0);
    }

    #[test]
    fn single_point_polygon_draws_a_dot() {
        let (mut surface, ctx) = surface();
        let dot: DrawObject =
            PolygonShape::new(vec![vec![Point::new(20.0, 20.0)]], ObjectProps::default())
                .unwrap()
                .into();
        render_object(&ctx, &dot, false);
        drop(ctx);
        assert!(alpha_at(&mut surface, 20, 20) > 0);
    }
}
