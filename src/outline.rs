//! Glyph outline construction.
//!
//! Flattens a (possibly composite) glyph into a stream of move and line
//! commands in 16.16 fixed point pixel space, with positive Y pointing up.
//! Quadratic Bézier segments are reconstructed from the on-curve and
//! off-curve points and flattened by recursive midpoint subdivision until
//! the control point sits within half a pixel of the chord.

use std::convert::TryFrom;

use crate::error::ParseError;
use crate::fixed::Fixed;
use crate::tables::glyf::{
    CompositeGlyph, CompositeGlyphFlag, CompositeGlyphScale, Glyph, GlyphData, SimpleGlyph,
    SimpleGlyphFlag,
};
use crate::tables::HeadTable;

/// Maximum nesting depth of composite glyph components.
pub const MAX_COMPONENT_DEPTH: u8 = 16;

/// Subdivision stops once the control point is this close to the chord.
const FLATNESS: Fixed = Fixed::HALF;

/// A point in 16.16 fixed point pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutlinePoint {
    pub x: Fixed,
    pub y: Fixed,
}

/// One command of a flattened outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutlineCommand {
    MoveTo(OutlinePoint),
    LineTo(OutlinePoint),
}

/// A glyph outline in pixel space, with its accumulated bounds.
#[derive(Clone, Debug, Default)]
pub struct GlyphOutline {
    pub commands: Vec<OutlineCommand>,
    pub x_min: Fixed,
    pub y_min: Fixed,
    pub x_max: Fixed,
    pub y_max: Fixed,
}

/// Resolves the sub-glyphs referenced by composite glyph components.
///
/// Implementations may parse the glyph on every call or serve it from a
/// cache; the builder takes each resolved glyph by value.
pub trait ResolveGlyph {
    fn resolve_glyph(&mut self, glyph_index: u16) -> Result<Glyph, ParseError>;
}

impl<F> ResolveGlyph for F
where
    F: FnMut(u16) -> Result<Glyph, ParseError>,
{
    fn resolve_glyph(&mut self, glyph_index: u16) -> Result<Glyph, ParseError> {
        self(glyph_index)
    }
}

impl OutlinePoint {
    fn midpoint(self, other: OutlinePoint) -> OutlinePoint {
        OutlinePoint {
            x: self.x.midpoint(other.x),
            y: self.y.midpoint(other.y),
        }
    }
}

impl OutlineCommand {
    pub fn point(&self) -> OutlinePoint {
        match self {
            OutlineCommand::MoveTo(point) | OutlineCommand::LineTo(point) => *point,
        }
    }
}

impl GlyphOutline {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// An affine map from funit space into pixel space.
#[derive(Clone, Copy, Debug)]
struct Transform {
    xx: Fixed,
    xy: Fixed,
    yx: Fixed,
    yy: Fixed,
    dx: Fixed,
    dy: Fixed,
}

impl Transform {
    fn uniform(factor: Fixed) -> Transform {
        Transform {
            xx: factor,
            xy: Fixed::ZERO,
            yx: Fixed::ZERO,
            yy: factor,
            dx: Fixed::ZERO,
            dy: Fixed::ZERO,
        }
    }

    fn apply(&self, x: i32, y: i32) -> OutlinePoint {
        OutlinePoint {
            x: self.xx.mul_int(x) + self.xy.mul_int(y) + self.dx,
            y: self.yx.mul_int(x) + self.yy.mul_int(y) + self.dy,
        }
    }

    /// Compose this transform with a component's 2x2 scale. The result has
    /// no translation; the caller supplies it.
    fn compose(&self, scale: Option<CompositeGlyphScale>) -> Transform {
        // TrueType stores the matrix as [xscale scale01 scale10 yscale]
        // with x' = xscale * x + scale10 * y and y' = scale01 * x +
        // yscale * y.
        let (xx, yx, xy, yy) = match scale {
            None => return Transform {
                dx: Fixed::ZERO,
                dy: Fixed::ZERO,
                ..*self
            },
            Some(CompositeGlyphScale::Scale(scale)) => {
                let scale = scale.to_fixed();
                (scale, Fixed::ZERO, Fixed::ZERO, scale)
            }
            Some(CompositeGlyphScale::XY { x_scale, y_scale }) => (
                x_scale.to_fixed(),
                Fixed::ZERO,
                Fixed::ZERO,
                y_scale.to_fixed(),
            ),
            Some(CompositeGlyphScale::Matrix([[xscale, scale01], [scale10, yscale]])) => (
                xscale.to_fixed(),
                scale01.to_fixed(),
                scale10.to_fixed(),
                yscale.to_fixed(),
            ),
        };
        Transform {
            xx: self.xx * xx + self.xy * yx,
            xy: self.xx * xy + self.xy * yy,
            yx: self.yx * xx + self.yy * yx,
            yy: self.yx * xy + self.yy * yy,
            dx: Fixed::ZERO,
            dy: Fixed::ZERO,
        }
    }
}

struct OutlineBuilder {
    commands: Vec<OutlineCommand>,
    /// Transformed source points of everything composed so far, in glyph
    /// point order. Composite point matching indexes into this.
    anchor_points: Vec<OutlinePoint>,
    current: OutlinePoint,
    bounds: Option<(Fixed, Fixed, Fixed, Fixed)>,
}

impl OutlineBuilder {
    fn new() -> OutlineBuilder {
        OutlineBuilder {
            commands: Vec::new(),
            anchor_points: Vec::new(),
            current: OutlinePoint::default(),
            bounds: None,
        }
    }

    fn grow_bounds(&mut self, point: OutlinePoint) {
        self.bounds = Some(match self.bounds {
            None => (point.x, point.y, point.x, point.y),
            Some((x_min, y_min, x_max, y_max)) => (
                x_min.min(point.x),
                y_min.min(point.y),
                x_max.max(point.x),
                y_max.max(point.y),
            ),
        });
    }

    fn move_to(&mut self, point: OutlinePoint) {
        self.commands.push(OutlineCommand::MoveTo(point));
        self.grow_bounds(point);
        self.current = point;
    }

    fn line_to(&mut self, point: OutlinePoint) {
        self.commands.push(OutlineCommand::LineTo(point));
        self.grow_bounds(point);
        self.current = point;
    }

    fn curve_to(&mut self, control: OutlinePoint, endpoint: OutlinePoint) {
        self.flatten_quad(self.current, control, endpoint, 0);
    }

    fn flatten_quad(
        &mut self,
        from: OutlinePoint,
        control: OutlinePoint,
        endpoint: OutlinePoint,
        depth: u8,
    ) {
        let chord_mid = from.midpoint(endpoint);
        let dx = (control.x - chord_mid.x).abs();
        let dy = (control.y - chord_mid.y).abs();
        if depth >= 16 || (dx <= FLATNESS && dy <= FLATNESS) {
            self.line_to(endpoint);
        } else {
            let first = from.midpoint(control);
            let second = control.midpoint(endpoint);
            let split = first.midpoint(second);
            self.flatten_quad(from, first, split, depth + 1);
            self.flatten_quad(split, second, endpoint, depth + 1);
        }
    }

    fn finish(self) -> GlyphOutline {
        let (x_min, y_min, x_max, y_max) = self.bounds.unwrap_or_default();
        GlyphOutline {
            commands: self.commands,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

/// Build the outline of `glyph` at `pixel_size`, resolving composite
/// components through `resolver`.
pub fn build_glyph_outline<R: ResolveGlyph>(
    glyph: &Glyph,
    head: &HeadTable,
    pixel_size: Fixed,
    resolver: &mut R,
) -> Result<GlyphOutline, ParseError> {
    let factor = pixel_size / Fixed::from_i32(i32::from(head.units_per_em));
    let mut builder = OutlineBuilder::new();
    build_glyph(&mut builder, glyph, Transform::uniform(factor), 0, resolver)?;
    Ok(builder.finish())
}

fn build_glyph<R: ResolveGlyph>(
    builder: &mut OutlineBuilder,
    glyph: &Glyph,
    transform: Transform,
    depth: u8,
    resolver: &mut R,
) -> Result<(), ParseError> {
    if depth > MAX_COMPONENT_DEPTH {
        return Err(ParseError::BadCompound);
    }
    match &glyph.data {
        GlyphData::Empty => Ok(()),
        GlyphData::Simple(simple) => {
            build_simple_glyph(builder, simple, transform);
            Ok(())
        }
        GlyphData::Composite { glyphs, .. } => {
            for component in glyphs {
                let sub_glyph = resolver.resolve_glyph(component.glyph_index)?;
                let child = component_transform(
                    builder,
                    component,
                    &sub_glyph,
                    transform,
                    depth,
                    resolver,
                )?;
                build_glyph(builder, &sub_glyph, child, depth + 1, resolver)?;
            }
            Ok(())
        }
    }
}

/// The transform for one composite component: the composed 2x2 part plus a
/// translation taken from XY offsets or from point matching.
fn component_transform<R: ResolveGlyph>(
    builder: &mut OutlineBuilder,
    component: &CompositeGlyph,
    sub_glyph: &Glyph,
    transform: Transform,
    depth: u8,
    resolver: &mut R,
) -> Result<Transform, ParseError> {
    let linear = transform.compose(component.scale);
    if component
        .flags
        .contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES)
    {
        // Funit offsets, carried through the parent transform.
        let dx = component.argument1.to_i32();
        let dy = component.argument2.to_i32();
        Ok(Transform {
            dx: transform.xx.mul_int(dx) + transform.xy.mul_int(dy) + transform.dx,
            dy: transform.yx.mul_int(dx) + transform.yy.mul_int(dy) + transform.dy,
            ..linear
        })
    } else {
        // Match point Q of the component against point P of the glyph
        // composed so far.
        let anchor = usize::try_from(component.argument1.to_i32())
            .map_err(|_| ParseError::BadCompound)?;
        let matched = usize::try_from(component.argument2.to_i32())
            .map_err(|_| ParseError::BadCompound)?;
        let p = builder
            .anchor_points
            .get(anchor)
            .copied()
            .ok_or(ParseError::BadCompound)?;
        let mut points = Vec::new();
        collect_points(sub_glyph, linear, depth + 1, resolver, &mut points)?;
        let q = points.get(matched).copied().ok_or(ParseError::BadCompound)?;
        Ok(Transform {
            dx: p.x - q.x,
            dy: p.y - q.y,
            ..linear
        })
    }
}

/// Transformed source points of `glyph`, in glyph point order. Used to find
/// the matched point of a component before its translation is known.
fn collect_points<R: ResolveGlyph>(
    glyph: &Glyph,
    transform: Transform,
    depth: u8,
    resolver: &mut R,
    points: &mut Vec<OutlinePoint>,
) -> Result<(), ParseError> {
    if depth > MAX_COMPONENT_DEPTH {
        return Err(ParseError::BadCompound);
    }
    match &glyph.data {
        GlyphData::Empty => Ok(()),
        GlyphData::Simple(simple) => {
            for point in &simple.coordinates {
                points.push(transform.apply(i32::from(point.0), i32::from(point.1)));
            }
            Ok(())
        }
        GlyphData::Composite { glyphs, .. } => {
            for component in glyphs {
                let sub_glyph = resolver.resolve_glyph(component.glyph_index)?;
                let linear = transform.compose(component.scale);
                let child = if component
                    .flags
                    .contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES)
                {
                    let dx = component.argument1.to_i32();
                    let dy = component.argument2.to_i32();
                    Transform {
                        dx: transform.xx.mul_int(dx) + transform.xy.mul_int(dy) + transform.dx,
                        dy: transform.yx.mul_int(dx) + transform.yy.mul_int(dy) + transform.dy,
                        ..linear
                    }
                } else {
                    let anchor = usize::try_from(component.argument1.to_i32())
                        .map_err(|_| ParseError::BadCompound)?;
                    let matched = usize::try_from(component.argument2.to_i32())
                        .map_err(|_| ParseError::BadCompound)?;
                    let p = points
                        .get(anchor)
                        .copied()
                        .ok_or(ParseError::BadCompound)?;
                    let mut sub_points = Vec::new();
                    collect_points(&sub_glyph, linear, depth + 1, resolver, &mut sub_points)?;
                    let q = sub_points
                        .get(matched)
                        .copied()
                        .ok_or(ParseError::BadCompound)?;
                    Transform {
                        dx: p.x - q.x,
                        dy: p.y - q.y,
                        ..linear
                    }
                };
                collect_points(&sub_glyph, child, depth + 1, resolver, points)?;
            }
            Ok(())
        }
    }
}

fn build_simple_glyph(builder: &mut OutlineBuilder, simple: &SimpleGlyph, transform: Transform) {
    for contour in 0..simple.end_pts_of_contours.len() {
        let range = match simple.contour_range(contour) {
            Some(range) => range,
            None => continue,
        };
        let points: Vec<(OutlinePoint, bool)> = range
            .map(|index| {
                let point = simple.coordinates[index];
                let on_curve = simple.flags[index].contains(SimpleGlyphFlag::ON_CURVE_POINT);
                (
                    transform.apply(i32::from(point.0), i32::from(point.1)),
                    on_curve,
                )
            })
            .collect();
        builder
            .anchor_points
            .extend(points.iter().map(|(point, _)| *point));
        build_contour(builder, &points);
    }
}

/// Walk one contour, reconstructing the quadratic segments.
///
/// Consecutive off-curve points imply an on-curve point at their midpoint.
/// The contour opens with a move to its first on-curve point and closes
/// with a line back to it.
fn build_contour(builder: &mut OutlineBuilder, points: &[(OutlinePoint, bool)]) {
    if points.is_empty() {
        return;
    }
    let count = points.len();
    let (start, skip) = match points.iter().position(|(_, on_curve)| *on_curve) {
        Some(first_on_curve) => (points[first_on_curve].0, first_on_curve + 1),
        // A contour of only off-curve points starts at an implied
        // midpoint.
        None => (points[count - 1].0.midpoint(points[0].0), 0),
    };
    builder.move_to(start);

    let mut control: Option<OutlinePoint> = None;
    for step in 0..count.saturating_sub(if skip == 0 { 0 } else { 1 }) {
        let (point, on_curve) = points[(skip + step) % count];
        match (control, on_curve) {
            (None, true) => builder.line_to(point),
            (Some(pending), true) => {
                builder.curve_to(pending, point);
                control = None;
            }
            (None, false) => control = Some(point),
            (Some(pending), false) => {
                let implied = pending.midpoint(point);
                builder.curve_to(pending, implied);
                control = Some(point);
            }
        }
    }
    match control {
        Some(pending) => builder.curve_to(pending, start),
        None => builder.line_to(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::glyf::{
        BoundingBox, CompositeGlyph, CompositeGlyphArgument, Point,
    };
    use crate::tables::IndexToLocFormat;

    fn head_with_upem(units_per_em: u16) -> HeadTable {
        HeadTable {
            version: 0x00010000,
            font_revision: 0,
            check_sum_adjustment: 0,
            flags: 0,
            units_per_em,
            created: 0,
            modified: 0,
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: 0,
            lowest_rec_ppem: 0,
            font_direction_hint: 0,
            index_to_loc_format: IndexToLocFormat::Short,
            glyph_data_format: 0,
        }
    }

    fn simple_glyph(points: &[(i16, i16, bool)], end_pts: &[u16]) -> Glyph {
        let flags = points
            .iter()
            .map(|&(_, _, on_curve)| {
                if on_curve {
                    SimpleGlyphFlag::ON_CURVE_POINT
                } else {
                    SimpleGlyphFlag::empty()
                }
            })
            .collect();
        let coordinates: Vec<Point> = points.iter().map(|&(x, y, _)| Point(x, y)).collect();
        let x_max = points.iter().map(|&(x, _, _)| x).max().unwrap_or(0);
        let y_max = points.iter().map(|&(_, y, _)| y).max().unwrap_or(0);
        let mut end_pts_of_contours = tinyvec::TinyVec::default();
        for &end_pt in end_pts {
            end_pts_of_contours.push(end_pt);
        }
        Glyph {
            number_of_contours: end_pts.len() as i16,
            bounding_box: BoundingBox {
                x_min: 0,
                y_min: 0,
                x_max,
                y_max,
            },
            data: GlyphData::Simple(SimpleGlyph {
                end_pts_of_contours,
                instructions: Vec::new(),
                flags,
                coordinates,
            }),
        }
    }

    fn no_composites(_: u16) -> Result<Glyph, ParseError> {
        Err(ParseError::BadGlyph)
    }

    #[test]
    fn test_triangle_outline() {
        // A 32 unit triangle at 32 units per em, rendered at 32 pixels, so
        // funits map to pixels one to one.
        let glyph = simple_glyph(&[(0, 0, true), (32, 0, true), (16, 32, true)], &[2]);
        let head = head_with_upem(32);
        let outline = build_glyph_outline(
            &glyph,
            &head,
            Fixed::from_i32(32),
            &mut no_composites,
        )
        .unwrap();

        assert_eq!(
            outline.commands,
            vec![
                OutlineCommand::MoveTo(OutlinePoint {
                    x: Fixed::ZERO,
                    y: Fixed::ZERO
                }),
                OutlineCommand::LineTo(OutlinePoint {
                    x: Fixed::from_i32(32),
                    y: Fixed::ZERO
                }),
                OutlineCommand::LineTo(OutlinePoint {
                    x: Fixed::from_i32(16),
                    y: Fixed::from_i32(32)
                }),
                OutlineCommand::LineTo(OutlinePoint {
                    x: Fixed::ZERO,
                    y: Fixed::ZERO
                }),
            ]
        );
        assert_eq!(outline.x_max, Fixed::from_i32(32));
        assert_eq!(outline.y_max, Fixed::from_i32(32));
    }

    #[test]
    fn test_scaling_halves_coordinates() {
        let glyph = simple_glyph(&[(0, 0, true), (100, 0, true), (100, 100, true)], &[2]);
        let head = head_with_upem(200);
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(100), &mut no_composites).unwrap();
        assert_eq!(outline.x_max, Fixed::from_i32(50));
        assert_eq!(outline.y_max, Fixed::from_i32(50));
    }

    fn contours(outline: &GlyphOutline) -> Vec<Vec<OutlineCommand>> {
        let mut result: Vec<Vec<OutlineCommand>> = Vec::new();
        for command in &outline.commands {
            match command {
                OutlineCommand::MoveTo(_) => result.push(vec![*command]),
                OutlineCommand::LineTo(_) => result.last_mut().unwrap().push(*command),
            }
        }
        result
    }

    #[test]
    fn test_curved_contours_open_with_move_and_close() {
        // A square whose corners are all off-curve control points.
        let glyph = simple_glyph(
            &[
                (0, 0, false),
                (64, 0, false),
                (64, 64, false),
                (0, 64, false),
            ],
            &[3],
        );
        let head = head_with_upem(64);
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(64), &mut no_composites).unwrap();

        for contour in contours(&outline) {
            assert!(matches!(contour[0], OutlineCommand::MoveTo(_)));
            assert!(contour.len() > 1);
            let first = contour[0].point();
            let last = contour.last().unwrap().point();
            assert_eq!(first, last);
        }
    }

    #[test]
    fn test_bounds_contain_every_command() {
        let glyph = simple_glyph(
            &[(0, 0, true), (80, 40, false), (0, 80, true), (-20, 40, false)],
            &[3],
        );
        let head = head_with_upem(80);
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(80), &mut no_composites).unwrap();

        assert!(!outline.is_empty());
        for command in &outline.commands {
            let point = command.point();
            assert!(point.x >= outline.x_min && point.x <= outline.x_max);
            assert!(point.y >= outline.y_min && point.y <= outline.y_max);
        }
    }

    #[test]
    fn test_flattening_respects_tolerance() {
        // A strongly curved quadratic; every flattened vertex must lie
        // within half a pixel of the true curve.
        let glyph = simple_glyph(&[(0, 0, true), (50, 100, false), (100, 0, true)], &[2]);
        let head = head_with_upem(100);
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(100), &mut no_composites).unwrap();

        // More than just the three source points once flattened.
        assert!(outline.commands.len() > 4);
        for command in &outline.commands {
            let point = command.point();
            // The curve y = 2t(1-t) * 100 over x = 100t stays at or below
            // 50, so flattened points do too, give or take the tolerance.
            assert!(point.y <= Fixed::from_i32(50) + Fixed::HALF);
        }
    }

    #[test]
    fn test_empty_glyph_builds_empty_outline() {
        let head = head_with_upem(1000);
        let outline = build_glyph_outline(
            &Glyph::empty(),
            &head,
            Fixed::from_i32(16),
            &mut no_composites,
        )
        .unwrap();
        assert!(outline.is_empty());
        assert_eq!(outline.x_max, Fixed::ZERO);
    }

    fn composite_glyph(components: Vec<CompositeGlyph>) -> Glyph {
        Glyph {
            number_of_contours: -1,
            bounding_box: BoundingBox::default(),
            data: GlyphData::Composite {
                glyphs: components,
                instructions: Vec::new(),
            },
        }
    }

    fn xy_component(glyph_index: u16, dx: i16, dy: i16) -> CompositeGlyph {
        CompositeGlyph {
            flags: CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS
                | CompositeGlyphFlag::ARGS_ARE_XY_VALUES,
            glyph_index,
            argument1: CompositeGlyphArgument::I16(dx),
            argument2: CompositeGlyphArgument::I16(dy),
            scale: None,
        }
    }

    #[test]
    fn test_composite_bounds_are_union_of_translated_components() {
        // Two copies of a 40 unit triangle, the second translated by
        // (100, 0) funits.
        let component = simple_glyph(&[(0, 0, true), (40, 0, true), (20, 40, true)], &[2]);
        let glyph = composite_glyph(vec![xy_component(7, 0, 0), xy_component(7, 100, 0)]);
        let head = head_with_upem(100);

        let mut resolver = |glyph_index: u16| {
            if glyph_index == 7 {
                Ok(component.clone())
            } else {
                Err(ParseError::BadGlyph)
            }
        };
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(100), &mut resolver).unwrap();

        assert_eq!(outline.x_min, Fixed::ZERO);
        assert_eq!(outline.x_max, Fixed::from_i32(140));
        assert_eq!(outline.y_max, Fixed::from_i32(40));
        // Two closed triangles: a move and three lines each.
        assert_eq!(outline.commands.len(), 8);
    }

    #[test]
    fn test_composite_uniform_scale() {
        use crate::fixed::F2Dot14;

        let component = simple_glyph(&[(0, 0, true), (40, 0, true), (20, 40, true)], &[2]);
        let glyph = composite_glyph(vec![CompositeGlyph {
            flags: CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS
                | CompositeGlyphFlag::ARGS_ARE_XY_VALUES
                | CompositeGlyphFlag::WE_HAVE_A_SCALE,
            glyph_index: 7,
            argument1: CompositeGlyphArgument::I16(0),
            argument2: CompositeGlyphArgument::I16(0),
            scale: Some(CompositeGlyphScale::Scale(F2Dot14(0x2000))),
        }]);
        let head = head_with_upem(100);

        let mut resolver = |_: u16| Ok(component.clone());
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(100), &mut resolver).unwrap();
        assert_eq!(outline.x_max, Fixed::from_i32(20));
        assert_eq!(outline.y_max, Fixed::from_i32(20));
    }

    #[test]
    fn test_composite_point_matching() {
        // The second component pins its first point (index 0) onto point 1
        // of the already composed outline, translating it by (40, 0).
        let component = simple_glyph(&[(0, 0, true), (40, 0, true), (20, 40, true)], &[2]);
        let glyph = composite_glyph(vec![
            xy_component(7, 0, 0),
            CompositeGlyph {
                flags: CompositeGlyphFlag::empty(),
                glyph_index: 7,
                argument1: CompositeGlyphArgument::U8(1),
                argument2: CompositeGlyphArgument::U8(0),
                scale: None,
            },
        ]);
        let head = head_with_upem(100);

        let mut resolver = |_: u16| Ok(component.clone());
        let outline =
            build_glyph_outline(&glyph, &head, Fixed::from_i32(100), &mut resolver).unwrap();
        assert_eq!(outline.x_max, Fixed::from_i32(80));
    }

    #[test]
    fn test_composite_recursion_is_bounded() {
        // Glyph 3 refers to itself; the recursion ceiling reports it.
        let glyph = composite_glyph(vec![xy_component(3, 0, 0)]);
        let head = head_with_upem(100);

        let cyclic = composite_glyph(vec![xy_component(3, 0, 0)]);
        let mut resolver = move |_: u16| Ok(cyclic.clone());
        assert!(matches!(
            build_glyph_outline(&glyph, &head, Fixed::from_i32(16), &mut resolver),
            Err(ParseError::BadCompound)
        ));
    }

    #[test]
    fn test_composite_missing_subglyph() {
        let glyph = composite_glyph(vec![xy_component(9, 0, 0)]);
        let head = head_with_upem(100);
        assert!(matches!(
            build_glyph_outline(&glyph, &head, Fixed::from_i32(16), &mut no_composites),
            Err(ParseError::BadGlyph)
        ));
    }
}
