use crate::{
    canvas::{Canvas, Color, LineStyle, Point, PointStyle},
    pose::{BoundingBox, Frame, KeypointKind, Person},
    skeleton::{Endpoint, SKELETON_CONNECTIONS},
};
use tracing::{debug, trace};

/// Joints (and any bone touching them) scoring below this are not drawn.
pub(crate) const SCORE_THRESHOLD: u16 = 10;

/// Everything the renderer needs to know about how to draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Style {
    pub(crate) threshold: u16,
    pub(crate) marker_size: u16,
    pub(crate) marker: PointStyle,
    pub(crate) bone_width: u16,
    pub(crate) round_caps: bool,
    pub(crate) box_line: LineStyle,
    /// Fill used whenever a canvas is wiped during dispatch.
    pub(crate) background: Color,
    /// Initial fill of the secondary canvas, before any pose arrives.
    pub(crate) idle: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            threshold: SCORE_THRESHOLD,
            marker_size: 5,
            marker: PointStyle {
                color: Color::hex(0xFFEB3B),
                rounded: true,
            },
            bone_width: 3,
            round_caps: true,
            box_line: LineStyle {
                color: Color::rgb(113, 235, 52),
                width: 1,
                round_caps: false,
            },
            background: Color::BLACK,
            idle: Color::hex(0x9E9E9E),
        }
    }
}

impl Style {
    pub(crate) fn with_threshold(self, threshold: u16) -> Self {
        Self { threshold, ..self }
    }

    fn bone(&self, color: Color) -> LineStyle {
        LineStyle {
            color,
            width: self.bone_width,
            round_caps: self.round_caps,
        }
    }
}

/// Coordinates of an endpoint, or `None` if any joint it is built from is
/// missing or below threshold.
fn resolve(person: &Person, endpoint: Endpoint, threshold: u16) -> Option<Point> {
    let visible = |kind| person.joint(kind).filter(|joint| joint.score >= threshold);
    match endpoint {
        Endpoint::Joint(kind) => {
            let joint = visible(kind)?;
            Some(Point::new(i32::from(joint.x), i32::from(joint.y)))
        }
        Endpoint::Midpoint(a, b) => {
            let (a, b) = (visible(a)?, visible(b)?);
            Some(Point::new(
                (i32::from(a.x) + i32::from(b.x)) / 2,
                (i32::from(a.y) + i32::from(b.y)) / 2,
            ))
        }
    }
}

/// Draw one person's skeleton: markers for every confident joint, then every
/// bone of the topology table whose endpoints are all confident.
///
/// People without exactly 17 joints are skipped.
pub(crate) fn render_person<C>(canvas: &mut C, person: &Person, style: &Style)
where
    C: Canvas + ?Sized,
{
    if !person.is_complete() {
        debug!(
            message = "pose needs 17 keypoints, skipping",
            points_count = person.points_count(),
            bbox = ?person.bbox
        );
        return;
    }

    let offset = i32::from(style.marker_size / 2);
    for (idx, joint) in person.points.iter().enumerate() {
        if joint.score < style.threshold {
            trace!(
                message = "joint below threshold",
                kind = ?KeypointKind::from_idx(idx).ok(),
                score = joint.score
            );
            continue;
        }
        canvas.draw_point(
            Point::new(i32::from(joint.x) - offset, i32::from(joint.y) - offset),
            style.marker_size,
            &style.marker,
        );
    }

    for conn in SKELETON_CONNECTIONS.iter() {
        let (a, b) = conn.endpoints();
        if let (Some(from), Some(to)) = (
            resolve(person, a, style.threshold),
            resolve(person, b, style.threshold),
        ) {
            canvas.draw_line([from, to], &style.bone(conn.color));
        }
    }
}

/// Draw every person of a frame, in order.
pub(crate) fn render_frame<C>(canvas: &mut C, frame: &Frame, style: &Style)
where
    C: Canvas + ?Sized,
{
    for person in frame.people() {
        render_person(canvas, person, style);
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Outline a detection box. `x` and `y` are the box center.
pub(crate) fn draw_box<C>(canvas: &mut C, bbox: &BoundingBox, style: &Style)
where
    C: Canvas + ?Sized,
{
    let (x, y) = (i64::from(bbox.x), i64::from(bbox.y));
    let (width, height) = (i64::from(bbox.width), i64::from(bbox.height));
    let left = saturate(x - width / 2);
    let top = saturate(y - height / 2);
    let right = saturate(x - width / 2 + width);
    let bottom = saturate(y - height / 2 + height);

    let corners = [
        Point::new(left, top),
        Point::new(right, top),
        Point::new(right, bottom),
        Point::new(left, bottom),
    ];
    for (i, &corner) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        canvas.draw_line([corner, next], &style.box_line);
    }
}
