use crate::{
    error::Error,
    pose::{BoundingBox, Frame, Joint, Person},
};
use serde_json::Value;
use tracing::{debug, error, trace};

/// Where the parser gets its buffers from.
///
/// Every buffer handed out is owned by the `Vec` that carries it, so anything
/// allocated for a batch that is later abandoned is released when the partial
/// batch goes out of scope.
pub(crate) trait Allocator {
    /// A batch of `len` zeroed people.
    fn people(&self, len: usize) -> Result<Vec<Person>, Error>;

    /// A joint buffer of `len` zeroed joints.
    fn joints(&self, len: usize) -> Result<Vec<Joint>, Error>;
}

/// Allocates from the global heap, reporting exhaustion instead of aborting.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct SystemAllocator;

fn zeroed<T>(what: &'static str, len: usize) -> Result<Vec<T>, Error>
where
    T: Default,
{
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| Error::out_of_memory(what, len, e))?;
    buf.resize_with(len, T::default);
    Ok(buf)
}

impl Allocator for SystemAllocator {
    fn people(&self, len: usize) -> Result<Vec<Person>, Error> {
        zeroed("people", len)
    }

    fn joints(&self, len: usize) -> Result<Vec<Joint>, Error> {
        zeroed("joints", len)
    }
}

/// cJSON-style integer view of a number: saturated to `i32`, non-numbers are
/// `None`.
pub(crate) fn value_int(value: &Value) -> Option<i32> {
    value.as_f64().map(|f| f as i32)
}

/// Parse a `box` field. Absent is fine; anything present but not shaped like
/// six numbers is reported so the caller can leave the box zeroed.
fn parse_box(value: Option<&Value>) -> Result<Option<BoundingBox>, Error> {
    let items = match value {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(Error::MalformedField {
                field: "box",
                reason: "not an array",
            })
        }
    };

    if items.len() != BoundingBox::LEN {
        return Err(Error::MalformedField {
            field: "box",
            reason: "expected exactly 6 items",
        });
    }

    let mut values = [0; BoundingBox::LEN];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = value_int(item).ok_or(Error::MalformedField {
            field: "box",
            reason: "non-numeric item",
        })?;
    }
    Ok(Some(BoundingBox::from_array(values)))
}

/// Copy up to three leading values of every point into a freshly allocated
/// joint buffer. Values are truncated to `u16`.
fn parse_points<A>(points: &[Value], alloc: &A) -> Result<Vec<Joint>, Error>
where
    A: Allocator,
{
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let mut joints = alloc.joints(points.len())?;
    for (p_idx, (joint, point)) in joints.iter_mut().zip(points).enumerate() {
        let dims = match point.as_array() {
            Some(dims) => dims,
            None => {
                trace!(message = "skipping non-array point", p_idx);
                continue;
            }
        };
        for (dim, item) in dims.iter().take(Joint::DIMS).enumerate() {
            joint.set(dim, value_int(item).unwrap_or_default() as u16);
        }
    }
    Ok(joints)
}

/// Parse a `keypoints` array into a frame using the global heap.
pub(crate) fn parse_people(keypoints: Option<&Value>) -> Result<Frame, Error> {
    parse_people_with(keypoints, &SystemAllocator)
}

/// Parse a `keypoints` array into a frame.
///
/// Either every person is parsed and the whole frame is returned, or nothing
/// is: a failed joint allocation for any person drops every buffer built so
/// far together with the batch itself.
pub(crate) fn parse_people_with<A>(keypoints: Option<&Value>, alloc: &A) -> Result<Frame, Error>
where
    A: Allocator,
{
    let items = match keypoints.and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items,
        _ => return Err(Error::EmptyOrInvalidInput),
    };

    let mut people = alloc.people(items.len()).map_err(|e| {
        error!(message = "failed to allocate keypoints array", count = items.len());
        e
    })?;

    for (index, (item, person)) in items.iter().zip(people.iter_mut()).enumerate() {
        match parse_box(item.get("box")) {
            Ok(Some(bbox)) => person.bbox = bbox,
            Ok(None) => {}
            Err(e) => debug!(message = "leaving box zeroed", index, error = %e),
        }

        match item.get("points") {
            Some(Value::Array(points)) => {
                person.points = parse_points(points, alloc).map_err(|e| {
                    error!(
                        message = "failed to allocate points, dropping batch",
                        index,
                        len = points.len()
                    );
                    e
                })?;
            }
            Some(_) => {
                let e = Error::MalformedField {
                    field: "points",
                    reason: "not an array",
                };
                debug!(message = "leaving points empty", index, error = %e);
            }
            None => {}
        }
    }

    Ok(Frame::new(people))
}
