use crate::error::Error;
use num_traits::{FromPrimitive, ToPrimitive};

/// The 17 landmarks of the COCO human pose model, in positional order.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive,
)]
pub(crate) enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointKind {
    pub(crate) fn idx(self) -> Result<usize, Error> {
        self.to_usize().ok_or(Error::KeypointVariantToUSize(self))
    }

    pub(crate) fn from_idx(idx: usize) -> Result<Self, Error> {
        Self::from_usize(idx).ok_or(Error::ConvertUSizeToKeypointKind(idx))
    }
}

pub(crate) const NUM_KEYPOINTS: usize = 17;

/// A single tracked landmark, in canvas pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub(crate) struct Joint {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) score: u16,
}

impl Joint {
    /// Number of leading values of a point array that map onto a joint.
    pub(crate) const DIMS: usize = 3;

    #[cfg(test)]
    pub(crate) fn new(x: u16, y: u16, score: u16) -> Self {
        Self { x, y, score }
    }

    /// Positional assignment: 0 => x, 1 => y, 2 => score. Anything past the
    /// third dimension is ignored.
    pub(crate) fn set(&mut self, dim: usize, value: u16) {
        match dim {
            0 => self.x = value,
            1 => self.y = value,
            2 => self.score = value,
            _ => {}
        }
    }
}

/// `[x, y, width, height, score, target]` as delivered by the device.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub(crate) struct BoundingBox {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) score: i32,
    pub(crate) target: i32,
}

impl BoundingBox {
    pub(crate) const LEN: usize = 6;

    pub(crate) fn from_array(values: [i32; Self::LEN]) -> Self {
        let [x, y, width, height, score, target] = values;
        Self {
            x,
            y,
            width,
            height,
            score,
            target,
        }
    }
}

/// One detected human. `points` is empty when the device sent no usable
/// keypoints for this person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Person {
    pub(crate) bbox: BoundingBox,
    pub(crate) points: Vec<Joint>,
}

impl Person {
    pub(crate) fn points_count(&self) -> usize {
        self.points.len()
    }

    pub(crate) fn joint(&self, kind: KeypointKind) -> Option<&Joint> {
        kind.idx().ok().and_then(|idx| self.points.get(idx))
    }

    /// Whether the person carries a complete 17-point skeleton.
    pub(crate) fn is_complete(&self) -> bool {
        self.points_count() == NUM_KEYPOINTS
    }
}

/// Every person from one inference result. Whoever holds the frame owns every
/// joint buffer inside it; dropping the frame releases all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Frame {
    people: Vec<Person>,
}

impl Frame {
    pub(crate) fn new(people: Vec<Person>) -> Self {
        Self { people }
    }

    pub(crate) fn people(&self) -> &[Person] {
        &self.people
    }

    pub(crate) fn len(&self) -> usize {
        self.people.len()
    }
}
