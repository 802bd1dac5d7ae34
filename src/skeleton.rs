use crate::{
    canvas::Color,
    pose::KeypointKind::{self, *},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BoneKind {
    /// Joins two real joints.
    Normal,
    /// Nose to the midpoint of the shoulders.
    VirtualNeck,
    /// Midpoint of the shoulders to the midpoint of the hips.
    VirtualSpine,
}

/// One end of a bone: either a real joint or a synthesized midpoint of two.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Joint(KeypointKind),
    Midpoint(KeypointKind, KeypointKind),
}

impl Endpoint {
    pub(crate) const NECK: Self = Self::Midpoint(LeftShoulder, RightShoulder);
    pub(crate) const MID_HIP: Self = Self::Midpoint(LeftHip, RightHip);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Connection {
    pub(crate) a: KeypointKind,
    pub(crate) b: KeypointKind,
    pub(crate) kind: BoneKind,
    pub(crate) color: Color,
}

impl Connection {
    const fn new(a: KeypointKind, b: KeypointKind, kind: BoneKind, color: Color) -> Self {
        Self { a, b, kind, color }
    }

    /// Resolve the declared joint pair into drawable endpoints.
    pub(crate) fn endpoints(&self) -> (Endpoint, Endpoint) {
        match self.kind {
            BoneKind::Normal => (Endpoint::Joint(self.a), Endpoint::Joint(self.b)),
            BoneKind::VirtualNeck => (Endpoint::Joint(self.a), Endpoint::NECK),
            BoneKind::VirtualSpine => (Endpoint::NECK, Endpoint::MID_HIP),
        }
    }
}

pub(crate) const COLOR_HEAD: Color = Color::rgb(255, 85, 85);
pub(crate) const COLOR_BODY: Color = Color::rgb(85, 255, 85);
pub(crate) const COLOR_LEGS: Color = Color::rgb(85, 85, 255);

/// Bones of the 17 point model, drawn in this order.
pub(crate) const SKELETON_CONNECTIONS: [Connection; 16] = [
    // head
    Connection::new(Nose, LeftEye, BoneKind::Normal, COLOR_HEAD),
    Connection::new(LeftEye, LeftEar, BoneKind::Normal, COLOR_HEAD),
    Connection::new(Nose, RightEye, BoneKind::Normal, COLOR_HEAD),
    Connection::new(RightEye, RightEar, BoneKind::Normal, COLOR_HEAD),
    // arms
    Connection::new(LeftShoulder, RightShoulder, BoneKind::Normal, COLOR_BODY),
    Connection::new(LeftShoulder, LeftElbow, BoneKind::Normal, COLOR_BODY),
    Connection::new(LeftElbow, LeftWrist, BoneKind::Normal, COLOR_BODY),
    Connection::new(RightShoulder, RightElbow, BoneKind::Normal, COLOR_BODY),
    Connection::new(RightElbow, RightWrist, BoneKind::Normal, COLOR_BODY),
    // legs
    Connection::new(LeftHip, LeftKnee, BoneKind::Normal, COLOR_LEGS),
    Connection::new(LeftKnee, LeftAnkle, BoneKind::Normal, COLOR_LEGS),
    Connection::new(RightHip, RightKnee, BoneKind::Normal, COLOR_LEGS),
    Connection::new(RightKnee, RightAnkle, BoneKind::Normal, COLOR_LEGS),
    Connection::new(LeftHip, RightHip, BoneKind::Normal, COLOR_LEGS),
    // synthesized
    Connection::new(Nose, LeftShoulder, BoneKind::VirtualNeck, COLOR_BODY),
    Connection::new(LeftShoulder, LeftHip, BoneKind::VirtualSpine, COLOR_BODY),
];
