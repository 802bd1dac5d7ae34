#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("keypoints value is missing, not an array, or empty")]
    EmptyOrInvalidInput,

    #[error("failed to allocate {what} for {len} elements")]
    OutOfMemory {
        what: &'static str,
        len: usize,
        #[source]
        source: Option<std::collections::TryReserveError>,
    },

    #[error("malformed {field}: {reason}")]
    MalformedField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("failed to convert usize value to keypoint kind: {0}")]
    ConvertUSizeToKeypointKind(usize),

    #[error("failed to convert keypoint variant to usize: {0:?}")]
    KeypointVariantToUSize(crate::pose::KeypointKind),

    #[error("failed to post event: consumer has hung up")]
    PostEvent,

    #[error("failed to read input line")]
    ReadInput(#[source] std::io::Error),

    #[error("failed to create output directory: {1:?}")]
    CreateOutputDir(#[source] std::io::Error, std::path::PathBuf),

    #[error("failed to write canvas to {1:?}")]
    WriteCanvas(#[source] std::io::Error, std::path::PathBuf),
}

impl Error {
    pub(crate) fn out_of_memory(
        what: &'static str,
        len: usize,
        source: std::collections::TryReserveError,
    ) -> Self {
        Self::OutOfMemory {
            what,
            len,
            source: Some(source),
        }
    }

    pub(crate) fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}
