use crate::SlotIndex;

/// Failure to resolve a handle in a [`SlotArray`](crate::SlotArray).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotError {
    /// The handle is beyond the allocated capacity.
    OutOfRange { index: SlotIndex, capacity: u32 },
    /// The slot exists but holds no payload.
    NotFound { index: SlotIndex },
}

impl SlotError {
    /// The handle that failed to resolve.
    #[inline]
    pub fn index(&self) -> SlotIndex {
        match *self {
            SlotError::OutOfRange { index, .. } | SlotError::NotFound { index } => index,
        }
    }
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::OutOfRange { index, capacity } => {
                write!(f, "slot index {} out of range (capacity {})", index, capacity)
            }
            SlotError::NotFound { index } => write!(f, "invalid index {}: slot is empty", index),
        }
    }
}

impl std::error::Error for SlotError {}

/// Result type for handle-based storage operations.
pub(crate) type Result<T> = std::result::Result<T, SlotError>;
