//! Drag-and-drop error types

/// Errors raised while decoding a drag payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    /// The payload does not have the `<key>/<kind>` shape.
    #[error("Malformed drag payload: {0:?}")]
    MalformedPayload(String),

    /// The kind part is neither `node` nor `leaf`.
    #[error("Unknown skeleton type: {0:?}")]
    UnknownKind(String),
}
