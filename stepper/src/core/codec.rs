//! Transport encoding for errors thrown by step thunks.

use tracing::warn;

use crate::core::error::{CodecError, StepError};
use crate::core::types::{SerializedError, TransportedError};

/// Discriminator used when the thrown error carries no name of its own.
pub const GENERIC_ERROR_NAME: &str = "Error";

/// Best-effort structured encoding with a raw fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodec {
    max_bytes: usize,
    include_stack: bool,
}

impl ErrorCodec {
    pub fn new(max_bytes: usize, include_stack: bool) -> Self {
        Self {
            max_bytes,
            include_stack,
        }
    }

    /// Encode `err` preserving its message and type discriminator.
    ///
    /// The discriminator is the [`StepError`] name when one is anywhere in the
    /// chain. With `include_stack`, causes below the top-level message are
    /// rendered one per line into `stack`.
    pub fn serialize(&self, err: &anyhow::Error) -> Result<SerializedError, CodecError> {
        let name = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<StepError>())
            .map_or_else(|| GENERIC_ERROR_NAME.to_string(), |step| step.name.clone());
        let message = err.to_string();

        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let stack = (self.include_stack && !causes.is_empty())
            .then(|| format!("{message}\n    caused by: {}", causes.join("\n    caused by: ")));

        let serialized = SerializedError {
            name,
            message,
            stack,
        };
        let size = serde_json::to_vec(&serialized)?.len();
        if size > self.max_bytes {
            return Err(CodecError::Oversized {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(serialized)
    }

    /// Encode `err` for transport, degrading to its display string when
    /// structured encoding fails. Never fails itself.
    pub fn transport(&self, err: &anyhow::Error) -> TransportedError {
        match self.serialize(err) {
            Ok(serialized) => TransportedError::Serialized(serialized),
            Err(codec_err) => {
                warn!(error = %codec_err, "falling back to raw step error");
                TransportedError::Raw(format!("{err:#}"))
            }
        }
    }
}
