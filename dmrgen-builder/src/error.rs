//! Ordering-contract violations that abort a run

use dmrgen_common::{AttachError, ChannelId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeplugError {
    /// A resolver tried to overwrite a back reference another resolver set
    #[error("channel {channel} ('{name}'): {source}")]
    Attach {
        channel: ChannelId,
        name: String,
        #[source]
        source: AttachError,
    },

    #[error("APRS configuration requested before its channel was generated")]
    AprsChannelMissing,

    /// A stage read a collection no earlier stage produced
    #[error("stage '{stage}' needs {what}, which no earlier stage produced")]
    MissingStageOutput { stage: &'static str, what: &'static str },
}

impl CodeplugError {
    pub fn attach(channel: ChannelId, name: &str, source: AttachError) -> Self {
        CodeplugError::Attach {
            channel,
            name: name.to_string(),
            source,
        }
    }
}
