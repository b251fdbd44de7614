//! Wrapper error types.

use vid_transport::TransportError;

use crate::host::HostError;

/// Errors surfaced by [`crate::WrapperEndpoint`] to the event glue.
///
/// None of these reach the caller's callback as a panic; the ones that end
/// a flow are also reported to the callback as a structured failure.
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    /// The login popup could not be opened
    #[error("Verified email fetcher found no popup!")]
    PopupBlocked,
    /// The service sent an operation the wrapper does not handle
    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),
    /// `login` arrived before any `popup` request
    #[error("login received with no popup request outstanding")]
    NoPendingPopup,
    /// Configured identity origin is null, empty, or a wildcard
    #[error("invalid identity origin: '{0}'")]
    Config(String),
    /// No `getVerifiedEmail` flow has been started
    #[error("no verified email flow is active")]
    NoActiveFlow,
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
