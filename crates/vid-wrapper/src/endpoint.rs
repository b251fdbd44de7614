//! The wrapper's event handler.
//!
//! One `getVerifiedEmail` call creates a hidden service frame, asks it for
//! the verified email once it loads, and then plays go-between for the
//! service and the login popup until the result comes back.

use vid_mailbox::{admit_from, MailboxRouter, Rejection, Routed};
use vid_protocol::{ErrorInfo, Message, Operation};
use vid_transport::{debug, send, ContextId, Envelope, Origin, Transport};

use crate::config::WrapperConfig;
use crate::error::WrapperError;
use crate::host::{HostError, PageHost};
use crate::popup::PopupFeatures;

/// Token prefix for the wrapper's own mailboxes.
///
/// Distinct from the service's prefix so the two token spaces never meet.
pub const WRAPPER_TOKEN_PREFIX: &str = "w";

/// The caller's result callback.
pub type Callback = Box<dyn FnOnce(Message)>;

/// Continuations lodged in the wrapper's mailbox router.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WrapperPending {
    /// The final `getVerifiedEmail` result from the frame
    VerifiedEmail { frame: ContextId },
}

/// Outcome of handling one inbound envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handled {
    /// Failed a trust check; logged and dropped
    Dropped(Rejection),
    /// The caller's callback was invoked
    Delivered,
    /// A result arrived after the callback had already fired
    Stale,
    /// A login popup was opened
    PopupOpened(ContextId),
    /// `closePopup` handled (whether or not a popup was open)
    PopupClosed,
    /// The popup's `login` outcome was forwarded to the frame
    LoginRelayed { mailbox: Option<String> },
}

/// A teardown step that can fail independently of the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TeardownStep {
    MessageListener,
    LoadListener,
    Frame,
}

/// What `unhook` managed to remove.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnhookReport {
    /// Steps that failed; every other step succeeded
    pub failures: Vec<(TeardownStep, HostError)>,
}

impl UnhookReport {
    /// Whether every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// State of the flow started by the last `getVerifiedEmail` call.
struct Flow {
    frame: ContextId,
    callback: Option<Callback>,
    popup: Option<ContextId>,
    /// The `popup` request, kept to recover its mailbox for `login`
    popup_request: Option<Message>,
}

/// Wrapper endpoint.
///
/// Lives in the hosting page. Trusts exactly one origin, the identity
/// service's, for both inbound and outbound messages.
pub struct WrapperEndpoint<H, T> {
    config: WrapperConfig,
    identity_origin: Origin,
    host: H,
    transport: T,
    router: MailboxRouter<WrapperPending>,
    flow: Option<Flow>,
}

impl<H: PageHost, T: Transport> WrapperEndpoint<H, T> {
    /// Create a wrapper. Fails if the configured identity origin is not a
    /// concrete origin.
    pub fn new(config: WrapperConfig, host: H, transport: T) -> Result<Self, WrapperError> {
        let identity_origin = Origin::parse(&config.identity_origin)
            .ok_or_else(|| WrapperError::Config(config.identity_origin.clone()))?;
        Ok(Self {
            config,
            identity_origin,
            host,
            transport,
            router: MailboxRouter::with_prefix(WRAPPER_TOKEN_PREFIX),
            flow: None,
        })
    }

    /// Wrapper configuration.
    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    /// The only origin the wrapper trusts.
    pub fn identity_origin(&self) -> &Origin {
        &self.identity_origin
    }

    /// Page host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mailbox router.
    pub fn router(&self) -> &MailboxRouter<WrapperPending> {
        &self.router
    }

    /// Service frame of the current flow.
    pub fn frame(&self) -> Option<ContextId> {
        self.flow.as_ref().map(|f| f.frame)
    }

    /// Open login popup of the current flow.
    pub fn popup(&self) -> Option<ContextId> {
        self.flow.as_ref().and_then(|f| f.popup)
    }

    /// Whether a teardown hook exists.
    ///
    /// Only once a flow has been started is there anything to unhook.
    pub fn has_teardown(&self) -> bool {
        self.flow.is_some()
    }

    /// Start a verified-email flow; `callback` fires at most once.
    ///
    /// Tears down any previous flow first. Returns the new service frame.
    pub fn get_verified_email<F>(&mut self, callback: F) -> Result<ContextId, WrapperError>
    where
        F: FnOnce(Message) + 'static,
    {
        if self.flow.is_some() {
            debug("navigator.id: Replacing previous flow.");
            let report = self.unhook();
            if !report.is_clean() {
                debug(&format!("navigator.id: Teardown incomplete: {:?}", report.failures));
            }
        }

        let src = self.config.service_url();
        match self.host.create_hidden_frame(&src) {
            Ok(frame) => {
                debug(&format!("navigator.id: Created service frame {} at {}", frame, src));
                self.flow = Some(Flow {
                    frame,
                    callback: Some(Box::new(callback)),
                    popup: None,
                    popup_request: None,
                });
                Ok(frame)
            }
            Err(e) => {
                callback(Message::failed(
                    Operation::GetVerifiedEmail,
                    Some(ErrorInfo::new(e.to_string())),
                ));
                Err(e.into())
            }
        }
    }

    /// The service frame finished loading: ask it for the verified email.
    ///
    /// Returns the mailbox the result will carry.
    pub fn on_frame_load(&mut self) -> Result<String, WrapperError> {
        let frame = self.frame().ok_or(WrapperError::NoActiveFlow)?;
        let mailbox = self.router.send_expecting_reply(
            &self.transport,
            frame,
            Message::new(Operation::GetVerifiedEmail),
            WrapperPending::VerifiedEmail { frame },
            Some(&self.identity_origin),
        )?;
        debug(&format!("navigator.id: Sent getVerifiedEmail ({})", mailbox));
        Ok(mailbox)
    }

    /// Handle one inbound `message` event.
    ///
    /// Messages from anywhere but the identity origin, and payloads that are
    /// not JSON objects, are logged and dropped.
    pub fn handle_message(&mut self, envelope: &Envelope) -> Result<Handled, WrapperError> {
        debug(&format!("navigator.id: Origin: {}", envelope.origin));
        debug(&format!("navigator.id: Wrapper received: {}", envelope.data));

        let message = match admit_from(envelope, &self.identity_origin) {
            Ok(message) => message,
            Err(rejection) => {
                debug(&format!("navigator.id: Rejecting message: {}", rejection));
                return Ok(Handled::Dropped(rejection));
            }
        };

        match message.op() {
            Some(Operation::GetVerifiedEmail) => Ok(self.on_result(message)),
            Some(Operation::Popup) => self.on_popup(message),
            Some(Operation::ClosePopup) => Ok(self.on_close_popup()),
            Some(Operation::Login) => self.on_login(message),
            _ => Err(WrapperError::UnknownOperation(message.operation)),
        }
    }

    /// Remove listeners and the frame. Each step is attempted regardless of
    /// the others; the flow is forgotten either way.
    pub fn unhook(&mut self) -> UnhookReport {
        let mut report = UnhookReport::default();
        let Some(flow) = self.flow.take() else {
            return report;
        };

        let steps: [(TeardownStep, Result<(), HostError>); 3] = [
            (
                TeardownStep::MessageListener,
                self.host.remove_message_listener(flow.frame),
            ),
            (
                TeardownStep::LoadListener,
                self.host.remove_load_listener(flow.frame),
            ),
            (TeardownStep::Frame, self.host.remove_frame(flow.frame)),
        ];
        for (step, result) in steps {
            if let Err(e) = result {
                report.failures.push((step, e));
            }
        }
        report
    }

    fn on_result(&mut self, message: Message) -> Handled {
        let current = self.frame();
        match self.router.dispatch(message) {
            Routed::Reply {
                pending: WrapperPending::VerifiedEmail { frame },
                message,
            } if Some(frame) == current => self.deliver(message),
            Routed::Reply { message, .. } => {
                debug(&format!(
                    "navigator.id: Ignoring result for a replaced flow: {:?}",
                    message.mailbox
                ));
                Handled::Stale
            }
            // A frame that doesn't echo mailboxes still answers the current flow.
            Routed::Unsolicited(message) => self.deliver(message),
        }
    }

    fn on_popup(&mut self, message: Message) -> Result<Handled, WrapperError> {
        debug("navigator.id: In handlePopup.");
        let flow = self.flow.as_mut().ok_or(WrapperError::NoActiveFlow)?;
        // At most one login window per flow.
        if let Some(previous) = flow.popup.take() {
            flow.popup_request = None;
            if let Err(e) = self.host.close_popup(previous) {
                debug(&format!("navigator.id: Could not close previous popup: {}", e));
            }
        }

        let features = PopupFeatures::from_message(&message, &self.config.popup_defaults);
        let uri = message.str_field("uri").unwrap_or_default();
        let target = message.str_field("target").unwrap_or("_blank");

        match self.host.open_popup(uri, target, &features) {
            Ok(popup) => {
                debug(&format!("navigator.id: Created popup: {}", popup));
                if let Some(flow) = self.flow.as_mut() {
                    flow.popup = Some(popup);
                    flow.popup_request = Some(message);
                }
                Ok(Handled::PopupOpened(popup))
            }
            Err(HostError::PopupBlocked) => {
                let error = WrapperError::PopupBlocked;
                self.deliver(Message::failed(
                    Operation::GetVerifiedEmail,
                    Some(ErrorInfo::new(error.to_string())),
                ));
                Err(error)
            }
            Err(e) => {
                self.deliver(Message::failed(
                    Operation::GetVerifiedEmail,
                    Some(ErrorInfo::new(e.to_string())),
                ));
                Err(e.into())
            }
        }
    }

    fn on_close_popup(&mut self) -> Handled {
        debug("navigator.id: In handleClosePopup.");
        if let Some(flow) = self.flow.as_mut() {
            if let Some(popup) = flow.popup.take() {
                if let Err(e) = self.host.close_popup(popup) {
                    debug(&format!("navigator.id: Could not close popup: {}", e));
                }
            }
            flow.popup_request = None;
        }
        Handled::PopupClosed
    }

    fn on_login(&mut self, message: Message) -> Result<Handled, WrapperError> {
        debug("navigator.id: In handleLoginResponse.");
        let flow = self.flow.as_ref().ok_or(WrapperError::NoActiveFlow)?;
        let request = flow
            .popup_request
            .as_ref()
            .ok_or(WrapperError::NoPendingPopup)?;

        let mailbox = request.mailbox.clone();
        let mut relayed = message;
        relayed.mailbox = mailbox.clone();
        send(
            &self.transport,
            flow.frame,
            &relayed,
            Some(&self.identity_origin),
        )?;
        Ok(Handled::LoginRelayed { mailbox })
    }

    /// Hand a result to the caller. The mailbox is the wrapper's own
    /// correlation token and is not part of the caller-facing result.
    fn deliver(&mut self, mut message: Message) -> Handled {
        match self.flow.as_mut().and_then(|f| f.callback.take()) {
            Some(callback) => {
                message.mailbox = None;
                callback(message);
                Handled::Delivered
            }
            None => {
                debug("navigator.id: Result arrived with no callback waiting.");
                Handled::Stale
            }
        }
    }
}
