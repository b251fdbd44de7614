//! The identity service event handler.

use vid_mailbox::{Inbound, MailboxRouter, Rejection, Routed};
use vid_network::{HttpClient, IdentityApi};
use vid_protocol::{Message, Operation};
use vid_transport::{debug, send, Envelope, Origin, Transport};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::pending::{FlowState, PendingReply, RequestContext};
use crate::response;

/// Audience presented to the remote API for a request.
///
/// The requester's transport origin is the relying-party identifier.
pub fn audience_for(origin: &Origin) -> &str {
    origin.as_str()
}

/// Outcome of handling one inbound envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handled {
    /// Failed a trust check; logged and dropped without a reply
    Dropped(Rejection),
    /// Unsolicited message with an unrecognized operation; `unknown` sent
    Unknown,
    /// A `getVerifiedEmail` flow advanced to this state
    Flow(FlowState),
}

/// Identity service endpoint.
///
/// Owns its mailbox router, its transport, and the remote API client.
/// Holds no session state: every flow re-queries `logged_in`.
pub struct IdentityService<T, C> {
    config: ServiceConfig,
    transport: T,
    api: IdentityApi<C>,
    router: MailboxRouter<PendingReply>,
}

impl<T: Transport, C: HttpClient> IdentityService<T, C> {
    /// Create a service posting through `transport` and calling the remote
    /// API through `client`.
    pub fn new(config: ServiceConfig, transport: T, client: C) -> Self {
        let api = IdentityApi::new(config.base_url(), client);
        Self {
            config,
            transport,
            api,
            router: MailboxRouter::new(),
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Remote API client.
    pub fn api(&self) -> &IdentityApi<C> {
        &self.api
    }

    /// Mailbox router (pending popup flows).
    pub fn router(&self) -> &MailboxRouter<PendingReply> {
        &self.router
    }

    /// Handle one inbound `message` event.
    ///
    /// Trust failures are logged and reported as [`Handled::Dropped`]; they
    /// never produce a reply or an error.
    pub fn handle_post_message(&mut self, envelope: &Envelope) -> Result<Handled, ServiceError> {
        match self.router.receive(envelope) {
            Ok(inbound) => self.receive(inbound),
            Err(rejection) => {
                match &rejection {
                    Rejection::NullOrigin => {
                        debug("IdentityService: Rejecting message with null origin.")
                    }
                    other => debug(&format!("IdentityService: Ignoring message: {}", other)),
                }
                Ok(Handled::Dropped(rejection))
            }
        }
    }

    fn receive(&mut self, inbound: Inbound<PendingReply>) -> Result<Handled, ServiceError> {
        let Inbound {
            source,
            origin,
            routed,
        } = inbound;

        match routed {
            Routed::Reply {
                pending: PendingReply::PopupLogin { request },
                message,
            } => self.on_popup_reply(request, &message).map(Handled::Flow),
            Routed::Unsolicited(message) => {
                let request = RequestContext::new(source, origin, message.mailbox.clone());
                self.default_handler(request, &message)
            }
        }
    }

    /// Messages that don't need an existing mailbox.
    fn default_handler(
        &mut self,
        request: RequestContext,
        message: &Message,
    ) -> Result<Handled, ServiceError> {
        match message.op() {
            Some(Operation::GetVerifiedEmail) => {
                self.get_verified_email(request).map(Handled::Flow)
            }
            _ => {
                debug(&format!(
                    "IdentityService: Unknown operation '{}'",
                    message.operation
                ));
                let reply = response::unknown_operation(request.mailbox.clone());
                send(&self.transport, request.source, &reply, Some(&request.origin))?;
                Ok(Handled::Unknown)
            }
        }
    }

    /// Start a verified-email flow for `request`.
    pub fn get_verified_email(&mut self, request: RequestContext) -> Result<FlowState, ServiceError> {
        let logged_in = match self.api.logged_in() {
            Ok(logged_in) => logged_in,
            Err(e) => {
                debug(&format!("IdentityService: logged_in failed: {}", e));
                self.reply(&request, response::api_failure(&e))?;
                return Ok(FlowState::Failed);
            }
        };

        if logged_in {
            debug("IdentityService: Logged in: getting default email.");
            return self.fetch_and_reply(&request);
        }

        // Get an active session via a popup.
        debug("IdentityService: Not logged in: creating popup.");
        let popup = response::popup_request(&self.config.login_uri());
        let source = request.source;
        let origin = request.origin.clone();
        let mailbox = self.router.send_expecting_reply(
            &self.transport,
            source,
            popup,
            PendingReply::PopupLogin { request },
            Some(&origin),
        )?;
        Ok(FlowState::AwaitPopup { mailbox })
    }

    fn on_popup_reply(
        &mut self,
        request: RequestContext,
        reply: &Message,
    ) -> Result<FlowState, ServiceError> {
        debug(&format!(
            "IdentityService: Got message from popup: success={}",
            reply.success()
        ));
        if !reply.success() {
            self.reply(&request, response::login_failure(reply))?;
            return Ok(FlowState::Failed);
        }

        debug("IdentityService: Fetching default email and replying...");
        let state = self.fetch_and_reply(&request)?;
        if state == FlowState::Done {
            self.close_popup(&request);
        }
        Ok(state)
    }

    fn fetch_and_reply(&self, request: &RequestContext) -> Result<FlowState, ServiceError> {
        match self.api.get_default_email(audience_for(&request.origin)) {
            Ok(email) => {
                self.reply(request, response::verified_email(&email))?;
                Ok(FlowState::Done)
            }
            Err(e) => {
                debug(&format!("IdentityService: get_default_email failed: {}", e));
                self.reply(request, response::api_failure(&e))?;
                Ok(FlowState::Failed)
            }
        }
    }

    fn close_popup(&self, request: &RequestContext) {
        if let Err(e) = send(
            &self.transport,
            request.source,
            &response::close_popup(),
            Some(&request.origin),
        ) {
            debug(&format!(
                "IdentityService: closePopup not sent ({}), popup stays open",
                e
            ));
        }
    }

    /// Send to the context and origin that started the flow.
    fn reply(&self, request: &RequestContext, message: Message) -> Result<(), ServiceError> {
        let message = message.with_mailbox_opt(request.mailbox.clone());
        send(&self.transport, request.source, &message, Some(&request.origin))?;
        Ok(())
    }
}
