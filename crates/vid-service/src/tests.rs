//! Unit tests for IdentityService
//!
//! These drive the service over an in-memory bus with a scripted remote
//! API, inspecting what it posts back.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vid_mailbox::Rejection;
    use vid_network::{ScriptedHttp, OP_GET_DEFAULT_EMAIL, OP_LOGGED_IN};
    use vid_protocol::{wire, Message, Operation};
    use vid_transport::{ContextId, Envelope, MemoryBus, MemoryPort};

    use crate::{FlowState, Handled, IdentityService, ServiceConfig};

    const RP_ORIGIN: &str = "https://rp.example";
    const ID_ORIGIN: &str = "http://web4.dev.svc.mtv1.mozilla.com";

    struct Fixture {
        bus: MemoryBus,
        page: MemoryPort,
        frame: MemoryPort,
        http: ScriptedHttp,
        service: IdentityService<MemoryPort, ScriptedHttp>,
    }

    fn fixture() -> Fixture {
        let bus = MemoryBus::new();
        let page = bus.open_context(RP_ORIGIN);
        let frame = bus.open_context(ID_ORIGIN);
        let http = ScriptedHttp::new();
        let service = IdentityService::new(ServiceConfig::default(), frame.clone(), http.clone());
        Fixture {
            bus,
            page,
            frame,
            http,
            service,
        }
    }

    fn envelope_from(port: &MemoryPort, origin: &str, message: &Message) -> Envelope {
        Envelope::new(port.id(), wire::encode(message).unwrap(), origin)
    }

    fn received(port: &MemoryPort) -> Vec<Message> {
        port.on_message()
            .map(|e| wire::decode(&e.data).unwrap())
            .collect()
    }

    // =========================================================================
    // Logged-in path
    // =========================================================================

    #[test]
    fn test_logged_in_replies_with_email() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": true}));
        f.http.respond_json(
            OP_GET_DEFAULT_EMAIL,
            200,
            json!({"success": true, "email": "alice@example.com"}),
        );

        let request = Message::new(Operation::GetVerifiedEmail);
        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();

        assert_eq!(handled, Handled::Flow(FlowState::Done));
        let replies = received(&f.page);
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0],
            Message::succeeded(Operation::GetVerifiedEmail, "alice@example.com")
        );

        // Audience is the requester's origin.
        let fetch = &f.http.requests()[1];
        assert_eq!(fetch.operation(), OP_GET_DEFAULT_EMAIL);
        assert_eq!(fetch.form_field("audience").as_deref(), Some(RP_ORIGIN));
    }

    #[test]
    fn test_reply_echoes_request_mailbox() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": true}));
        f.http.respond_json(
            OP_GET_DEFAULT_EMAIL,
            200,
            json!({"success": true, "email": "alice@example.com"}),
        );

        let request = Message::new(Operation::GetVerifiedEmail).with_mailbox("w0");
        f.service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();

        let replies = received(&f.page);
        assert_eq!(replies[0].mailbox.as_deref(), Some("w0"));
    }

    #[test]
    fn test_logged_in_check_failure_fails_flow() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 503, json!({}));

        let request = Message::new(Operation::GetVerifiedEmail);
        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();

        assert_eq!(handled, Handled::Flow(FlowState::Failed));
        let replies = received(&f.page);
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].success());
        assert_eq!(replies[0].error().and_then(|e| e.code), Some(503));
        assert_eq!(f.http.request_count(OP_GET_DEFAULT_EMAIL), 0);
    }

    #[test]
    fn test_default_email_failure_propagates() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": true}));
        f.http.respond_json(
            OP_GET_DEFAULT_EMAIL,
            200,
            json!({"success": false, "error": {"reason": "no email"}}),
        );

        let request = Message::new(Operation::GetVerifiedEmail);
        f.service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();

        let replies = received(&f.page);
        assert_eq!(replies[0].op(), Some(Operation::GetVerifiedEmail));
        assert!(!replies[0].success());
        assert_eq!(replies[0].error().map(|e| e.reason), Some("no email".to_string()));
    }

    // =========================================================================
    // Popup path
    // =========================================================================

    fn start_popup_flow(f: &mut Fixture) -> String {
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": false}));
        f.http.respond_json(
            OP_GET_DEFAULT_EMAIL,
            200,
            json!({"success": true, "email": "bob@example.com"}),
        );
        let request = Message::new(Operation::GetVerifiedEmail);
        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();
        match handled {
            Handled::Flow(FlowState::AwaitPopup { mailbox }) => mailbox,
            other => panic!("Expected AwaitPopup, got {:?}", other),
        }
    }

    #[test]
    fn test_not_logged_in_requests_popup() {
        let mut f = fixture();
        let mailbox = start_popup_flow(&mut f);

        let sent = received(&f.page);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].op(), Some(Operation::Popup));
        assert_eq!(sent[0].mailbox.as_deref(), Some(mailbox.as_str()));
        assert_eq!(sent[0].str_field("target"), Some("_blank"));
        assert_eq!(
            sent[0].str_field("uri"),
            Some("http://web4.dev.svc.mtv1.mozilla.com/1/login")
        );
        assert!(f.service.router().is_pending(&mailbox));
        assert_eq!(f.http.request_count(OP_GET_DEFAULT_EMAIL), 0);
    }

    #[test]
    fn test_popup_success_fetches_replies_then_closes() {
        let mut f = fixture();
        let mailbox = start_popup_flow(&mut f);
        let _ = received(&f.page);

        let login = Message::new(Operation::Login)
            .with_mailbox(mailbox)
            .with_field("success", true);
        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &login))
            .unwrap();

        assert_eq!(handled, Handled::Flow(FlowState::Done));
        let sent = received(&f.page);
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0],
            Message::succeeded(Operation::GetVerifiedEmail, "bob@example.com")
        );
        assert_eq!(sent[1], Message::new(Operation::ClosePopup));
        assert_eq!(f.service.router().pending_len(), 0);
    }

    #[test]
    fn test_popup_failure_fails_without_remote_calls() {
        let mut f = fixture();
        let mailbox = start_popup_flow(&mut f);
        let _ = received(&f.page);
        let before = f.http.requests().len();

        let login = Message::new(Operation::Login)
            .with_mailbox(mailbox)
            .with_field("success", false);
        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &login))
            .unwrap();

        assert_eq!(handled, Handled::Flow(FlowState::Failed));
        let sent = received(&f.page);
        assert_eq!(sent, vec![Message::failed(Operation::GetVerifiedEmail, None)]);
        assert_eq!(f.http.requests().len(), before);
    }

    #[test]
    fn test_popup_fetch_failure_leaves_popup_open() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": false}));
        f.http.respond_json(OP_GET_DEFAULT_EMAIL, 500, json!({}));
        let request = Message::new(Operation::GetVerifiedEmail);
        f.service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();
        let _ = received(&f.page);

        let login = Message::new(Operation::Login)
            .with_mailbox("m0")
            .with_field("success", true);
        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &login))
            .unwrap();

        assert_eq!(handled, Handled::Flow(FlowState::Failed));
        let sent = received(&f.page);
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].success());
    }

    #[test]
    fn test_replies_go_to_original_origin() {
        let mut f = fixture();
        let mailbox = start_popup_flow(&mut f);
        let _ = received(&f.page);

        // The popup outcome arrives from some other context and origin.
        let stranger = f.bus.open_context("https://stranger.example");
        let login = Message::new(Operation::Login)
            .with_mailbox(mailbox)
            .with_field("success", true);
        f.service
            .handle_post_message(&envelope_from(
                &stranger,
                "https://stranger.example",
                &login,
            ))
            .unwrap();

        assert_eq!(stranger.queued(), 0);
        let to_page = f.bus.deliveries_to(f.page.id());
        assert!(to_page.iter().all(|d| d.target_origin == RP_ORIGIN && d.delivered));
        assert_eq!(received(&f.page).len(), 2);
    }

    #[test]
    fn test_unanswered_popup_flow_stays_pending() {
        let mut f = fixture();
        let mailbox = start_popup_flow(&mut f);

        // A second request starts a second, independent flow.
        let request = Message::new(Operation::GetVerifiedEmail);
        f.service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
            .unwrap();

        assert!(f.service.router().is_pending(&mailbox));
        assert_eq!(f.service.router().pending_len(), 2);
    }

    #[test]
    fn test_closed_page_surfaces_transport_error() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": false}));
        f.bus.close_context(f.page.id());

        let request = Message::new(Operation::GetVerifiedEmail);
        let result = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request));

        assert!(result.is_err());
        assert_eq!(f.service.router().pending_len(), 0);
    }

    // =========================================================================
    // Unsolicited and untrusted messages
    // =========================================================================

    #[test]
    fn test_unknown_operation_replies_unknown() {
        let mut f = fixture();
        let bogus = Message::with_tag("bogus").with_mailbox("t1");

        let handled = f
            .service
            .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &bogus))
            .unwrap();

        assert_eq!(handled, Handled::Unknown);
        let deliveries = f.bus.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].target_origin, RP_ORIGIN);
        let value: serde_json::Value = serde_json::from_str(&deliveries[0].data).unwrap();
        assert_eq!(
            value,
            json!({"operation": "unknown", "success": false, "mailbox": "t1"})
        );
        assert!(f.http.requests().is_empty());
    }

    #[test]
    fn test_malformed_json_dropped() {
        let mut f = fixture();
        let envelope = Envelope::new(f.page.id(), "{{{ not json", RP_ORIGIN);

        let handled = f.service.handle_post_message(&envelope).unwrap();

        assert!(matches!(handled, Handled::Dropped(Rejection::Malformed(_))));
        assert!(f.bus.deliveries().is_empty());
        assert!(f.http.requests().is_empty());
    }

    #[test]
    fn test_null_origin_dropped() {
        let mut f = fixture();
        let request = Message::new(Operation::GetVerifiedEmail);
        let envelope = Envelope::new(ContextId(77), wire::encode(&request).unwrap(), "null");

        let handled = f.service.handle_post_message(&envelope).unwrap();

        assert_eq!(handled, Handled::Dropped(Rejection::NullOrigin));
        assert!(f.bus.deliveries().is_empty());
        assert!(f.http.requests().is_empty());
        assert_eq!(f.frame.queued(), 0);
    }

    #[test]
    fn test_every_flow_requeries_session() {
        let mut f = fixture();
        f.http.respond_json(OP_LOGGED_IN, 200, json!({"success": true}));
        f.http.respond_json(
            OP_GET_DEFAULT_EMAIL,
            200,
            json!({"success": true, "email": "alice@example.com"}),
        );

        for _ in 0..3 {
            let request = Message::new(Operation::GetVerifiedEmail);
            f.service
                .handle_post_message(&envelope_from(&f.page, RP_ORIGIN, &request))
                .unwrap();
        }

        assert_eq!(f.http.request_count(OP_LOGGED_IN), 3);
    }
}
