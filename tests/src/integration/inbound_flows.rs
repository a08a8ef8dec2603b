//! # Inbound Flows
//!
//! Traffic arriving at `InboundDispatcher` in `multipart/related` framing:
//! business messages fan out to handlers, acknowledgements land in the
//! correlation table, and nothing malformed stops later deliveries.

#[cfg(test)]
mod tests {
    use super::super::{invoice, loopback_service, routing};
    use as4_codec::{mime, WireCodec};
    use as4_exchange::{DispatchOutcome, GatewayScript, MessageHandler};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use shared_types::{
        BusinessMessage, ErrorDetail, Notification, NotificationKind, Payload, Property,
    };
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_test::assert_ok;

    /// Wire form of `message` as a remote sender would transmit it.
    fn remote(message: &BusinessMessage) -> mime::MimeBody {
        let codec = WireCodec::default();
        let encoded = codec
            .encode_outbound(&routing(), message)
            .expect("encodable message");
        let raw = codec.to_wire(&encoded.envelope).expect("serializable envelope");
        mime::package(&raw, &encoded.attachments)
    }

    fn acknowledgement(notification: &Notification) -> mime::MimeBody {
        let codec = WireCodec::default();
        let raw = codec
            .to_wire(&codec.encode_acknowledgement(notification))
            .expect("serializable envelope");
        mime::package(&raw, &[])
    }

    fn collector() -> (Arc<Mutex<Vec<BusinessMessage>>>, Arc<dyn MessageHandler>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handler: Arc<dyn MessageHandler> =
            Arc::new(move |message: &BusinessMessage| -> anyhow::Result<()> {
                sink.lock().push(message.clone());
                Ok(())
            });
        (received, handler)
    }

    // =========================================================================
    // BUSINESS MESSAGES
    // =========================================================================

    #[test]
    fn test_remote_message_reaches_handler_intact() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let dispatcher = service.dispatcher();
        let (received, handler) = collector();
        dispatcher.register(handler);

        let sent = invoice();
        let body = remote(&sent);
        let outcome = dispatcher.on_receive_mime(&body.content_type, &body.body);

        assert!(matches!(
            outcome,
            DispatchOutcome::Delivered { handlers: 1, failures: 0, .. }
        ));
        let received = received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], sent);
    }

    #[test]
    fn test_handler_failures_are_contained_across_messages() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let dispatcher = service.dispatcher();
        dispatcher.register(Arc::new(|_: &BusinessMessage| -> anyhow::Result<()> {
            anyhow::bail!("archive offline")
        }));
        dispatcher.register(Arc::new(|_: &BusinessMessage| -> anyhow::Result<()> {
            panic!("handler bug")
        }));
        let (received, handler) = collector();
        dispatcher.register(handler);

        for _ in 0..3 {
            let body = remote(&invoice());
            let outcome = dispatcher.on_receive_mime(&body.content_type, &body.body);
            assert!(matches!(
                outcome,
                DispatchOutcome::Delivered { handlers: 3, failures: 2, .. }
            ));
        }

        assert_eq!(received.lock().len(), 3);
    }

    #[test]
    fn test_malformed_traffic_does_not_block_later_messages() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let dispatcher = service.dispatcher();
        let (received, handler) = collector();
        dispatcher.register(handler);

        let outcome = dispatcher.on_receive_mime("multipart/related", b"garbage");
        assert!(matches!(outcome, DispatchOutcome::Rejected { .. }));

        let outcome = dispatcher.on_receive(b"{\"MessageInfo\":", Vec::new());
        assert!(matches!(outcome, DispatchOutcome::Rejected { .. }));

        let body = remote(&invoice());
        dispatcher.on_receive_mime(&body.content_type, &body.body);

        assert_eq!(received.lock().len(), 1);
    }

    #[test]
    fn test_unknown_acknowledgement_action_is_rejected() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let codec = WireCodec::default();
        let ack = Notification::acknowledged(NotificationKind::Submission, "m1@as4", None);
        let mut envelope = codec.encode_acknowledgement(&ack);
        envelope.collaboration_info.action = "PullRequest".into();
        envelope
            .message_properties
            .insert(Property::new("Note", "unsupported"));
        let raw = assert_ok!(codec.to_wire(&envelope));

        match service.dispatcher().on_receive(&raw, Vec::new()) {
            DispatchOutcome::Rejected { locator, .. } => {
                assert_eq!(locator.as_deref(), Some("CollaborationInfo/Action"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(service.table().is_empty());
    }

    // =========================================================================
    // ACKNOWLEDGEMENTS
    // =========================================================================

    #[tokio::test]
    async fn test_waiting_sender_is_woken() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let table = service.table();
        let waiter = tokio::spawn({
            let table = Arc::clone(&table);
            async move { table.obtain("m1@as4", Duration::from_secs(2)).await }
        });
        while !table.contains("m1@as4") {
            tokio::task::yield_now().await;
        }

        let body = acknowledgement(&Notification::acknowledged(
            NotificationKind::Submission,
            "m1@as4",
            Some("m2@as4".into()),
        ));
        let outcome = service
            .dispatcher()
            .on_receive_mime(&body.content_type, &body.body);

        assert!(matches!(
            outcome,
            DispatchOutcome::Fulfilled { waiting: true, .. }
        ));
        let notification = assert_ok!(waiter.await.expect("waiter panicked"));
        assert_eq!(notification.message_id.as_deref(), Some("m2@as4"));
    }

    #[tokio::test]
    async fn test_repeated_acknowledgement_replaces_unclaimed_one() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let dispatcher = service.dispatcher();

        let first = acknowledgement(&Notification::acknowledged(
            NotificationKind::Relay,
            "m2@as4",
            None,
        ));
        let second = acknowledgement(&Notification::error(
            NotificationKind::Relay,
            "m2@as4",
            None,
            ErrorDetail::new("EBMS:0301"),
        ));
        dispatcher.on_receive_mime(&first.content_type, &first.body);
        dispatcher.on_receive_mime(&second.content_type, &second.body);

        let table = service.table();
        let notification = assert_ok!(table.obtain("m2@as4", Duration::from_millis(100)).await);
        assert_eq!(notification.error_code(), Some("EBMS:0301"));
        assert_eq!(table.stats().replaced.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unclaimed_acknowledgement_expires() {
        let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
        let body = acknowledgement(&Notification::acknowledged(
            NotificationKind::Submission,
            "late@as4",
            Some("late-relay@as4".into()),
        ));
        service
            .dispatcher()
            .on_receive_mime(&body.content_type, &body.body);

        let table = service.table();
        assert_eq!(table.sweep(Instant::now()).total(), 0);
        assert!(table.contains("late@as4"));

        let expiry = service.config().sweep.policy().expiry;
        let report = table.sweep(Instant::now() + expiry + Duration::from_secs(1));
        assert_eq!(report.fulfilled, 1);
        assert!(table.is_empty());
    }

    // =========================================================================
    // PROPERTY TESTS
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_payload_bytes_survive_inbound_path(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..512), 1..4)
        ) {
            let (service, _) = loopback_service(GatewayScript::accept_all(), 1_000);
            let dispatcher = service.dispatcher();
            let (received, handler) = collector();
            dispatcher.register(handler);

            let route = routing();
            let mut builder = BusinessMessage::builder()
                .sender(route.sender)
                .receiver(route.receiver)
                .document_type(route.document_type)
                .process(route.process);
            for (index, content) in payloads.iter().enumerate() {
                builder = builder.payload(Payload::new(
                    "application/octet-stream",
                    format!("part{index}@sender.example.org"),
                    content.clone(),
                ));
            }
            let sent = builder.build().expect("complete message");

            let body = remote(&sent);
            dispatcher.on_receive_mime(&body.content_type, &body.body);

            let received = received.lock();
            prop_assert_eq!(received.len(), 1);
            prop_assert_eq!(&received[0], &sent);
        }
    }
}
