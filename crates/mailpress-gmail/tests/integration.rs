//! Hosted-mail pipeline integration: search, fetch, materialize,
//! rerun idempotency: against a mock API server.

#![allow(clippy::unwrap_used)]

use mockito::{Matcher, Server, ServerGuard};

use mailpress_core::{
    AdmissionPolicy, Classifier, Ledger, MaterializeConfig, Materializer, NormalizedMessage,
    Outcome, SubjectPattern,
};
use mailpress_gmail::{GmailClient, MessageRef, scoped_query};

/// Stands up list/get/raw/attachment mocks for one message.
fn mock_mailbox(server: &mut ServerGuard) {
    server
        .mock("GET", "/users/me/messages")
        .match_query(Matcher::UrlEncoded(
            "q".into(),
            "invoice in:inbox -in:spam".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"messages": [{"id": "gm-1"}], "resultSizeEstimate": 1}"#)
        .create();

    server
        .mock("GET", "/users/me/messages/gm-1")
        .match_query(Matcher::UrlEncoded("format".into(), "full".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "gm-1",
                "payload": {
                    "headers": [
                        {"name": "Subject", "value": "Re: Invoice INV-77"},
                        {"name": "From", "value": "billing@example.com"},
                        {"name": "Date", "value": "Mon, 6 Jan 2025 10:00:00 +0000"}
                    ],
                    "parts": [
                        {"partId": "1", "mimeType": "text/plain", "filename": ""},
                        {"partId": "2", "filename": "report.pdf",
                         "body": {"attachmentId": "att-1", "size": 4}},
                        {"partId": "3", "filename": "tool.exe",
                         "body": {"data": "TVo"}}
                    ]
                }
            }"#,
        )
        .create();

    server
        .mock("GET", "/users/me/messages/gm-1")
        .match_query(Matcher::UrlEncoded("format".into(), "raw".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "gm-1", "raw": "cmF3IG1lc3NhZ2U"}"#)
        .create();

    server
        .mock("GET", "/users/me/messages/gm-1/attachments/att-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"size": 4, "data": "JVBERg"}"#)
        .create();
}

/// Mirrors the fetch runner's normalization of one search hit.
fn normalize(client: &GmailClient, message_ref: &MessageRef) -> NormalizedMessage {
    let full = client.fetch_message(&message_ref.id).unwrap();
    let raw = client.fetch_raw(&message_ref.id).unwrap();

    let mut message = NormalizedMessage::new(&message_ref.id).with_raw_bytes(raw);
    message.subject = full.subject().map(ToString::to_string);
    message.from = full.from().map(ToString::to_string);
    message.date = full.date().map(ToString::to_string);
    for part in full.attachment_parts() {
        let bytes = client.fetch_attachment(&message_ref.id, part).unwrap();
        message = message.with_attachment(part.filename.clone(), bytes);
    }
    message
}

#[test]
fn hosted_run_materializes_then_skips_on_rerun() {
    let mut server = Server::new();
    mock_mailbox(&mut server);

    let out = tempfile::tempdir().unwrap();
    let group_dir = out.path().join("invoice");
    let ledger_path = out.path().join("processed_ledger.jsonl");

    let client = GmailClient::new("test-token").with_base_url(server.url());
    let query = scoped_query("invoice");
    let refs = client.search(&query, Some(10)).unwrap();
    assert_eq!(refs.len(), 1);

    let materializer = Materializer::new(
        Classifier::new(SubjectPattern::Invoice),
        MaterializeConfig::new(&group_dir),
    );
    let policy = AdmissionPolicy::default();

    // First run: fetch and materialize.
    let mut ledger = Ledger::load(&ledger_path).unwrap();
    let message = normalize(&client, &refs[0]);
    let outcome = materializer
        .process_hosted(&message, 1, &policy, &mut ledger)
        .unwrap();

    let Outcome::Processed { saved, blocked, dir, .. } = outcome else {
        panic!("expected Processed, got {outcome:?}");
    };
    assert_eq!(saved, 1);
    assert_eq!(blocked, 1); // the .exe

    assert_eq!(std::fs::read(dir.join("email.eml")).unwrap(), b"raw message");
    assert_eq!(
        std::fs::read(dir.join("attachments").join("report.pdf")).unwrap(),
        b"%PDF"
    );
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["gmail_id"], "gm-1");
    assert_eq!(manifest["from"], "billing@example.com");
    // The reply prefix is stripped in the recorded subject.
    assert_eq!(manifest["subject"], "Invoice INV-77");

    // Second run with a fresh ledger load: everything skips.
    let mut ledger = Ledger::load(&ledger_path).unwrap();
    let refs = client.search(&query, Some(10)).unwrap();
    let outcome = materializer
        .process_hosted(&normalize(&client, &refs[0]), 1, &policy, &mut ledger)
        .unwrap();
    assert_eq!(outcome, Outcome::Skipped);
}
