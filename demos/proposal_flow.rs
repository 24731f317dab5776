//! End-to-end proposal submission.
//!
//! This example walks one request through the policy core:
//! 1. Check the caller with an `AccessGate`
//! 2. Mark the form payload as `Tainted` and sanitize it
//! 3. Validate the cleaned fields and an attachment
//! 4. Gate an optional feature on the caller's rollout bucket
//!
//! Run with: `cargo run --example proposal_flow`

use marketplace_policy::{
    rollout_bucket, AccessGate, Authenticated, AuthContext, Environment, FileDescriptor,
    FileUploadPolicy, FlagRegistry, IdentityAssertion, MarkupSanitizer, ProposalFields,
    ProposalValidator, Sanitizer, SystemClock, Tainted, TokenClaims,
};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Proposal Submission Flow ===\n");

    // Step 1: who is calling
    let ctx = AuthContext::authenticated(IdentityAssertion::new(
        "user-2",
        TokenClaims::verified("ana@example.com"),
    ));
    let uid = match AccessGate::new(&ctx).require(Authenticated).check() {
        Ok(uid) => uid,
        Err(code) => {
            eprintln!("Request refused: {code}");
            return;
        }
    };
    println!("Caller: {uid}");

    // Step 2: clean the raw form payload
    let raw = json!({
        "titulo": "<b>Logo</b> for a bakery<script>fetch('//evil')</script>",
        "descripcion": "Vector logo <img src=x onerror=alert(1)> in two colours",
        "fechaLimite": "2099-03-01",
        "tipoServicio": "realizacion",
        "presupuestoSugerido": 250
    });
    let Some(record) = raw.as_object() else {
        eprintln!("Payload is not an object");
        return;
    };
    let verified = MarkupSanitizer::new().sanitize(Tainted::new(record.clone()));
    println!("Sanitized payload: {}", serde_json::Value::Object(verified.as_ref().clone()));

    // Step 3: business rules
    let fields: ProposalFields =
        match serde_json::from_value(serde_json::Value::Object(verified.into_inner())) {
            Ok(fields) => fields,
            Err(e) => {
                eprintln!("Payload shape error: {e}");
                return;
            }
        };
    let result = ProposalValidator::new(SystemClock).validate(&fields);
    println!("Proposal valid: {} {:?}", result.is_valid(), result.errors());

    let attachment = FileDescriptor::new("brief.pdf", 300 * 1024, "application/pdf");
    let upload = FileUploadPolicy::default().validate(&attachment);
    println!("Attachment valid: {} {:?}", upload.is_valid(), upload.errors());

    // Step 4: feature gating for this caller
    let owned_uid = uid.to_string();
    let flags = match FlagRegistry::with_defaults(Environment::Production) {
        Ok(flags) => flags.with_subject_source(move || Some(owned_uid.clone())),
        Err(e) => {
            eprintln!("Flag configuration error: {e}");
            return;
        }
    };
    println!(
        "instant-quotes for {uid} (bucket {}): {}",
        rollout_bucket(uid),
        flags.is_enabled("instant-quotes")
    );
    println!("debug-panel in production: {}", flags.is_enabled("debug-panel"));
}
