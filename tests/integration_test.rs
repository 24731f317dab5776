use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use marketplace_policy::{
    sanitize, validate_admin_access, validate_authentication, AccessGate, Admin, AuthContext,
    Authenticated, Environment, ErrorCode, FeatureFlag, FileDescriptor, FileUploadPolicy,
    FixedClock, FlagRegistry, IdentityAssertion, MarkupSanitizer, ProposalFields,
    ProposalValidator, Sanitizer, Tainted, TokenClaims,
};
use serde_json::json;

fn user(uid: &str, email_verified: bool, admin: bool) -> AuthContext {
    AuthContext::authenticated(IdentityAssertion::new(
        uid,
        TokenClaims {
            email: Some(format!("{uid}@example.com")),
            email_verified,
            admin,
        },
    ))
}

#[test]
fn proposal_form_is_sanitized_then_validated() {
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap();
    let payload = json!({
        "titulo": "<b>Logo</b> <script>alert('x')</script>",
        "descripcion": "  Vector logo, onclick=steal() three colours  ",
        "fechaLimite": "2025-02-20T00:00:00Z",
        "tipoServicio": "realizacion",
        "presupuestoSugerido": 300
    });

    let clean = sanitize(payload.as_object().unwrap());
    assert_eq!(clean["titulo"], "Logo");
    assert_eq!(clean["descripcion"], "Vector logo, steal() three colours");

    let fields: ProposalFields =
        serde_json::from_value(serde_json::Value::Object(clean)).expect("payload shape");
    let result = ProposalValidator::new(FixedClock::new(now)).validate(&fields);

    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors());
}

#[test]
fn script_only_title_fails_after_sanitization() {
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap();
    let raw = json!({
        "titulo": "<script>document.cookie</script>",
        "descripcion": "<p></p>",
        "tipoServicio": "revision",
        "presupuestoSugerido": -5
    });

    let verified = MarkupSanitizer::new().sanitize(Tainted::new(raw.as_object().unwrap().clone()));
    let fields: ProposalFields =
        serde_json::from_value(serde_json::Value::Object(verified.into_inner())).unwrap();
    let result = ProposalValidator::new(FixedClock::new(now)).validate(&fields);

    assert_eq!(
        result.errors(),
        &[
            ErrorCode::TituloTooShort,
            ErrorCode::DescripcionEmpty,
            ErrorCode::FechaLimitePast,
            ErrorCode::PresupuestoNegative,
        ]
    );
}

#[test]
fn deadline_check_uses_injected_clock() {
    let deadline = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let fields = ProposalFields {
        title: "Translation".to_string(),
        description: "Spanish to English".to_string(),
        deadline: Some(deadline),
        service_type: "revision".to_string(),
        suggested_budget: 90.0,
    };

    let before = ProposalValidator::new(FixedClock::new(deadline - Duration::hours(1)));
    let after = ProposalValidator::new(FixedClock::new(deadline + Duration::hours(1)));

    assert!(before.validate(&fields).is_valid());
    assert_eq!(after.validate(&fields).errors(), &[ErrorCode::FechaLimitePast]);
}

#[test]
fn upload_policy_examples() {
    let policy = FileUploadPolicy::default();

    let big_pdf = FileDescriptor::new("contract.pdf", 15 * 1024 * 1024, "application/pdf");
    assert_eq!(policy.validate(&big_pdf).errors(), &[ErrorCode::FileSizeTooLarge]);

    let disguised = FileDescriptor::new("malware.exe", 1024, "application/pdf");
    assert_eq!(policy.validate(&disguised).errors(), &[ErrorCode::FileTypeNotAllowed]);

    let photo = FileDescriptor::new("portfolio.PNG", 2 * 1024 * 1024, "image/png");
    assert!(policy.validate(&photo).is_valid());
}

#[test]
fn authentication_decision_table() {
    assert_eq!(
        validate_authentication(&AuthContext::anonymous()).error(),
        Some(ErrorCode::Unauthenticated)
    );
    assert_eq!(
        validate_authentication(&user("u-1", false, false)).error(),
        Some(ErrorCode::EmailNotVerified)
    );

    let ok = validate_authentication(&user("u-1", true, false));
    assert!(ok.is_valid());
    assert_eq!(ok.uid(), Some("u-1"));
}

#[test]
fn admin_panel_is_gated() {
    let regular = user("client-1", true, false);
    let admin = user("ops-1", true, true);
    let unverified_admin = user("ops-2", false, true);

    assert_eq!(
        AccessGate::new(&regular).require(Authenticated).require(Admin).check(),
        Err(ErrorCode::InsufficientPermissions)
    );
    assert_eq!(
        AccessGate::new(&admin).require(Authenticated).require(Admin).check(),
        Ok("ops-1")
    );
    assert_eq!(
        validate_admin_access(&unverified_admin).error(),
        Some(ErrorCode::EmailNotVerified)
    );
}

#[test]
fn flags_follow_logged_in_subject() {
    let session_uid = Arc::new(std::sync::RwLock::new(None::<String>));
    let source = Arc::clone(&session_uid);

    let registry = FlagRegistry::new(
        Environment::Production,
        vec![
            FeatureFlag::new("instant-quotes", true).with_rollout(25),
            FeatureFlag::new("chat", false),
        ],
    )
    .unwrap()
    .with_subject_source(move || source.read().ok().and_then(|uid| (*uid).clone()));

    // "anonymous" lands in bucket 75
    assert!(!registry.is_enabled("instant-quotes"));

    // "user-2" lands in bucket 24
    *session_uid.write().unwrap() = Some("user-2".to_string());
    assert!(registry.is_enabled("instant-quotes"));
    assert_eq!(registry.is_enabled("instant-quotes"), registry.is_enabled("instant-quotes"));

    registry.enable("chat");
    let enabled: Vec<_> = registry.enabled_flags().into_iter().map(|f| f.key).collect();
    assert_eq!(enabled, ["chat", "instant-quotes"]);

    registry.disable("chat");
    assert!(!registry.is_enabled("chat"));
}

#[test]
fn sanitizer_leaves_clean_text_alone() {
    let payload = json!({ "titulo": "Website audit", "descripcion": "Check the checkout flow" });

    let clean = sanitize(payload.as_object().unwrap());

    assert_eq!(serde_json::Value::Object(clean), payload);
}

#[test]
fn form_deadline_values_never_break_deserialization() {
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap();
    let validator = ProposalValidator::new(FixedClock::new(now));

    for (deadline, expect_valid) in [
        (json!("2025-02-20"), true),
        (json!(""), false),
        (json!("not a date"), false),
    ] {
        let payload = json!({
            "titulo": "Logo design",
            "descripcion": "Vector logo for a bakery",
            "fechaLimite": deadline,
            "tipoServicio": "realizacion",
            "presupuestoSugerido": 150
        });

        let clean = sanitize(payload.as_object().unwrap());
        let fields: ProposalFields = serde_json::from_value(serde_json::Value::Object(clean))
            .expect("deadline value does not fail deserialization");
        let result = validator.validate(&fields);

        if expect_valid {
            assert!(result.is_valid(), "{deadline}: {:?}", result.errors());
        } else {
            assert_eq!(result.errors(), &[ErrorCode::FechaLimitePast], "{deadline}");
        }
    }
}
