//! Integration property tests for marketplace-policy.
//!
//! These tests check cross-module invariants through the public API using
//! property-based testing.

use chrono::{Duration, TimeZone, Utc};
use marketplace_policy::{
    sanitize, validate_admin_access, validate_authentication, AccessGate, Admin, AuthContext,
    Environment, ErrorCode, FeatureFlag, FileDescriptor, FileUploadPolicy, FixedSubject,
    FlagRegistry, IdentityAssertion, ProposalFields, ProposalValidator, TokenClaims,
    MAX_UPLOAD_BYTES,
};
use proptest::prelude::*;

// Strategy: arbitrary auth context, possibly anonymous
fn arb_auth_context() -> impl Strategy<Value = AuthContext> {
    prop::option::of(
        (
            prop::string::string_regex("[a-zA-Z0-9_-]{1,28}").unwrap(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(uid, email_verified, admin)| {
                IdentityAssertion::new(
                    uid,
                    TokenClaims {
                        email: None,
                        email_verified,
                        admin,
                    },
                )
            }),
    )
    .prop_map(|assertion| AuthContext { assertion })
}

// Strategy: arbitrary upload metadata mixing allowed and disallowed values
fn arb_file() -> impl Strategy<Value = FileDescriptor> {
    (
        prop_oneof![
            Just("doc.pdf"),
            Just("notes.txt"),
            Just("run.exe"),
            Just("script.BAT"),
            Just("photo.jpeg"),
        ],
        0u64..(3 * MAX_UPLOAD_BYTES),
        prop_oneof![
            Just("application/pdf"),
            Just("text/plain"),
            Just("image/png"),
            Just("application/zip"),
            Just("text/html"),
        ],
    )
        .prop_map(|(name, size, mime)| FileDescriptor::new(name, size, mime))
}

proptest! {
    /// Property: the access gate agrees with the admin validator
    #[test]
    fn proptest_gate_matches_admin_validator(ctx in arb_auth_context()) {
        let gate = AccessGate::new(&ctx).require(Admin).check();
        let admin = validate_admin_access(&ctx);

        match gate {
            Ok(uid) => {
                prop_assert!(admin.is_admin());
                prop_assert_eq!(Some(uid), admin.uid());
            }
            Err(code) => prop_assert_eq!(Some(code), admin.error()),
        }
    }

    /// Property: authentication failures surface verbatim through admin checks
    #[test]
    fn proptest_admin_errors_extend_auth_errors(ctx in arb_auth_context()) {
        let auth = validate_authentication(&ctx);
        let admin = validate_admin_access(&ctx);

        if let Some(code) = auth.error() {
            prop_assert_eq!(admin.error(), Some(code));
        } else if !admin.is_admin() {
            prop_assert_eq!(admin.error(), Some(ErrorCode::InsufficientPermissions));
        }
    }

    /// Property: upload errors are exactly the failing rules, in order
    #[test]
    fn proptest_upload_errors_match_rules(file in arb_file()) {
        let result = FileUploadPolicy::default().validate(&file);

        let too_big = file.size > MAX_UPLOAD_BYTES;
        let bad_mime = !matches!(file.mime_type.as_str(), "application/pdf" | "text/plain" | "image/png");
        let bad_ext = {
            let name = file.name.to_lowercase();
            name.ends_with(".exe") || name.ends_with(".bat")
        };

        let mut expected = Vec::new();
        if too_big { expected.push(ErrorCode::FileSizeTooLarge); }
        if bad_mime { expected.push(ErrorCode::FileTypeNotAllowed); }
        if bad_ext { expected.push(ErrorCode::FileTypeNotAllowed); }

        prop_assert_eq!(result.is_valid(), expected.is_empty());
        prop_assert_eq!(result.into_errors(), expected);
    }

    /// Property: sanitized records keep their keys and non-string values
    #[test]
    fn proptest_sanitize_preserves_shape(
        text in ".{0,40}",
        number in any::<i64>(),
        flag in any::<bool>()
    ) {
        let payload = serde_json::json!({ "text": text, "number": number, "flag": flag });
        let record = payload.as_object().unwrap();

        let clean = sanitize(record);

        prop_assert_eq!(clean.len(), 3);
        prop_assert_eq!(&clean["number"], &record["number"]);
        prop_assert_eq!(&clean["flag"], &record["flag"]);
        prop_assert!(clean["text"].is_string());
    }

    /// Property: a valid proposal stays valid whatever positive budget and future deadline it has
    #[test]
    fn proptest_valid_proposals_pass(
        budget in 0.01f64..1_000_000.0,
        days_ahead in 1i64..3650,
        revision in any::<bool>()
    ) {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let fields = ProposalFields {
            title: "Brand kit".to_string(),
            description: "Logo, palette and typography".to_string(),
            deadline: Some(now + Duration::days(days_ahead)),
            service_type: if revision { "revision" } else { "realizacion" }.to_string(),
            suggested_budget: budget,
        };

        let result = ProposalValidator::<marketplace_policy::FixedClock>::validate_at(&fields, now);
        prop_assert!(result.is_valid());
    }

    /// Property: toggling a plain flag is immediately visible
    #[test]
    fn proptest_toggle_is_visible(
        key in prop::string::string_regex("[a-z][a-z0-9-]{0,15}").unwrap(),
        initial in any::<bool>(),
        subject in prop::string::string_regex("[a-z0-9-]{1,12}").unwrap()
    ) {
        let registry = FlagRegistry::new(Environment::Staging, vec![FeatureFlag::new(key.clone(), initial)])
            .unwrap()
            .with_subject_source(FixedSubject::new(subject));

        prop_assert_eq!(registry.is_enabled(&key), initial);
        registry.enable(&key);
        prop_assert!(registry.is_enabled(&key));
        registry.disable(&key);
        prop_assert!(!registry.is_enabled(&key));
    }
}
