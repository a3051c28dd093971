/// Integration tests for the intake validation pipeline.
/// Exercises the full authenticate -> parse -> normalize sequence the webhook
/// handler runs, without touching the database (nothing is written on any
/// rejection path, so the pipeline is testable up to the insert).
use axum::http::{HeaderMap, HeaderValue};
use select_therapy_api::config::Config;
use select_therapy_api::errors::AppError;
use select_therapy_api::intake::{authenticate, parse_intake_body, SECRET_HEADER};
use select_therapy_api::models::{LeadStatus, NewLead};

fn test_config(secret: Option<&str>) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 3000,
        webhook_secret: secret.map(str::to_string),
        staff_session_key: Some("staff_key".to_string()),
    }
}

fn headers_with_secret(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(SECRET_HEADER, HeaderValue::from_str(value).unwrap());
    headers
}

/// Mirrors the handler's processing order: secret first, then the body.
fn run_pipeline(config: &Config, headers: &HeaderMap, body: &str) -> Result<NewLead, AppError> {
    authenticate(config, headers)?;
    parse_intake_body(body)
}

#[test]
fn secret_check_precedes_body_parsing() {
    let config = test_config(Some("s3cret"));
    let headers = headers_with_secret("wrong-secret");

    // Invalid secret AND syntactically invalid body: the auth error wins
    let result = run_pipeline(&config, &headers, "{not json at all");
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[test]
fn unset_secret_fails_closed_as_config_error() {
    let config = test_config(None);
    let headers = headers_with_secret("anything");

    let result = run_pipeline(&config, &headers, r#"{"patient_name":"Jane"}"#);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn missing_header_is_an_auth_error() {
    let config = test_config(Some("s3cret"));
    let result = run_pipeline(&config, &HeaderMap::new(), "{}");
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[test]
fn secret_comparison_trims_both_sides() {
    let config = test_config(Some("  s3cret  "));
    let headers = headers_with_secret("s3cret");
    assert!(authenticate(&config, &headers).is_ok());

    let headers = headers_with_secret(" s3cret ");
    assert!(authenticate(&config, &headers).is_ok());
}

#[test]
fn empty_and_whitespace_bodies_are_a_distinct_rejection() {
    assert!(matches!(parse_intake_body(""), Err(AppError::EmptyBody)));
    assert!(matches!(
        parse_intake_body("   \n\t  "),
        Err(AppError::EmptyBody)
    ));
}

#[test]
fn malformed_json_reports_the_parser_message() {
    let result = parse_intake_body(r#"{"patient_name": "Jane""#);
    match result {
        Err(AppError::MalformedJson(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected MalformedJson, got {:?}", other),
    }
}

#[test]
fn non_object_bodies_are_wrong_shape() {
    for body in ["[1,2,3]", "\"lead\"", "42", "null", "true"] {
        let result = parse_intake_body(body);
        assert!(
            matches!(result, Err(AppError::WrongShape(_))),
            "body {:?} should be rejected as wrong shape",
            body
        );
    }
}

#[test]
fn first_missing_required_field_wins() {
    // Both required fields absent: patient_name is reported, not an aggregate
    let result = parse_intake_body("{}");
    assert!(matches!(result, Err(AppError::MissingField("patient_name"))));

    let result = parse_intake_body(r#"{"patient_name": "Jane Doe"}"#);
    assert!(matches!(result, Err(AppError::MissingField("phone_number"))));
}

#[test]
fn whitespace_only_required_fields_are_missing() {
    let result = parse_intake_body(r#"{"patient_name": "   ", "phone_number": "555-1234"}"#);
    assert!(matches!(result, Err(AppError::MissingField("patient_name"))));

    let result = parse_intake_body(r#"{"patient_name": "Jane Doe", "phone_number": "\t"}"#);
    assert!(matches!(result, Err(AppError::MissingField("phone_number"))));
}

#[test]
fn mistyped_required_fields_are_missing() {
    let result = parse_intake_body(r#"{"patient_name": 1234, "phone_number": "555-1234"}"#);
    assert!(matches!(result, Err(AppError::MissingField("patient_name"))));

    let result = parse_intake_body(r#"{"patient_name": "Jane Doe", "phone_number": null}"#);
    assert!(matches!(result, Err(AppError::MissingField("phone_number"))));
}

#[test]
fn minimal_payload_normalizes_with_defaults() {
    let lead =
        parse_intake_body(r#"{"patient_name": " Jane Doe ", "phone_number": " 555-1234 "}"#)
            .unwrap();

    assert_eq!(lead.patient_name, "Jane Doe");
    assert_eq!(lead.phone_number, "555-1234");
    assert_eq!(lead.status, LeadStatus::New);
    assert_eq!(lead.dob, None);
    assert_eq!(lead.pain_reason, None);
    assert_eq!(lead.insurance, None);
    assert_eq!(lead.location, None);
    assert_eq!(lead.scheduling_prefs, None);
    assert_eq!(lead.notes, None);
}

#[test]
fn full_payload_is_trimmed_and_coerced() {
    let lead = parse_intake_body(
        r#"{
            "patient_name": "Jane Doe",
            "phone_number": "555-1234",
            "dob": 19891230,
            "pain_reason": "  lower back  ",
            "insurance": "",
            "location": "   ",
            "scheduling_prefs": "mornings",
            "status": "Booked",
            "notes": null
        }"#,
    )
    .unwrap();

    assert_eq!(lead.dob, Some("19891230".to_string()));
    assert_eq!(lead.pain_reason, Some("lower back".to_string()));
    // Empty and whitespace-only optionals become null, never ""
    assert_eq!(lead.insurance, None);
    assert_eq!(lead.location, None);
    assert_eq!(lead.scheduling_prefs, Some("mornings".to_string()));
    assert_eq!(lead.status, LeadStatus::Booked);
    assert_eq!(lead.notes, None);
}

#[test]
fn status_outside_the_closed_set_is_rejected() {
    let result = parse_intake_body(
        r#"{"patient_name": "Jane Doe", "phone_number": "555-1234", "status": "Reopened"}"#,
    );
    assert!(matches!(
        result,
        Err(AppError::InvalidField { field: "status", .. })
    ));
}

#[test]
fn falsy_status_falls_back_to_new() {
    let lead = parse_intake_body(
        r#"{"patient_name": "Jane Doe", "phone_number": "555-1234", "status": ""}"#,
    )
    .unwrap();
    assert_eq!(lead.status, LeadStatus::New);

    let lead = parse_intake_body(
        r#"{"patient_name": "Jane Doe", "phone_number": "555-1234", "status": null}"#,
    )
    .unwrap();
    assert_eq!(lead.status, LeadStatus::New);
}
