use super::*;

// =============================================================================
// parse_bearer
// =============================================================================

#[test]
fn parse_bearer_extracts_token() {
    assert_eq!(parse_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
}

#[test]
fn parse_bearer_scheme_is_case_insensitive() {
    assert_eq!(parse_bearer("bearer tok"), Ok("tok"));
    assert_eq!(parse_bearer("BEARER tok"), Ok("tok"));
}

#[test]
fn parse_bearer_without_token_is_malformed() {
    assert_eq!(parse_bearer("Bearer"), Err(CredentialError::Malformed));
}

#[test]
fn parse_bearer_with_empty_token_is_malformed() {
    assert_eq!(parse_bearer("Bearer "), Err(CredentialError::Malformed));
}

#[test]
fn parse_bearer_with_double_space_is_malformed() {
    assert_eq!(parse_bearer("Bearer  tok"), Err(CredentialError::Malformed));
}

#[test]
fn parse_bearer_with_extra_segment_is_malformed() {
    assert_eq!(parse_bearer("Bearer tok extra"), Err(CredentialError::Malformed));
}

#[test]
fn parse_bearer_empty_value_is_malformed() {
    assert_eq!(parse_bearer(""), Err(CredentialError::Malformed));
}

#[test]
fn parse_bearer_rejects_other_schemes() {
    assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), Err(CredentialError::UnsupportedScheme));
}

#[test]
fn bearer_header_is_accepted_by_parse_bearer() {
    let header = bearer_header("tok-123");
    assert_eq!(header, "Bearer tok-123");
    assert_eq!(parse_bearer(&header), Ok("tok-123"));
}

// =============================================================================
// wire shapes
// =============================================================================

#[test]
fn verify_request_reads_camel_case_id_token() {
    let req: VerifyRequest = serde_json::from_str(r#"{"idToken":"t-1"}"#).expect("parse");
    assert_eq!(req.id_token, "t-1");
}

#[test]
fn verify_request_missing_token_defaults_to_empty() {
    let req: VerifyRequest = serde_json::from_str("{}").expect("parse");
    assert!(req.id_token.is_empty());
}

#[test]
fn verify_response_valid_uses_provider_field_names() {
    let body = VerifyResponse::valid(&Identity::new("u1", "a@b.com"));
    let json = serde_json::to_value(&body).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "success": true,
            "data": { "user": { "uid": "u1", "email": "a@b.com" } },
            "message": "Token is valid"
        })
    );
}

#[test]
fn user_profile_serializes_nested_stats() {
    let profile = UserProfile {
        name: "N".into(),
        email: "e@x.com".into(),
        avatar: "https://example.com/a.png".into(),
        stats: ProfileStats { posts: 1, followers: 2, following: 3 },
    };
    let json = serde_json::to_value(&profile).expect("serialize");
    assert_eq!(json["stats"]["followers"], 2);
    assert_eq!(json["avatar"], "https://example.com/a.png");
}
