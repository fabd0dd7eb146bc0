use super::*;
use identity::{Identity, ProfileStats};

fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn signed_in_session() -> Session {
    Session { token: Some("tok".into()), identity: Some(Identity::new("u1", "a@b.com")) }
}

#[test]
fn ok_body_decodes_profile() {
    let body = r#"{"name":"Ann","email":"a@b.com","avatar":"https://x/a.png","stats":{"posts":1,"followers":2,"following":3}}"#;
    let profile: UserProfile = interpret(StatusCode::OK, body).unwrap();
    assert_eq!(profile.name, "Ann");
    assert_eq!(profile.stats, ProfileStats { posts: 1, followers: 2, following: 3 });
}

#[test]
fn unauthorized_status_maps_to_unauthorized() {
    let result = interpret::<UserProfile>(StatusCode::UNAUTHORIZED, r#"{"error":"unauthorized"}"#);
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[test]
fn not_found_status_maps_to_not_found() {
    let result = interpret::<UserProfile>(StatusCode::NOT_FOUND, r#"{"error":"profile not found"}"#);
    assert!(matches!(result, Err(ApiError::NotFound)));
}

#[test]
fn other_status_carries_error_envelope() {
    let result = interpret::<UserProfile>(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"internal error"}"#);
    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn garbage_ok_body_is_decode_error() {
    assert!(matches!(interpret::<UserProfile>(StatusCode::OK, "<html>"), Err(ApiError::Decode(_))));
}

#[test]
fn user_messages_never_leak_details() {
    let err = ApiError::Status { status: 502, body: "upstream stack trace".into() };
    assert!(!err.user_message().contains("stack"));
    assert_eq!(ApiError::Unauthorized.user_message(), ApiError::NotSignedIn.user_message());
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let api = ApiClient::with_base_url("http://localhost:3000/", Duration::from_secs(1)).unwrap();
    assert_eq!(api.base_url(), "http://localhost:3000");
}

#[tokio::test]
async fn fetch_profile_without_token_sends_nothing() {
    let api = ApiClient::with_base_url(&dead_base_url(), Duration::from_secs(1)).unwrap();
    let result = api.fetch_profile(&Session::default()).await;
    assert!(matches!(result, Err(ApiError::NotSignedIn)));
}

#[tokio::test]
async fn fetch_profile_against_dead_server_is_request_error() {
    let api = ApiClient::with_base_url(&dead_base_url(), Duration::from_secs(1)).unwrap();
    let result = api.fetch_profile(&signed_in_session()).await;
    assert!(matches!(result, Err(ApiError::Request(_))));
}
