use std::time::Duration;

use mockito::Matcher;

use ap_core::identity::SecretToken;
use ap_core::ports::{ApiError, VerificationAuthorityPort};
use ap_infra::ReqwestVerificationAuthority;

const REGISTRATION: &str = "https://moodi.org/";

fn authority(url: &str) -> ReqwestVerificationAuthority {
    ReqwestVerificationAuthority::new(url, REGISTRATION, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn verify_returns_authority_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/miauth/verify")
        .match_body(Matcher::Json(serde_json::json!({ "token": "id-token" })))
        .with_status(200)
        .with_body(r#"{"token":"auth-token"}"#)
        .create_async()
        .await;

    let verdict = authority(&server.url())
        .verify(&SecretToken::new("id-token"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(verdict.token.as_deref(), Some("auth-token"));
}

#[tokio::test]
async fn verify_without_token_means_not_registered() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/verify")
        .with_status(404)
        .with_body(r#"{"error":"not registered"}"#)
        .create_async()
        .await;

    let authority = authority(&server.url());
    let verdict = authority.verify(&SecretToken::new("id")).await.unwrap();

    assert!(verdict.token.is_none());
    assert_eq!(authority.registration_url(), REGISTRATION);
}

#[tokio::test]
async fn verify_blank_token_means_not_registered() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/verify")
        .with_status(200)
        .with_body(r#"{"token":"  "}"#)
        .create_async()
        .await;

    let verdict = authority(&server.url())
        .verify(&SecretToken::new("id"))
        .await
        .unwrap();

    assert!(verdict.token.is_none());
}

#[tokio::test]
async fn verify_outage_is_a_network_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/verify")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let err = authority(&server.url())
        .verify(&SecretToken::new("id"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn send_otp_posts_email_and_captcha() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/miauth/send-otp")
        .match_body(Matcher::Json(serde_json::json!({
            "email": "a@b.com",
            "captchaToken": "captcha",
        })))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    authority(&server.url())
        .send_otp("a@b.com", &SecretToken::new("captcha"))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn send_otp_failure_carries_authority_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/send-otp")
        .with_status(403)
        .with_body(r#"{"error":"Captcha verification failed"}"#)
        .create_async()
        .await;

    let err = authority(&server.url())
        .send_otp("a@b.com", &SecretToken::new("captcha"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Rejected {
            status: 403,
            message: "Captcha verification failed".to_string(),
        }
    );
}

#[tokio::test]
async fn send_otp_failure_without_body_uses_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/send-otp")
        .with_status(429)
        .create_async()
        .await;

    let err = authority(&server.url())
        .send_otp("a@b.com", &SecretToken::new("captcha"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Rejected { status: 429, ref message } if message == "Failed to send OTP"));
}

#[tokio::test]
async fn verify_otp_returns_profile_hints() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/miauth/verify-otp")
        .match_body(Matcher::Json(serde_json::json!({ "email": "a@b.com", "otp": "123456" })))
        .with_status(200)
        .with_body(
            r#"{"verified":true,"token":"t","name":"Asha","miNo":"MI-1","college":"IIT","gender":"F","phone":"99"}"#,
        )
        .create_async()
        .await;

    let verification = authority(&server.url())
        .verify_otp("a@b.com", &SecretToken::new("123456"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(verification.verified);
    assert_eq!(verification.token.as_deref(), Some("t"));
    assert_eq!(verification.mi_no, "MI-1");
    assert_eq!(verification.college, "IIT");
    assert_eq!(verification.email, None);
}

#[tokio::test]
async fn verify_otp_keeps_the_echoed_email() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/verify-otp")
        .with_status(200)
        .with_body(r#"{"verified":true,"token":"t","email":"asha@b.com","name":null}"#)
        .create_async()
        .await;

    let verification = authority(&server.url())
        .verify_otp("Asha@B.com", &SecretToken::new("123456"))
        .await
        .unwrap();

    assert_eq!(verification.email.as_deref(), Some("asha@b.com"));
    assert!(verification.name.is_empty());
}

#[tokio::test]
async fn verify_otp_failure_status_is_unverified() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/miauth/verify-otp")
        .with_status(400)
        .with_body(r#"{"verified":true,"error":"Invalid OTP"}"#)
        .create_async()
        .await;

    let verification = authority(&server.url())
        .verify_otp("a@b.com", &SecretToken::new("000000"))
        .await
        .unwrap();

    assert!(!verification.verified);
}
