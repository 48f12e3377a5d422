use std::path::{Path, PathBuf};

use mockito::{Matcher, Server};
use tempfile::TempDir;

use ap_app::ViewScope;
use ap_cli::bootstrap::wire_portal;
use ap_cli::cli::{Command, LoginMethod, UploadArgs};
use ap_cli::commands::{dispatch, EXIT_NOT_REGISTERED, EXIT_SIGNED_OUT};
use ap_core::config::AppConfig;
use ap_core::ports::SessionStorePort;
use ap_core::session::TokenIssuer;
use ap_core::{BearerToken, SessionCredential};
use ap_infra::FileSessionStore;

fn config(server: &Server, tmp: &TempDir) -> AppConfig {
    let mut config = AppConfig::empty();
    config.api_base_url = server.url();
    config.authority_base_url = server.url();
    config.registration_url = "https://moodi.org/".to_string();
    config.http_timeout_secs = 5;
    config.max_photo_bytes = 1024 * 1024;
    config.auto_generate_pass = true;
    config.settle_delay_ms = 1;
    config.canonical_width = 200;
    config.resource_timeout_ms = 1_000;
    config.session_path = session_path(tmp);
    config
}

fn session_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("session.json")
}

async fn seed_session(path: &Path) {
    let credential =
        SessionCredential::new("a@b.com", BearerToken::new("jwt"), TokenIssuer::Backend);
    FileSessionStore::new(path).save(&credential).await.unwrap();
}

async fn stored(path: &Path) -> Option<SessionCredential> {
    FileSessionStore::new(path).load().await.unwrap()
}

#[tokio::test]
async fn federated_login_then_logout() {
    let mut server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();
    server
        .mock("POST", "/api/miauth/verify")
        .with_status(200)
        .with_body(r#"{"token":"authority-token"}"#)
        .create_async()
        .await;
    let check = server
        .mock("POST", "/api/accommodation/check")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"token":"jwt","name":"Asha","miNo":"MI-1","imageUploaded":false}"#)
        .create_async()
        .await;
    let portal = wire_portal(config(&server, &tmp)).await.unwrap();

    dispatch(
        &portal,
        Command::Login {
            method: LoginMethod::Google {
                email: "a@b.com".into(),
                id_token: "id-token".into(),
            },
        },
        &ViewScope::new(),
    )
    .await
    .unwrap();

    check.assert_async().await;
    let credential = stored(&session_path(&tmp)).await.unwrap();
    assert_eq!(credential.bearer_token, BearerToken::new("jwt"));
    assert_eq!(credential.mi_no, "MI-1");

    dispatch(&portal, Command::Logout, &ViewScope::new())
        .await
        .unwrap();

    assert!(stored(&session_path(&tmp)).await.is_none());
}

#[tokio::test]
async fn unregistered_login_exits_with_not_registered() {
    let mut server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();
    server
        .mock("POST", "/api/miauth/verify")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let check = server
        .mock("POST", "/api/accommodation/check")
        .expect(0)
        .create_async()
        .await;
    let portal = wire_portal(config(&server, &tmp)).await.unwrap();

    let err = dispatch(
        &portal,
        Command::Login {
            method: LoginMethod::Google {
                email: "a@b.com".into(),
                id_token: "id-token".into(),
            },
        },
        &ViewScope::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), EXIT_NOT_REGISTERED);
    check.assert_async().await;
    assert!(stored(&session_path(&tmp)).await.is_none());
}

#[tokio::test]
async fn status_without_session_is_signed_out() {
    let server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();
    let portal = wire_portal(config(&server, &tmp)).await.unwrap();

    let err = dispatch(&portal, Command::Status, &ViewScope::new())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), EXIT_SIGNED_OUT);
}

#[tokio::test]
async fn upload_falls_back_to_file_when_camera_is_unavailable() {
    let mut server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();
    seed_session(&session_path(&tmp)).await;
    server
        .mock("POST", "/api/accommodation/check")
        .match_header("authorization", "Bearer jwt")
        .with_status(200)
        .with_body(r#"{"imageUploaded":false}"#)
        .create_async()
        .await;
    let upload = server
        .mock("POST", "/api/accommodation/upload-image")
        .match_header("authorization", "Bearer jwt")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;
    let photo = tmp.path().join("me.png");
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.extend_from_slice(&[0; 64]);
    std::fs::write(&photo, png).unwrap();
    let portal = wire_portal(config(&server, &tmp)).await.unwrap();

    dispatch(
        &portal,
        Command::Upload(UploadArgs {
            photo: Some(photo),
            camera: true,
            id_type: String::new(),
            id_number: String::new(),
        }),
        &ViewScope::new(),
    )
    .await
    .unwrap();

    upload.assert_async().await;
}

#[tokio::test]
async fn pass_is_generated_and_stored() {
    let mut server = Server::new_async().await;
    let tmp = TempDir::new().unwrap();
    seed_session(&session_path(&tmp)).await;
    server
        .mock("GET", "/api/accommodation/get")
        .match_query(Matcher::UrlEncoded("email".into(), "a@b.com".into()))
        .with_status(200)
        .with_body(r#"{"name":"Asha","miNo":"MI-1","email":"a@b.com","imageUploaded":true}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/accommodation/get-image")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    let save = server
        .mock("POST", "/api/accommodation/save-pass")
        .match_header("authorization", "Bearer jwt")
        .with_status(200)
        .with_body(r#"{"ok":true,"url":"pass-a@b.com.png"}"#)
        .create_async()
        .await;
    let portal = wire_portal(config(&server, &tmp)).await.unwrap();

    dispatch(&portal, Command::Pass { now: true }, &ViewScope::new())
        .await
        .unwrap();

    save.assert_async().await;
}
