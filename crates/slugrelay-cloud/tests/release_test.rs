use std::path::Path;

use async_trait::async_trait;
use mockall::{Sequence, mock};
use serde_json::{Map, Value, json};
use slugrelay_cloud::{
    ApiError, PendingRelease, PlatformApi, Release, ReleaseOptions, ReleaseSlug, release,
};

mock! {
    Api {}

    #[async_trait]
    impl PlatformApi for Api {
        async fn create_pending_release(&self, app: &str) -> Result<PendingRelease, ApiError>;
        async fn upload_slug(&self, upload_url: &str, slug: &Path) -> Result<(), ApiError>;
        async fn finalize_release(
            &self,
            app: &str,
            payload: &Map<String, Value>,
        ) -> Result<Value, ApiError>;
        async fn current_user_email(&self) -> Result<String, ApiError>;
        async fn list_releases(&self, app: &str) -> Result<Vec<Release>, ApiError>;
        async fn get_release_slug(&self, app: &str) -> Result<ReleaseSlug, ApiError>;
    }
}

fn pending() -> PendingRelease {
    serde_json::from_value(json!({
        "slug_put_url": "https://s3.example.com/put?sig=1",
        "slug_url": "https://s3.example.com/get"
    }))
    .unwrap()
}

#[tokio::test]
async fn release_runs_steps_in_order() {
    let mut mock = MockApi::new();
    let mut seq = Sequence::new();

    mock.expect_create_pending_release()
        .withf(|app| app == "myapp")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(pending()));
    mock.expect_upload_slug()
        .withf(|url, slug| {
            url == "https://s3.example.com/put?sig=1" && slug == Path::new("/tmp/work/build")
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    mock.expect_current_user_email()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok("dev@example.com".to_owned()));
    mock.expect_finalize_release()
        .withf(|app, payload| {
            app == "myapp"
                && payload["user"] == json!("dev@example.com")
                && payload["release_descr"] == json!("Deploy it")
                && payload["head"] == json!("abc123")
                && payload["slug_version"] == json!(2)
                && payload["run_deploy_hooks"] == json!(true)
                && payload["process_types"] == json!({"web": "./server"})
                && payload["slug_url"] == json!("https://s3.example.com/get")
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(json!({"release": {"name": "v12", "commit": "abc123"}})));

    let options = ReleaseOptions {
        process_types: Some([("web", "./server")].into_iter().collect()),
    };
    let descriptor = release(
        &mock,
        "myapp",
        Path::new("/tmp/work/build"),
        "Deploy it",
        "abc123",
        &options,
    )
    .await
    .unwrap();

    assert_eq!(descriptor, json!({"name": "v12", "commit": "abc123"}));
}

#[tokio::test]
async fn response_without_release_member_is_null() {
    let mut mock = MockApi::new();
    mock.expect_create_pending_release()
        .returning(|_| Ok(pending()));
    mock.expect_upload_slug().returning(|_, _| Ok(()));
    mock.expect_current_user_email()
        .returning(|| Ok("dev@example.com".to_owned()));
    mock.expect_finalize_release()
        .returning(|_, _| Ok(json!({"status": "ok"})));

    let descriptor = release(
        &mock,
        "myapp",
        Path::new("/tmp/build"),
        "d",
        "h",
        &ReleaseOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(descriptor, Value::Null);
}

// ── Error cases ──

#[tokio::test]
async fn missing_upload_url_stops_before_upload() {
    let mut mock = MockApi::new();
    mock.expect_create_pending_release()
        .returning(|_| Ok(PendingRelease::default()));
    mock.expect_upload_slug().never();
    mock.expect_finalize_release().never();

    let result = release(
        &mock,
        "myapp",
        Path::new("/tmp/build"),
        "d",
        "h",
        &ReleaseOptions::default(),
    )
    .await;

    assert!(matches!(result, Err(ApiError::MissingField("slug_put_url"))));
}

#[tokio::test]
async fn unprocessable_finalize_propagates() {
    let mut mock = MockApi::new();
    mock.expect_create_pending_release()
        .returning(|_| Ok(pending()));
    mock.expect_upload_slug().returning(|_, _| Ok(()));
    mock.expect_current_user_email()
        .returning(|| Ok("dev@example.com".to_owned()));
    mock.expect_finalize_release().returning(|app, _| {
        Err(ApiError::UnprocessableEntity {
            path: format!("/apps/{app}/releases"),
            body: "not a collaborator".to_owned(),
        })
    });

    let err = release(
        &mock,
        "target",
        Path::new("/tmp/build"),
        "d",
        "h",
        &ReleaseOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(err.is_unprocessable());
}

#[tokio::test]
async fn upload_failure_skips_finalize() {
    let mut mock = MockApi::new();
    mock.expect_create_pending_release()
        .returning(|_| Ok(pending()));
    mock.expect_upload_slug().returning(|_, _| {
        Err(ApiError::Status {
            path: "https://s3.example.com/put".to_owned(),
            status: reqwest::StatusCode::FORBIDDEN,
            body: "SignatureDoesNotMatch".to_owned(),
        })
    });
    mock.expect_current_user_email().never();
    mock.expect_finalize_release().never();

    let result = release(
        &mock,
        "myapp",
        Path::new("/tmp/build"),
        "d",
        "h",
        &ReleaseOptions::default(),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Status { .. })));
}
