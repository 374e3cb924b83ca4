use axum::Json;
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{Router, delete, post};
use axum_test::{TestServer, TestServerConfig};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use recordgate_store::{Client, ClientOptions, Error};

const SERVICE_KEY: &str = "service-role-key";

fn authorized(headers: &HeaderMap) -> bool {
  let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
  let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
  return apikey == Some(SERVICE_KEY) && bearer == Some(format!("Bearer {SERVICE_KEY}").as_str());
}

/// Minimal stand-in for PostgREST: a single `faqs` table holding the row "abc123".
fn fake_store() -> TestServer {
  let app = Router::new()
    .route(
      "/rest/v1/rpc/{name}",
      post(
        |Path(name): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
          if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "Invalid API key"})));
          }
          assert_eq!(body, json!({}));

          return match name.as_str() {
            "disable_rls" => (StatusCode::OK, Json(json!(null))),
            "slow" => {
              tokio::time::sleep(Duration::from_secs(5)).await;
              (StatusCode::OK, Json(json!(null)))
            }
            _ => (
              StatusCode::NOT_FOUND,
              Json(json!({
                "code": "PGRST202",
                "message": format!("Could not find the function public.{name} without parameters"),
              })),
            ),
          };
        },
      ),
    )
    .route(
      "/rest/v1/{table}",
      delete(
        |Path(table): Path<String>,
         headers: HeaderMap,
         Query(query): Query<HashMap<String, String>>| async move {
          if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "").into_response();
          }
          assert_eq!(
            headers.get("prefer").and_then(|v| v.to_str().ok()),
            Some("return=representation")
          );

          if table != "faqs" {
            return (
              StatusCode::NOT_FOUND,
              Json(json!({
                "code": "42P01",
                "message": format!("relation \"public.{table}\" does not exist"),
              })),
            )
              .into_response();
          }

          return match query.get("id").map(|s| s.as_str()) {
            Some("eq.abc123") => Json(json!([{"id": "abc123"}])).into_response(),
            Some("eq.locked") => (
              StatusCode::FORBIDDEN,
              Json(json!({
                "code": "42501",
                "message": "permission denied for table faqs",
              })),
            )
              .into_response(),
            Some("eq.garbage") => (StatusCode::BAD_GATEWAY, "<html>oops</html>").into_response(),
            _ => Json(json!([])).into_response(),
          };
        },
      ),
    );

  return TestServer::try_new_with_config(
    app,
    TestServerConfig {
      transport: Some(axum_test::Transport::HttpRandomPort),
      ..Default::default()
    },
  )
  .unwrap();
}

fn client(server: &TestServer, key: &str) -> Client {
  let site = server.server_url("/").unwrap();
  return Client::new(
    site.as_str(),
    key,
    ClientOptions {
      timeout: Some(Duration::from_millis(500)),
    },
  )
  .unwrap();
}

#[tokio::test]
async fn test_delete_matching_record() {
  let server = fake_store();
  let client = client(&server, SERVICE_KEY);

  let response = client
    .from("faqs")
    .delete()
    .eq("id", "abc123")
    .execute()
    .await
    .unwrap();

  assert!(response.is_ok());
  assert_eq!(response.status, StatusCode::OK);
  assert_eq!(response.data, vec![json!({"id": "abc123"})]);

  // Nothing matched, PostgREST reports success with no rows.
  let response = client
    .from("faqs")
    .delete()
    .eq("id", "missing-id")
    .execute()
    .await
    .unwrap();
  assert!(response.is_ok());
  assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_store_errors_are_returned_not_raised() {
  let server = fake_store();
  let client = client(&server, SERVICE_KEY);

  let response = client
    .from("faqs")
    .delete()
    .eq("id", "locked")
    .execute()
    .await
    .unwrap();
  assert_eq!(response.status, StatusCode::FORBIDDEN);
  let err = response.error.unwrap();
  assert_eq!(err.message, "permission denied for table faqs");
  assert_eq!(err.code.as_deref(), Some("42501"));

  let response = client
    .from("questions")
    .delete()
    .eq("id", "abc123")
    .execute()
    .await
    .unwrap();
  assert_eq!(
    response.error.unwrap().message,
    "relation \"public.questions\" does not exist"
  );

  // Bodies which aren't store errors fall back to the status.
  let response = client
    .from("faqs")
    .delete()
    .eq("id", "garbage")
    .execute()
    .await
    .unwrap();
  assert_eq!(
    response.error.unwrap().message,
    "HTTP status: 502 Bad Gateway"
  );
}

#[tokio::test]
async fn test_rpc() {
  let server = fake_store();
  let client = client(&server, SERVICE_KEY);

  let response = client.rpc::<()>("disable_rls", None).await.unwrap();
  assert!(response.is_ok());
  assert!(response.data.is_empty());

  let response = client.rpc::<()>("does_not_exist", None).await.unwrap();
  let err = response.error.unwrap();
  assert_eq!(err.code.as_deref(), Some("PGRST202"));
}

#[tokio::test]
async fn test_wrong_key_is_a_store_error() {
  let server = fake_store();
  let client = client(&server, "anon-key");

  let response = client.rpc::<()>("disable_rls", None).await.unwrap();
  assert_eq!(response.status, StatusCode::UNAUTHORIZED);
  assert_eq!(response.error.unwrap().message, "Invalid API key");
}

#[tokio::test]
async fn test_timeout() {
  let server = fake_store();
  let client = client(&server, SERVICE_KEY);

  let result = client.rpc::<()>("slow", None).await;
  assert!(matches!(result, Err(Error::Timeout)), "{result:?}");
}
