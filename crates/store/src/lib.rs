//! A client library to talk to a hosted, PostgREST-compatible record store via HTTP.
//!
//! Only the small surface needed by recordgate is covered: remote procedure calls and filtered
//! deletes, authenticated with a privileged service-role key.

#![forbid(unsafe_code, clippy::unwrap_used)]
#![allow(clippy::needless_return)]
#![warn(clippy::await_holding_lock, clippy::inefficient_to_string)]

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::*;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  #[error("InvalidUrl: {0}")]
  InvalidUrl(url::ParseError),

  #[error("InvalidHeader: {0}")]
  InvalidHeader(header::InvalidHeaderValue),

  #[error("MissingFilter")]
  MissingFilter,

  #[error("Serialization: {0}")]
  Serialization(serde_json::Error),

  #[error("Timeout")]
  Timeout,

  // NOTE: This error is leaky but comprehensively unpacking reqwest is unsustainable.
  #[error("Reqwest: {0}")]
  OtherReqwest(reqwest::Error),
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      return Self::Timeout;
    }
    return Self::OtherReqwest(err);
  }
}

/// Error reported by the store itself, i.e. the JSON error body of a non-2xx response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoreError {
  #[serde(alias = "msg")]
  pub message: String,
  #[serde(default)]
  pub code: Option<String>,
  #[serde(default)]
  pub details: Option<String>,
  #[serde(default)]
  pub hint: Option<String>,
}

impl std::fmt::Display for StoreError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self.code {
      Some(ref code) => write!(f, "{} ({code})", self.message),
      None => f.write_str(&self.message),
    };
  }
}

/// Outcome of a request the store answered.
///
/// Transport failures never produce a `StoreResponse`, they're reported as [Error].
#[derive(Clone, Debug, PartialEq)]
pub struct StoreResponse {
  pub status: StatusCode,
  pub data: Vec<serde_json::Value>,
  pub error: Option<StoreError>,
}

impl StoreResponse {
  pub fn is_ok(&self) -> bool {
    return self.error.is_none();
  }
}

#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
  /// Upper bound for every request including connect and body transfer.
  pub timeout: Option<Duration>,
}

struct ThinClient {
  client: reqwest::Client,
  url: url::Url,
  headers: HeaderMap,
}

impl ThinClient {
  async fn fetch<T: Serialize>(
    &self,
    path: &str,
    extra_headers: Option<HeaderMap>,
    method: Method,
    body: Option<&T>,
    query_params: Option<&[(Cow<'_, str>, Cow<'_, str>)]>,
  ) -> Result<reqwest::Response, Error> {
    assert!(path.starts_with("/"));

    let mut url = self.url.clone();
    url.set_path(path);

    if let Some(query_params) = query_params {
      let mut params = url.query_pairs_mut();
      for (key, value) in query_params {
        params.append_pair(key, value);
      }
    }

    let request = {
      let mut headers = self.headers.clone();
      if let Some(extra_headers) = extra_headers {
        headers.extend(extra_headers);
      }

      let mut builder = self.client.request(method, url).headers(headers);
      if let Some(body) = body {
        let json = serde_json::to_string(body).map_err(Error::Serialization)?;
        builder = builder.body(json);
      }
      builder.build()?
    };

    return Ok(self.client.execute(request).await?);
  }
}

struct ClientState {
  client: ThinClient,
  site: String,
}

#[derive(Clone)]
pub struct Client {
  state: Arc<ClientState>,
}

impl Client {
  /// Builds a client authenticating every request with the given service-role `key`.
  pub fn new(site: &str, key: &str, options: ClientOptions) -> Result<Client, Error> {
    let url = url::Url::parse(site).map_err(Error::InvalidUrl)?;

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = options.timeout {
      builder = builder.timeout(timeout);
    }

    return Ok(Client {
      state: Arc::new(ClientState {
        client: ThinClient {
          client: builder.build()?,
          url,
          headers: build_headers(key)?,
        },
        site: site.to_string(),
      }),
    });
  }

  pub fn site(&self) -> String {
    return self.state.site.clone();
  }

  /// Calls the stored procedure `name`. `args` are sent as JSON object, `{}` if absent.
  pub async fn rpc<T: Serialize>(
    &self,
    name: &str,
    args: Option<&T>,
  ) -> Result<StoreResponse, Error> {
    let body = match args {
      Some(args) => serde_json::to_value(args).map_err(Error::Serialization)?,
      None => serde_json::Value::Object(Default::default()),
    };

    let response = self
      .state
      .client
      .fetch(
        &format!("/{REST_API}/rpc/{name}"),
        None,
        Method::POST,
        Some(&body),
        None,
      )
      .await?;

    return store_response(response).await;
  }

  /// Entry point for operations on the collection (table) `name`.
  pub fn from(&self, name: &str) -> QueryBuilder {
    return QueryBuilder {
      client: self.state.clone(),
      collection: name.to_string(),
    };
  }
}

pub struct QueryBuilder {
  client: Arc<ClientState>,
  collection: String,
}

impl QueryBuilder {
  pub fn delete(self) -> DeleteBuilder {
    return DeleteBuilder {
      client: self.client,
      collection: self.collection,
      filters: vec![],
    };
  }
}

/// A pending `DELETE FROM <collection> WHERE ...`. All filters are AND-ed.
pub struct DeleteBuilder {
  client: Arc<ClientState>,
  collection: String,
  filters: Vec<(String, String)>,
}

impl DeleteBuilder {
  /// Only delete rows where `column` equals `value`.
  pub fn eq(mut self, column: impl Into<String>, value: impl AsRef<str>) -> Self {
    self
      .filters
      .push((column.into(), format!("eq.{}", value.as_ref())));
    return self;
  }

  pub fn filters(&self) -> &[(String, String)] {
    return &self.filters;
  }

  pub async fn execute(&self) -> Result<StoreResponse, Error> {
    // An unfiltered delete would wipe the entire collection.
    if self.filters.is_empty() {
      return Err(Error::MissingFilter);
    }

    let params: Vec<(Cow<'_, str>, Cow<'_, str>)> = self
      .filters
      .iter()
      .map(|(column, value)| (Cow::Borrowed(column.as_str()), Cow::Borrowed(value.as_str())))
      .collect();

    let mut headers = HeaderMap::with_capacity(1);
    headers.insert(
      HeaderName::from_static("prefer"),
      HeaderValue::from_static("return=representation"),
    );

    let response = self
      .client
      .client
      .fetch(
        &format!("/{REST_API}/{name}", name = self.collection),
        Some(headers),
        Method::DELETE,
        None::<&()>,
        Some(params.as_slice()),
      )
      .await?;

    return store_response(response).await;
  }
}

fn build_headers(key: &str) -> Result<HeaderMap, Error> {
  let mut base = HeaderMap::with_capacity(4);
  base.insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static("application/json"),
  );
  base.insert(
    HeaderName::from_static("apikey"),
    HeaderValue::from_str(key).map_err(Error::InvalidHeader)?,
  );
  base.insert(
    header::AUTHORIZATION,
    HeaderValue::from_str(&format!("Bearer {key}")).map_err(Error::InvalidHeader)?,
  );
  return Ok(base);
}

async fn store_response(response: reqwest::Response) -> Result<StoreResponse, Error> {
  let status = response.status();
  let body = response.bytes().await?;

  if !status.is_success() {
    let error = match serde_json::from_slice::<StoreError>(&body) {
      Ok(err) => err,
      Err(_) => {
        debug!("Unparseable error body for status {status}");
        StoreError {
          message: format!("HTTP status: {status}"),
          code: None,
          details: None,
          hint: None,
        }
      }
    };

    return Ok(StoreResponse {
      status,
      data: vec![],
      error: Some(error),
    });
  }

  return Ok(StoreResponse {
    status,
    data: parse_data(&body)?,
    error: None,
  });
}

fn parse_data(body: &[u8]) -> Result<Vec<serde_json::Value>, Error> {
  if body.iter().all(|b| b.is_ascii_whitespace()) {
    return Ok(vec![]);
  }

  return match serde_json::from_slice(body).map_err(Error::Serialization)? {
    serde_json::Value::Array(rows) => Ok(rows),
    serde_json::Value::Null => Ok(vec![]),
    value => Ok(vec![value]),
  };
}

const REST_API: &str = "rest/v1";
