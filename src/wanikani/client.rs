//! WaniKani API client: authenticated, pagination-following fetches.

use std::future::Future;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::api_types::{ApiAssignmentData, ApiCollection, ApiResource, ApiSubjectData};
use super::types::{Assignment, Subject};

pub const WK_API_BASE_URL: &str = "https://api.wanikani.com/v2/";

const WK_API_REVISION: &str = "20170710";

/// Errors raised when talking to a remote API.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The server answered with a non-success status. Aborts the whole fetch;
  /// pages accumulated so far are discarded.
  #[error("API request failed: {status} - {status_text}")]
  Request { status: u16, status_text: String },

  #[error("request transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("malformed response body: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid request URL: {0}")]
  Url(#[from] url::ParseError),
}

/// WaniKani API client
#[derive(Clone)]
pub struct WkClient {
  http: reqwest::Client,
  token: String,
}

impl WkClient {
  pub fn new(token: String) -> Self {
    Self {
      http: reqwest::Client::new(),
      token,
    }
  }

  /// All assignments for the authenticated user.
  pub async fn assignments(&self) -> Result<Vec<Assignment>, ApiError> {
    let records: Vec<ApiResource<ApiAssignmentData>> = self.fetch_all("assignments", &[]).await?;
    Ok(
      records
        .into_iter()
        .map(ApiResource::into_assignment)
        .collect(),
    )
  }

  /// Subject details for the given ids, batched into a single request chain
  /// (the ids are joined into one comma-separated query parameter).
  pub async fn subjects_by_ids(&self, ids: &[u64]) -> Result<Vec<Subject>, ApiError> {
    let joined = ids
      .iter()
      .map(|id| id.to_string())
      .collect::<Vec<_>>()
      .join(",");
    let records: Vec<ApiResource<ApiSubjectData>> =
      self.fetch_all("subjects", &[("ids", joined.as_str())]).await?;
    Ok(records.into_iter().map(ApiResource::into_subject).collect())
  }

  /// Fetch every page of a collection endpoint, concatenated in server order.
  pub async fn fetch_all<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    params: &[(&str, &str)],
  ) -> Result<Vec<T>, ApiError> {
    let mut start = Url::parse(WK_API_BASE_URL)?.join(endpoint)?;
    if !params.is_empty() {
      start.query_pairs_mut().extend_pairs(params);
    }
    debug!(url = %start, "fetching collection");

    paginate(start, |url| {
      let http = self.http.clone();
      let token = self.token.clone();
      async move {
        let response = http
          .get(url)
          .bearer_auth(&token)
          .header("Wanikani-Revision", WK_API_REVISION)
          .send()
          .await?;

        let status = response.status();
        if !status.is_success() {
          return Err(ApiError::Request {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
          });
        }

        let body = response.text().await?;
        let page: ApiCollection<T> = serde_json::from_str(&body)?;
        Ok(page)
      }
    })
    .await
  }
}

/// Follow `pages.next_url` links until exhausted, concatenating the `data`
/// arrays in page order. Pure over the page-fetch closure, so the loop is
/// testable on canned pages. A fresh call always restarts from page one.
async fn paginate<T, F, Fut>(start: Url, mut fetch_page: F) -> Result<Vec<T>, ApiError>
where
  F: FnMut(Url) -> Fut,
  Fut: Future<Output = Result<ApiCollection<T>, ApiError>>,
{
  let mut all = Vec::new();
  let mut next = Some(start);

  while let Some(url) = next {
    let page = fetch_page(url).await?;
    all.extend(page.data);
    next = match page.pages.and_then(|p| p.next_url) {
      Some(u) if !u.is_empty() => Some(Url::parse(&u)?),
      _ => None,
    };
  }

  Ok(all)
}
