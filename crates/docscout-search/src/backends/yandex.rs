//! Yandex Search API client (async submit/poll protocol).
//! https://yandex.cloud/en/docs/search-api/
//!
//! Three-step flow: sign a PS256 service-account assertion and exchange it
//! for an IAM token, submit the query to `searchAsync`, then poll the
//! returned operation until it reports done. The payload arrives as
//! base64-encoded XML inside the operation response.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use docscout_common::http::ApiClient;
use docscout_common::settings::ServiceAccountKey;
use docscout_common::types::{BackendId, BackendResult};

use crate::data::domains;

use super::{BackendError, FetchOutcome, SearchBackend};

const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
const SUBMIT_URL: &str = "https://searchapi.api.cloud.yandex.net/v2/web/searchAsync";
const OPERATION_URL: &str = "https://operation.api.cloud.yandex.net/operations";

/// IAM tokens live an hour; renew when within this margin of expiry.
const TOKEN_RENEWAL_MARGIN_SECS: i64 = 60;
const TOKEN_TTL_SECS: i64 = 3600;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_ATTEMPTS: u32 = 30;

/// Where a submitted search currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollState {
    Pending,
    Done(String),
    Failed(String),
    TimedOut,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    aud: &'a str,
    iss: &'a str,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

pub struct YandexClient {
    client: ApiClient,
    key: ServiceAccountKey,
    folder_id: String,
    token: Mutex<Option<CachedToken>>,
}

impl YandexClient {
    pub fn new(client: ApiClient, key: ServiceAccountKey, folder_id: impl Into<String>) -> Self {
        Self {
            client,
            key,
            folder_id: folder_id.into(),
            token: Mutex::new(None),
        }
    }

    fn cached_token(&self) -> Option<String> {
        let now = Utc::now().timestamp();
        let guard = self.token.lock().ok()?;
        guard
            .as_ref()
            .filter(|t| now < t.expires_at - TOKEN_RENEWAL_MARGIN_SECS)
            .map(|t| t.token.clone())
    }

    fn sign_assertion(&self, now: i64) -> Result<String, BackendError> {
        let claims = AssertionClaims {
            aud: IAM_TOKEN_URL,
            iss: &self.key.service_account_id,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        let mut header = Header::new(Algorithm::PS256);
        header.kid = Some(self.key.id.clone());

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| BackendError::Auth(format!("invalid service account key: {e}")))?;
        jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|e| BackendError::Auth(format!("assertion signing failed: {e}")))
    }

    /// Returns the cached IAM token, exchanging a fresh assertion when the
    /// current one expires within the renewal margin. Renewing a few
    /// seconds early is harmless, so concurrent callers may both refresh.
    #[instrument(skip(self))]
    async fn iam_token(&self) -> Result<String, BackendError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let now = Utc::now().timestamp();
        let assertion = self.sign_assertion(now)?;

        let resp = self
            .client
            .post(IAM_TOKEN_URL)?
            .json(&json!({ "jwt": assertion }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Auth(format!("token exchange {status}: {body}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let token = body["iamToken"]
            .as_str()
            .ok_or_else(|| BackendError::Auth("token exchange returned no iamToken".to_string()))?
            .to_string();

        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(CachedToken {
                token: token.clone(),
                expires_at: now + TOKEN_TTL_SECS,
            });
        }
        debug!("renewed IAM token");
        Ok(token)
    }

    /// Submits the query; success yields the operation id to poll.
    #[instrument(skip(self, token))]
    async fn submit(
        &self,
        token: &str,
        query: &str,
        search_type: &str,
    ) -> Result<String, BackendError> {
        let resp = self
            .client
            .post(SUBMIT_URL)?
            .bearer_auth(token)
            .json(&json!({
                "query": {
                    "searchType": search_type,
                    "queryText": query,
                },
                "folderId": self.folder_id,
                "responseFormat": "FORMAT_XML",
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Transport(format!("submit {status}: {body}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BackendError::Decode("submit response had no operation id".to_string()))
    }

    async fn poll_once(&self, token: &str, operation_id: &str) -> PollState {
        let url = format!("{OPERATION_URL}/{operation_id}");
        let resp = match self.client.get(&url) {
            Ok(builder) => builder.bearer_auth(token).send().await,
            Err(err) => return PollState::Failed(err.to_string()),
        };
        let body: serde_json::Value = match resp {
            Ok(r) => match r.json().await {
                Ok(v) => v,
                Err(e) => return PollState::Failed(e.to_string()),
            },
            Err(e) => return PollState::Failed(e.to_string()),
        };

        if body["done"].as_bool().unwrap_or(false) {
            match body["response"]["rawData"].as_str() {
                Some(raw) => PollState::Done(raw.to_string()),
                None => PollState::Failed("operation done without payload".to_string()),
            }
        } else {
            PollState::Pending
        }
    }

    /// Polls the operation on a fixed interval up to the attempt ceiling.
    #[instrument(skip(self, token))]
    async fn await_operation(&self, token: &str, operation_id: &str) -> PollState {
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
            match self.poll_once(token, operation_id).await {
                PollState::Pending => {
                    debug!(attempt, operation_id, "operation still pending");
                }
                terminal => return terminal,
            }
        }
        PollState::TimedOut
    }

    async fn run_search(&self, query: &str, search_type: &str) -> FetchOutcome {
        let token = match self.iam_token().await {
            Ok(t) => t,
            Err(err) => return FetchOutcome::failed(err),
        };
        let operation_id = match self.submit(&token, query, search_type).await {
            Ok(id) => id,
            Err(err) => return FetchOutcome::failed(err),
        };

        match self.await_operation(&token, &operation_id).await {
            PollState::Done(raw) => match decode_payload(&raw) {
                Ok(results) => FetchOutcome::ok(results),
                Err(err) => FetchOutcome::failed(err),
            },
            PollState::Failed(reason) => {
                warn!(operation_id, reason, "yandex operation failed");
                FetchOutcome::failed(BackendError::Transport(reason))
            }
            PollState::TimedOut | PollState::Pending => FetchOutcome::failed(BackendError::Timeout(
                format!("operation still pending after {MAX_POLL_ATTEMPTS} polls"),
            )),
        }
    }
}

/// Yandex uses `mime:` instead of the common `filetype:` token.
fn to_mime_query(query: &str) -> String {
    let lower = query.to_lowercase();
    if lower.contains("mime:pdf") {
        query.to_string()
    } else if lower.contains("filetype:pdf") {
        query.replace("filetype:pdf", "mime:pdf")
    } else {
        format!("{query} mime:pdf")
    }
}

fn search_type_for(language: &str) -> &'static str {
    match language {
        "tr" => "SEARCH_TYPE_TR",
        _ => "SEARCH_TYPE_RU",
    }
}

/// Decodes the base64 rawData envelope and parses the XML result list.
fn decode_payload(raw: &str) -> Result<Vec<BackendResult>, BackendError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|e| BackendError::Decode(format!("payload is not base64: {e}")))?;
    let xml = String::from_utf8(bytes)
        .map_err(|e| BackendError::Decode(format!("payload is not utf-8: {e}")))?;
    parse_results_xml(&xml)
}

struct RawDoc {
    url: String,
    title: String,
    snippet: String,
    mime_type: String,
}

/// Parses the `<doc>` entries out of a Yandex XML response. Titles and
/// passages may contain highlight markup; text content is concatenated
/// across nested elements.
fn parse_results_xml(xml: &str) -> Result<Vec<BackendResult>, BackendError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut docs: Vec<RawDoc> = Vec::new();
    let mut current: Option<RawDoc> = None;
    let mut in_url = false;
    let mut in_title = false;
    let mut in_passage = false;
    let mut in_mime = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"doc" => {
                    current = Some(RawDoc {
                        url: String::new(),
                        title: String::new(),
                        snippet: String::new(),
                        mime_type: String::new(),
                    });
                }
                b"url" => in_url = true,
                b"title" => in_title = true,
                b"passage" => in_passage = true,
                b"mime-type" => in_mime = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"doc" => {
                    if let Some(doc) = current.take() {
                        if !doc.url.is_empty() {
                            docs.push(doc);
                        }
                    }
                }
                b"url" => in_url = false,
                b"title" => in_title = false,
                b"passage" => in_passage = false,
                b"mime-type" => in_mime = false,
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                if let Some(doc) = current.as_mut() {
                    let text = t.unescape().unwrap_or_default();
                    if in_url {
                        doc.url.push_str(&text);
                    } else if in_title {
                        doc.title.push_str(&text);
                    } else if in_passage {
                        if !doc.snippet.is_empty() {
                            doc.snippet.push(' ');
                        }
                        doc.snippet.push_str(&text);
                    } else if in_mime {
                        doc.mime_type.push_str(&text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(BackendError::Decode(format!("bad result XML: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(docs
        .into_iter()
        .map(|doc| BackendResult {
            title: doc.title,
            url: doc.url,
            snippet: if doc.mime_type.is_empty() {
                doc.snippet
            } else {
                // Keep the mime type visible so the shared filetype filter
                // recognizes PDF hits whose URL lacks the extension.
                format!("{} [{}]", doc.snippet, doc.mime_type)
            },
            source: BackendId::Yandex.as_str().to_string(),
            language: String::new(),
        })
        .collect())
}

#[async_trait]
impl SearchBackend for YandexClient {
    fn id(&self) -> BackendId {
        BackendId::Yandex
    }

    async fn search_pdfs(&self, query: &str, count: usize, language: &str) -> FetchOutcome {
        let query = to_mime_query(query);
        let mut outcome = self.run_search(&query, search_type_for(language)).await;

        outcome.results = outcome
            .results
            .into_iter()
            .filter(|r| {
                r.url.to_lowercase().ends_with(".pdf") || r.snippet.to_lowercase().contains("pdf")
            })
            .filter(|r| !domains::is_excluded_domain(&r.url))
            .map(|mut r| {
                r.language = language.to_string();
                r
            })
            .take(count)
            .collect();
        outcome
    }

    async fn search_site(&self, domain: &str, query: &str, count: usize) -> FetchOutcome {
        let site_query = if query.is_empty() {
            format!("site:{domain} mime:pdf")
        } else {
            format!("{} site:{domain}", to_mime_query(query))
        };
        let mut outcome = self.run_search(&site_query, "SEARCH_TYPE_RU").await;
        outcome.results = outcome
            .results
            .into_iter()
            .filter(|r| !domains::is_excluded_domain(&r.url))
            .take(count)
            .collect();
        outcome
    }
}
