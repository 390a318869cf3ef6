use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::config::{ApiSettings, Credential};
use crate::deck::{parse_deck, SlideDeck, MALFORMED_PAYLOAD};
use crate::error::{FetchError, TelemetrySendError};

use super::{AttentionReport, LessonApi};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub struct HttpLessonApi {
    client: Client,
    base_url: String,
    credential: Option<Credential>,
}

impl HttpLessonApi {
    pub fn new(settings: &ApiSettings, credential: Option<Credential>) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build HTTP client")?;

        if credential.is_none() {
            log_warn!("no backend credential configured; requests will be unauthenticated");
        }

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(credential) => request.bearer_auth(credential.bearer()),
            None => request,
        }
    }
}

#[async_trait]
impl LessonApi for HttpLessonApi {
    async fn fetch_deck(&self, lesson_id: &str) -> Result<SlideDeck, FetchError> {
        let url = self.url(&format!("/lessons/{lesson_id}/generate"));
        log_debug!("fetching slides from {url}");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| FetchError::Malformed(format!("{MALFORMED_PAYLOAD}: {err}")))?;

        parse_deck(body)
    }

    async fn post_attention(&self, report: &AttentionReport) -> Result<(), TelemetrySendError> {
        let response = self
            .authorize(self.client.post(self.url("/lessons/attention-log")))
            .json(report)
            .send()
            .await
            .map_err(|err| TelemetrySendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetrySendError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer it with `status_line` + `body`, and hand
    /// back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .map(|value| value.trim().parse::<usize>().unwrap())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    fn api(base_url: String, token: Option<&str>) -> HttpLessonApi {
        let settings = ApiSettings {
            base_url,
            request_timeout_ms: 2_000,
        };
        HttpLessonApi::new(&settings, token.map(Credential::new)).unwrap()
    }

    #[tokio::test]
    async fn fetch_deck_sends_bearer_and_parses_slides() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"chapter_title":"2","slides":[{"title":"Intro","bullets":["a"]},{"title":"Roots","bullets":[]}]}"#,
        )
        .await;

        let deck = api(base, Some("tok-123")).fetch_deck("2").await.unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides[1].title.as_deref(), Some("Roots"));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /lessons/2/generate "));
        assert!(request.contains("authorization: bearer tok-123"));
    }

    #[tokio::test]
    async fn fetch_deck_maps_non_success_status() {
        let (base, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;
        let err = api(base, None).fetch_deck("2").await.unwrap_err();
        assert_eq!(err, FetchError::Status { status: 500 });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_deck_rejects_unexpected_shape() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", r#"{"lesson":[]}"#).await;
        let err = api(base, None).fetch_deck("2").await.unwrap_err();
        assert_eq!(err, FetchError::Malformed(MALFORMED_PAYLOAD.into()));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_deck_reports_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = api(format!("http://{addr}"), None)
            .fetch_deck("2")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn post_attention_sends_report_body() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", r#"{"status":"ok","id":1}"#).await;
        let report = AttentionReport {
            lesson_id: "2".into(),
            attention_score: 1.0,
        };

        api(format!("{base}/"), Some("tok")).post_attention(&report).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.to_lowercase().starts_with("post /lessons/attention-log "));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let sent: AttentionReport = serde_json::from_str(body).unwrap();
        assert_eq!(sent, report);
    }

    #[tokio::test]
    async fn post_attention_maps_rejection() {
        let (base, server) = serve_once("HTTP/1.1 503 Service Unavailable", "{}").await;
        let report = AttentionReport {
            lesson_id: "2".into(),
            attention_score: 0.0,
        };
        let err = api(base, None).post_attention(&report).await.unwrap_err();
        assert_eq!(err, TelemetrySendError::Status { status: 503 });
        server.await.unwrap();
    }
}
