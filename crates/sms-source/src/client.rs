//! HTTP client for the SMS CDR endpoint.

use crate::error::SourceError;
use crate::types::{CdrResponse, SmsMessage};
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const ENDPOINT: &str = "/ints/agent/res/data_smscdr.php";
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/138.0.0.0 Mobile Safari/537.36";
const COLUMNS: usize = 9;

/// Client for the DataTables-style SMS CDR report endpoint.
///
/// The session cookie is stored as a `SecretString` so it never leaks
/// into logs or debug output. The per-call deadline is enforced at the
/// reqwest client level: one slow request cannot stretch a poll tick
/// beyond the configured bound.
#[derive(Clone)]
pub struct CdrClient {
    client: Client,
    base_url: String,
    cookie: SecretString,
    lookback: chrono::Duration,
}

impl CdrClient {
    /// Create a new CDR client.
    pub fn new(
        base_url: impl Into<String>,
        cookie: SecretString,
        lookback: Duration,
        request_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            cookie,
            lookback: chrono::Duration::from_std(lookback)
                .unwrap_or_else(|_| chrono::Duration::hours(24)),
        })
    }

    /// Fetch messages addressed to `number` inside the lookback window,
    /// newest first.
    #[instrument(skip(self))]
    pub async fn fetch_messages(&self, number: &str) -> Result<Vec<SmsMessage>, SourceError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, ENDPOINT))
            .query(&self.query_params(number))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(
                "Referer",
                format!("{}/ints/agent/SMSCDRReports", self.base_url),
            )
            .header("Cookie", self.cookie.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed = parse_body(&body)?;
        let messages: Vec<SmsMessage> = parsed
            .rows
            .iter()
            .filter_map(|row| SmsMessage::from_row(row))
            .collect();

        debug!(
            "CDR returned {} rows, {} real messages for {}",
            parsed.rows.len(),
            messages.len(),
            number
        );
        Ok(messages)
    }

    /// Fetch just the newest message for `number`, if any.
    pub async fn fetch_latest(&self, number: &str) -> Result<Option<SmsMessage>, SourceError> {
        Ok(self.fetch_messages(number).await?.into_iter().next())
    }

    /// Full DataTables parameter grid. The endpoint rejects requests
    /// that omit the per-column props, so all nine are spelled out.
    fn query_params(&self, number: &str) -> Vec<(String, String)> {
        let now = Utc::now();
        let start = now - self.lookback;

        let mut params: Vec<(String, String)> = vec![
            ("fdate1".into(), start.format("%Y-%m-%d 00:00:00").to_string()),
            ("fdate2".into(), now.format("%Y-%m-%d %H:%M:%S").to_string()),
            ("frange".into(), String::new()),
            ("fclient".into(), String::new()),
            ("fnum".into(), number.to_string()),
            ("fcli".into(), String::new()),
            ("fgdate".into(), String::new()),
            ("fgmonth".into(), String::new()),
            ("fgrange".into(), String::new()),
            ("fgclient".into(), String::new()),
            ("fgnumber".into(), String::new()),
            ("fgcli".into(), String::new()),
            ("fg".into(), "0".into()),
            ("sEcho".into(), "1".into()),
            ("iColumns".into(), COLUMNS.to_string()),
            ("sColumns".into(), ",".repeat(COLUMNS - 1)),
            ("iDisplayStart".into(), "0".into()),
            ("iDisplayLength".into(), "50".into()),
        ];

        for col in 0..COLUMNS {
            params.push((format!("mDataProp_{col}"), col.to_string()));
            params.push((format!("sSearch_{col}"), String::new()));
            params.push((format!("bRegex_{col}"), "false".into()));
            params.push((format!("bSearchable_{col}"), "true".into()));
            // The last column is not sortable server-side.
            let sortable = if col == COLUMNS - 1 { "false" } else { "true" };
            params.push((format!("bSortable_{col}"), sortable.into()));
        }

        params.extend([
            ("sSearch".into(), String::new()),
            ("bRegex".into(), "false".into()),
            ("iSortCol_0".into(), "0".into()),
            ("sSortDir_0".into(), "desc".into()),
            ("iSortingCols".into(), "1".into()),
            ("_".into(), now.timestamp_millis().to_string()),
        ]);

        params
    }
}

/// Parse a response body that is usually JSON but sometimes an HTML
/// login page (expired session) or JSON wrapped in HTML noise.
fn parse_body(body: &str) -> Result<CdrResponse, SourceError> {
    match serde_json::from_str::<CdrResponse>(body) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let lower = body.to_lowercase();
            if lower.contains("msi sms | login")
                || (lower.contains("<html") && lower.contains("login"))
            {
                return Err(SourceError::SessionExpired);
            }

            // Some deployments wrap the JSON payload in HTML. Try the
            // outermost brace pair before giving up.
            if body.contains("aaData") {
                if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
                    if start < end {
                        if let Ok(parsed) = serde_json::from_str(&body[start..=end]) {
                            warn!("Recovered embedded JSON from non-JSON CDR response");
                            return Ok(parsed);
                        }
                    }
                }
            }

            Err(SourceError::Json(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> CdrClient {
        CdrClient::new(
            base_url,
            SecretString::new("PHPSESSID=test".into()),
            Duration::from_secs(24 * 3600),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn cdr_body() -> serde_json::Value {
        serde_json::json!({
            "sEcho": 1,
            "aaData": [
                // Aggregate rows the endpoint mixes in.
                ["0.052", "Range A", "", "", "", ""],
                ["12,345", "Range A", "", "", "", ""],
                ["short", "Range A", "", "", "", ""],
                // Real messages, newest first.
                ["2025-01-07 09:15:22", "Range A", "59171234567", "Snapchat",
                 "", "Snapchat 157737 is your one time passcode"],
                ["2025-01-07 08:02:10", "Range A", "59171234567", "WhatsApp",
                 "", "Your OTP: 4821"]
            ]
        })
    }

    #[tokio::test]
    async fn fetch_messages_skips_summary_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .and(query_param("fnum", "59171234567"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cdr_body()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let messages = client.fetch_messages("59171234567").await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, "Snapchat");
        assert_eq!(
            messages[0].text,
            "Snapchat 157737 is your one time passcode"
        );
    }

    #[tokio::test]
    async fn fetch_latest_returns_newest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(cdr_body()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let latest = client.fetch_latest("59171234567").await.unwrap().unwrap();

        assert_eq!(latest.received_at, "2025-01-07 09:15:22");
    }

    #[tokio::test]
    async fn login_page_maps_to_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>MSI SMS | Login</title></head><body>sign in</body></html>",
            ))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.fetch_messages("59171234567").await.unwrap_err();

        assert!(matches!(err, SourceError::SessionExpired));
    }

    #[tokio::test]
    async fn embedded_json_is_recovered() {
        let server = MockServer::start().await;
        let wrapped = format!("<!-- debug -->\n{}\n<!-- end -->", cdr_body());
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string(wrapped))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let messages = client.fetch_messages("59171234567").await.unwrap();

        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.fetch_messages("59171234567").await.unwrap_err();

        assert!(matches!(err, SourceError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn garbage_body_maps_to_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.fetch_messages("59171234567").await.unwrap_err();

        assert!(matches!(err, SourceError::Json(_)));
    }

    #[test]
    fn row_parsing_rejects_short_rows() {
        let row = vec![serde_json::json!("2025-01-07 09:15:22")];
        assert!(SmsMessage::from_row(&row).is_none());
    }

    #[test]
    fn message_with_json_content_is_not_misread_as_login() {
        // A message body mentioning "login" must not trip the expiry
        // heuristic when the response itself is valid JSON.
        let body = serde_json::json!({
            "aaData": [["2025-01-07 09:15:22", "r", "n", "App", "",
                        "Use 1234 to login"]]
        })
        .to_string();

        let parsed = parse_body(&body).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }
}
