//! Table export.
//!
//! The reviewed table is posted as a JSON array of row objects (keys in
//! column order) to a conversion endpoint that answers with the spreadsheet
//! bytes. One request per export, no retries.

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::models::{DocumentRecord, Fields};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Cannot reach export endpoint at {0}")]
    Connection(String),

    #[error("Export request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Export endpoint answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Sink for serialized tables.
pub trait ExportTransport: Send + Sync {
    /// Deliver a JSON body, returning the produced file bytes.
    fn send<'a>(&'a self, body: Vec<u8>) -> BoxFuture<'a, Result<Vec<u8>, TransportError>>;
}

/// POSTs the table to an HTTP conversion endpoint.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
            timeout,
        })
    }

    pub fn from_config(config: &ReviewConfig) -> Result<Self, TransportError> {
        Self::new(&config.export_endpoint, config.export_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(bytes.to_vec())
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() {
            TransportError::Connection(self.endpoint.clone())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

impl ExportTransport for HttpTransport {
    fn send<'a>(&'a self, body: Vec<u8>) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        Box::pin(self.post(body))
    }
}

/// Rows in column order. Cells a record lacks are exported empty.
pub fn table_rows(records: &[DocumentRecord], columns: &[String]) -> Vec<Fields> {
    records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| (c.as_str(), record.fields.get(c).unwrap_or("")))
                .collect::<Fields>()
        })
        .collect()
}

/// Serialize the snapshot and hand it to the transport once.
pub async fn export_table(
    transport: &dyn ExportTransport,
    records: &[DocumentRecord],
    columns: &[String],
) -> Result<Vec<u8>, ReviewError> {
    let rows = table_rows(records, columns);
    let body = serde_json::to_vec(&rows)?;

    tracing::info!(rows = rows.len(), columns = columns.len(), "Exporting table");
    match transport.send(body).await {
        Ok(file) => {
            tracing::info!(bytes = file.len(), "Export complete");
            Ok(file)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Export failed");
            Err(ReviewError::ExportFailed(e))
        }
    }
}

/// Download name for an edited table: `raport.xlsx` → `raport_edited.xlsx`.
pub fn edited_filename(source: &str) -> String {
    let stem = match source.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => source,
    };
    format!("{stem}_edited.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::sync::Mutex;

    use axum::body::Bytes;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    use crate::models::TypeTag;

    /// Records every body it receives and answers with a fixed result.
    struct RecordingTransport {
        bodies: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new(fail: bool) -> Self {
            Self {
                bodies: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    impl ExportTransport for RecordingTransport {
        fn send<'a>(&'a self, body: Vec<u8>) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
            Box::pin(async move {
                self.bodies.lock().unwrap().push(body);
                if self.fail {
                    Err(TransportError::Status {
                        status: 502,
                        body: "bad gateway".into(),
                    })
                } else {
                    Ok(b"PK\x03\x04".to_vec())
                }
            })
        }
    }

    fn columns() -> Vec<String> {
        vec!["Furnizor".into(), "Suma".into()]
    }

    fn records() -> Vec<DocumentRecord> {
        let fields: Fields = [("Furnizor", "Moldcell"), ("Suma", "120.50")].into_iter().collect();
        vec![
            DocumentRecord::new("factura.pdf", TypeTag::Invoice).with_fields(fields),
            DocumentRecord::new("gol.pdf", TypeTag::Unknown),
        ]
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/download")
    }

    #[test]
    fn rows_follow_column_order() {
        let rows = table_rows(&records(), &columns());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key_list(), columns());
        assert_eq!(rows[0].get("Suma"), Some("120.50"));
        assert_eq!(rows[1].get("Furnizor"), Some(""));

        let json = serde_json::to_string(&rows).unwrap();
        assert!(json.starts_with(r#"[{"Furnizor":"Moldcell","Suma":"120.50"}"#));
    }

    #[test]
    fn edited_filename_replaces_extension() {
        assert_eq!(edited_filename("raport.xlsx"), "raport_edited.xlsx");
        assert_eq!(edited_filename("raport.v2.csv"), "raport.v2_edited.xlsx");
        assert_eq!(edited_filename("raport"), "raport_edited.xlsx");
        assert_eq!(edited_filename(".hidden"), ".hidden_edited.xlsx");
    }

    #[tokio::test]
    async fn export_sends_exactly_one_request() {
        let transport = RecordingTransport::new(false);
        let file = export_table(&transport, &records(), &columns()).await.unwrap();
        assert_eq!(file, b"PK\x03\x04");

        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let sent: serde_json::Value = serde_json::from_slice(&bodies[0]).unwrap();
        assert_eq!(sent[0]["Furnizor"], "Moldcell");
    }

    #[tokio::test]
    async fn transport_failure_is_export_failed() {
        let transport = RecordingTransport::new(true);
        let err = export_table(&transport, &records(), &columns()).await.unwrap_err();
        match &err {
            ReviewError::ExportFailed(TransportError::Status { status, .. }) => {
                assert_eq!(*status, 502)
            }
            other => panic!("expected ExportFailed, got {other:?}"),
        }
        assert!(err.source().is_some());
        assert_eq!(transport.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn http_transport_posts_json_and_returns_body() {
        let url = serve(Router::new().route("/download", post(|body: Bytes| async move { body }))).await;
        let transport = HttpTransport::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(transport.endpoint(), url);

        let file = export_table(&transport, &records(), &columns()).await.unwrap();
        let echoed: Vec<serde_json::Value> = serde_json::from_slice(&file).unwrap();
        assert_eq!(echoed.len(), 2);
        assert_eq!(echoed[0]["Suma"], "120.50");
    }

    #[tokio::test]
    async fn http_transport_surfaces_error_status() {
        let url = serve(Router::new().route(
            "/download",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "conversion failed") }),
        ))
        .await;
        let transport = HttpTransport::new(&url, Duration::from_secs(5)).unwrap();

        let err = transport.send(b"[]".to_vec()).await.unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "conversion failed");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_transport_reports_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            HttpTransport::new(&format!("http://{addr}/download"), Duration::from_secs(5)).unwrap();
        let err = transport.send(b"[]".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn http_transport_times_out() {
        let url = serve(Router::new().route(
            "/download",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        let transport = HttpTransport::new(&url, Duration::from_millis(200)).unwrap();

        let err = transport.send(b"[]".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
    }
}
