use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SheetStore, ServiceAccountAuth};
use crate::config::SHEETS_API_URL;
use crate::error::{AppError, Result};
use crate::types::CellWrite;

/// Interpret entered values as if typed into the UI, so `$0.5` stays a
/// currency number and the date cell becomes a date.
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody<'a> {
    value_input_option: &'static str,
    data: &'a [CellWrite],
}

/// Google Sheets v4 `values` endpoints for a single spreadsheet.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    spreadsheet_url: Url,
    auth: ServiceAccountAuth,
}

impl GoogleSheetsClient {
    pub fn new(http: reqwest::Client, spreadsheet_id: &str, auth: ServiceAccountAuth) -> Result<Self> {
        Self::with_base_url(http, SHEETS_API_URL, spreadsheet_id, auth)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        base_url: &str,
        spreadsheet_id: &str,
        auth: ServiceAccountAuth,
    ) -> Result<Self> {
        let mut spreadsheet_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid Sheets API URL {base_url}: {e}")))?;
        spreadsheet_url
            .path_segments_mut()
            .map_err(|_| AppError::Config(format!("Sheets API URL cannot be a base: {base_url}")))?
            .pop_if_empty()
            .push(spreadsheet_id);
        Ok(Self {
            http,
            spreadsheet_url,
            auth,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.spreadsheet_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn get(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let token = self.auth.access_token().await?;
        let url = self.endpoint(&["values", range]);
        debug!("GET {url}");

        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let body = ensure_success(resp).await?.text().await?;
        parse_values(&body)
    }

    async fn batch_update(&self, writes: &[CellWrite]) -> Result<()> {
        let token = self.auth.access_token().await?;
        let url = self.endpoint(&["values:batchUpdate"]);
        debug!("POST {url} ({} ranges)", writes.len());

        let body = BatchUpdateBody {
            value_input_option: VALUE_INPUT_OPTION,
            data: writes,
        };
        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AppError::Sheets {
        status: status.as_u16(),
        body,
    })
}

/// Cells are normally strings (FORMATTED_VALUE); anything else is stringified.
fn parse_values(body: &str) -> Result<Vec<Vec<String>>> {
    let range: ValueRange = serde_json::from_str(body)?;
    Ok(range
        .values
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect())
}
