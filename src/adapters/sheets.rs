use crate::config::{SheetConfig, SheetSourceKind};
use crate::domain::ports::ProspectSource;
use crate::utils::error::{FunnelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const SERVICE: &str = "Google Sheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn require_spreadsheet_id(config: &SheetConfig) -> Result<&str> {
    if config.spreadsheet_id.trim().is_empty() {
        return Err(FunnelError::MissingConfigError {
            field: "sheet.spreadsheet_id".to_string(),
        });
    }
    Ok(config.spreadsheet_id.trim())
}

/// Reads a range through the Sheets v4 `values.get` endpoint.
pub struct SheetsApiSource {
    client: Client,
    config: SheetConfig,
}

impl SheetsApiSource {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn values_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.api_base.trim_end_matches('/'),
            spreadsheet_id,
            self.config.range
        )
    }
}

#[async_trait]
impl ProspectSource for SheetsApiSource {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
        let spreadsheet_id = require_spreadsheet_id(&self.config)?;
        let url = self.values_url(spreadsheet_id);
        tracing::debug!("Fetching sheet range: {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FunnelError::service(SERVICE, status.as_u16(), body));
        }

        let range: ValueRange = response.json().await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    fn describe(&self) -> String {
        format!("sheet {} ({})", self.config.spreadsheet_id, self.config.range)
    }
}

/// Downloads the sheet as CSV through the export link (sheet must be link-shared).
pub struct CsvExportSource {
    client: Client,
    config: SheetConfig,
}

impl CsvExportSource {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

pub fn parse_csv_rows(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[async_trait]
impl ProspectSource for CsvExportSource {
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>> {
        let spreadsheet_id = require_spreadsheet_id(&self.config)?;
        let url = format!(
            "{}/spreadsheets/d/{}/export",
            self.config.export_base.trim_end_matches('/'),
            spreadsheet_id
        );

        let mut request = self.client.get(&url).query(&[("format", "csv")]);
        if let Some(gid) = &self.config.gid {
            request = request.query(&[("gid", gid)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FunnelError::service(SERVICE, status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        parse_csv_rows(&bytes)
    }

    fn describe(&self) -> String {
        format!("CSV export of sheet {}", self.config.spreadsheet_id)
    }
}

pub fn source_from_config(config: &SheetConfig) -> Box<dyn ProspectSource> {
    match config.source {
        SheetSourceKind::Api => Box::new(SheetsApiSource::new(config.clone())),
        SheetSourceKind::Csv => Box::new(CsvExportSource::new(config.clone())),
    }
}
