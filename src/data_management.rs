//! Synthetic data-management endpoints: upload, paged listing, statistics,
//! deletion and CSV export over fixture tables.

use crate::errors::{AppError, DomainCode};
use crate::models::{DataListPage, DataStatistics, DataTableColumn, DataType, UploadManifest};
use crate::router::{FileDownload, MockReply, RequestArgs, UploadedFile};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const EMBEDDED_FIXTURES: &str = include_str!("../data/data_management.json");

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

#[derive(Debug, Clone, Deserialize)]
struct TypeFixture {
    columns: Vec<DataTableColumn>,
    data: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawFixtures {
    transaction: TypeFixture,
    loan: TypeFixture,
    enterprise: TypeFixture,
    financial: TypeFixture,
    statistics: DataStatistics,
}

#[derive(Debug, Clone)]
pub struct DataManagementMock {
    tables: BTreeMap<DataType, TypeFixture>,
    statistics: DataStatistics,
    upload_max_bytes: usize,
}

impl DataManagementMock {
    pub fn embedded(upload_max_bytes: usize) -> anyhow::Result<Self> {
        let raw: RawFixtures = serde_json::from_str(EMBEDDED_FIXTURES)
            .context("Failed to load embedded data-management fixtures")?;
        let tables = BTreeMap::from([
            (DataType::Transaction, raw.transaction),
            (DataType::Loan, raw.loan),
            (DataType::Enterprise, raw.enterprise),
            (DataType::Financial, raw.financial),
        ]);
        Ok(Self {
            tables,
            statistics: raw.statistics,
            upload_max_bytes,
        })
    }

    fn table(&self, data_type: DataType) -> Result<&TypeFixture, AppError> {
        self.tables
            .get(&data_type)
            .ok_or_else(|| AppError::Internal(format!("No fixture for {}", data_type.as_str())))
    }

    /// Validates an uploaded spreadsheet and returns its manifest.
    pub fn upload(
        &self,
        file: Option<&UploadedFile>,
        now: DateTime<Utc>,
    ) -> Result<UploadManifest, AppError> {
        let file = file.ok_or_else(|| {
            AppError::validation(DomainCode::MISSING_FILE, "Please choose a file to upload")
        })?;

        let extension = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::validation(
                DomainCode::UNSUPPORTED_FILE_TYPE,
                format!("{} is not an Excel file (.xlsx or .xls)", file.file_name),
            ));
        }
        if file.bytes.len() > self.upload_max_bytes {
            return Err(AppError::validation(
                DomainCode::FILE_TOO_LARGE,
                format!(
                    "File is {} bytes, the limit is {} bytes",
                    file.bytes.len(),
                    self.upload_max_bytes
                ),
            ));
        }

        let digest = hex::encode(Sha256::digest(&file.bytes));
        let type_counts = BTreeMap::from([
            (DataType::Transaction, 45),
            (DataType::Loan, 23),
            (DataType::Enterprise, 38),
            (DataType::Financial, 50),
        ]);

        tracing::info!(
            "Accepted upload {} ({} bytes, sha256 {})",
            file.file_name,
            file.bytes.len(),
            digest
        );
        Ok(UploadManifest {
            file_id: format!("file-{}", &digest[..16]),
            file_name: file.file_name.clone(),
            file_size: file.bytes.len() as u64,
            upload_time: now,
            data_types: DataType::ALL.to_vec(),
            total_count: type_counts.values().sum(),
            type_counts,
        })
    }

    /// One page of a fixture table, filtered by keyword over every cell.
    pub fn list(&self, args: &RequestArgs) -> Result<DataListPage, AppError> {
        let data_type = data_type_param(args)?;
        let page = positive_param(args, "page").unwrap_or(1);
        let page_size = positive_param(args, "pageSize")
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let keyword = args
            .query_param("keyword")
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());

        let table = self.table(data_type)?;
        let matching: Vec<&Map<String, Value>> = table
            .data
            .iter()
            .filter(|row| match &keyword {
                Some(keyword) => row
                    .values()
                    .any(|value| cell_text(value).to_lowercase().contains(keyword)),
                None => true,
            })
            .collect();

        let total = matching.len();
        let list = matching
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        Ok(DataListPage {
            list,
            total,
            columns: table.columns.clone(),
        })
    }

    pub fn statistics(&self) -> DataStatistics {
        self.statistics.clone()
    }

    pub fn delete(&self, id: &str, args: &RequestArgs) -> Result<String, AppError> {
        if args.query_param("type").is_some() {
            data_type_param(args)?;
        }
        tracing::info!("Deleting data item {}", id);
        Ok(format!("Data item {} deleted", id))
    }

    pub fn batch_delete(&self, args: &RequestArgs) -> Result<String, AppError> {
        let body = args.json().cloned().unwrap_or(Value::Null);
        let ids = body
            .get("ids")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::validation(DomainCode::MISSING_IDENTIFIER, "ids is required"))?;
        if let Some(data_type) = body.get("type").and_then(Value::as_str) {
            data_type.parse::<DataType>()?;
        }
        tracing::info!("Batch deleting {} data items", ids.len());
        Ok(format!("Deleted {} items", ids.len()))
    }

    /// Renders a fixture table as CSV named `{type}-{unix_millis}.csv`.
    pub fn export(&self, args: &RequestArgs, now: DateTime<Utc>) -> Result<FileDownload, AppError> {
        let data_type = data_type_param(args)?;
        let table = self.table(data_type)?;

        let mut csv = table
            .columns
            .iter()
            .map(|c| csv_field(&c.title))
            .collect::<Vec<_>>()
            .join(",");
        csv.push('\n');
        for row in &table.data {
            let line = table
                .columns
                .iter()
                .map(|c| csv_field(&row.get(&c.data_index).map(cell_text).unwrap_or_default()))
                .collect::<Vec<_>>()
                .join(",");
            csv.push_str(&line);
            csv.push('\n');
        }

        Ok(FileDownload {
            file_name: format!("{}-{}.csv", data_type.as_str(), now.timestamp_millis()),
            content_type: "text/csv; charset=utf-8".to_string(),
            bytes: csv.into_bytes(),
        })
    }

    // ============ Provider adapters ============

    pub fn upload_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        match self.upload(args.file(), Utc::now()) {
            Ok(manifest) => Ok(MockReply::message(
                serde_json::to_value(manifest)?,
                "Upload succeeded",
            )),
            Err(e) => MockReply::from_validation(e),
        }
    }

    pub fn list_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        match self.list(args) {
            Ok(page) => Ok(MockReply::data(serde_json::to_value(page)?)),
            Err(e) => MockReply::from_validation(e),
        }
    }

    pub fn statistics_reply(&self) -> Result<MockReply, AppError> {
        Ok(MockReply::data(serde_json::to_value(self.statistics())?))
    }

    pub fn delete_reply(&self, id: &str, args: &RequestArgs) -> Result<MockReply, AppError> {
        match self.delete(id, args) {
            Ok(message) => Ok(MockReply::message(Value::Null, message)),
            Err(e) => MockReply::from_validation(e),
        }
    }

    pub fn batch_delete_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        match self.batch_delete(args) {
            Ok(message) => Ok(MockReply::message(Value::Null, message)),
            Err(e) => MockReply::from_validation(e),
        }
    }

    pub fn export_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        match self.export(args, Utc::now()) {
            Ok(file) => Ok(MockReply::File(file)),
            Err(e) => MockReply::from_validation(e),
        }
    }
}

/// `type` query parameter; the dashboard defaults to transactions.
fn data_type_param(args: &RequestArgs) -> Result<DataType, AppError> {
    match args.query_param("type") {
        Some(raw) => raw.trim().parse(),
        None => Ok(DataType::Transaction),
    }
}

fn positive_param(args: &RequestArgs, key: &str) -> Option<usize> {
    args.query_param(key)?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
