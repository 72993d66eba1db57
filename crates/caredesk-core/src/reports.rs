use std::borrow::Cow;
use std::path::Path;

use caredesk_api::{ApiClient, Upload};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::schema::{Category, FieldValue, ListConfig, Record};
use crate::session::ViewKind;
use crate::{Result, ValidationErrors};

/// An uploaded report document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub file_name: Option<String>,
    pub uploaded_by: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Monthly,
    Quarterly,
    Annual,
    Incident,
    #[serde(other)]
    Unknown,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Monthly => "monthly",
            ReportType::Quarterly => "quarterly",
            ReportType::Annual => "annual",
            ReportType::Incident => "incident",
            ReportType::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(ReportType::Monthly),
            "quarterly" => Ok(ReportType::Quarterly),
            "annual" | "yearly" => Ok(ReportType::Annual),
            "incident" => Ok(ReportType::Incident),
            other => Err(format!("unknown report type: {}", other)),
        }
    }
}

fn report_title(r: &Report) -> FieldValue<'_> {
    FieldValue::text(r.title.as_deref())
}
fn report_type(r: &Report) -> FieldValue<'_> {
    FieldValue::text(r.report_type.map(ReportType::as_str))
}
fn report_file(r: &Report) -> FieldValue<'_> {
    FieldValue::text(r.file_name.as_deref())
}
fn report_uploader(r: &Report) -> FieldValue<'_> {
    FieldValue::text(r.uploaded_by.as_deref())
}
fn report_created(r: &Report) -> FieldValue<'_> {
    FieldValue::text(r.created_at.as_deref())
}

impl Record for Report {
    const COLLECTION: &'static str = "reports";
    const KIND: ViewKind = ViewKind::Reports;

    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        match self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => Cow::Borrowed(title),
            None => Cow::Owned(format!("Report #{}", self.id)),
        }
    }

    fn list_config() -> ListConfig<Self> {
        ListConfig::new()
            .column("title", "Title", report_title)
            .column("type", "Type", report_type)
            .column("file_name", "File", report_file)
            .column("uploaded_by", "Uploaded By", report_uploader)
            .column("created_at", "Uploaded", report_created)
            .search(report_title)
            .search(report_file)
            .search(report_uploader)
            .category(Category::equals("monthly", "Monthly", report_type))
            .category(Category::equals("quarterly", "Quarterly", report_type))
            .category(Category::equals("annual", "Annual", report_type))
            .category(Category::equals("incident", "Incidents", report_type))
            .partition(report_type)
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(mime)
}

/// `POST /api/reports` with the file as multipart form data
pub async fn upload(
    client: &ApiClient,
    file: &Path,
    title: &str,
    report_type: ReportType,
) -> Result<Report> {
    let mut errors = ValidationErrors::new();
    if title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    if report_type == ReportType::Unknown {
        errors.add("type", "Choose a report type");
    }
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    if file_name.is_none() {
        errors.add("file", "Choose a file to upload");
    }
    errors.into_result()?;

    let bytes = std::fs::read(file)?;
    let size = bytes.len();
    let mut upload = Upload::new("file", file_name.unwrap_or_default(), bytes)
        .field("title", title.trim())
        .field("type", report_type.as_str());
    if let Some(mime) = mime_for(file) {
        upload = upload.mime(mime);
    }

    let report: Report = client.create_multipart(Report::COLLECTION, upload).await?;
    info!("Uploaded report #{} ({} bytes)", report.id, size);
    Ok(report)
}

/// `GET /api/reports/<id>/download` into `dest`; returns the byte count
pub async fn download(client: &ApiClient, id: u64, dest: &Path) -> Result<usize> {
    let bytes = client
        .download(&format!("{}/{}/download", Report::COLLECTION, id))
        .await?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, &bytes)?;
    info!("Saved report #{} to {}", id, dest.display());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_mime_guess() {
        assert_eq!(mime_for(Path::new("q1.PDF")), Some("application/pdf"));
        assert_eq!(mime_for(Path::new("notes")), None);
    }

    #[test]
    fn test_report_type_parse() {
        assert_eq!("Yearly".parse::<ReportType>(), Ok(ReportType::Annual));
        assert!("weekly".parse::<ReportType>().is_err());
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reports"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 8, "title": "March", "type": "monthly", "file_name": "march.pdf"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/reports/8/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("march.pdf");
        std::fs::write(&source, b"%PDF-1.7").unwrap();

        let client = ApiClient::new(server.uri()).unwrap();
        let report = upload(&client, &source, "March", ReportType::Monthly).await.unwrap();
        assert_eq!(report.id, 8);
        assert_eq!(report.report_type, Some(ReportType::Monthly));

        let dest = dir.path().join("out").join("copy.pdf");
        assert_eq!(download(&client, 8, &dest).await.unwrap(), 8);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_upload_validates_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let result = upload(&client, Path::new("/tmp/q.pdf"), " ", ReportType::Unknown).await;
        match result {
            Err(Error::Validation(errors)) => {
                assert!(errors.get("title").is_some());
                assert!(errors.get("type").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
