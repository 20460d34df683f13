use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use logbook_core::authz::{authorize, Action};
use logbook_core::catalog::LogKind;
use logbook_core::models::{EntryFilter, EntryStatus, LogEntry, UserId};
use logbook_core::{LogbookError, RequestContext};

use crate::LogbookService;

const CSV_HEADERS: [&str; 9] = [
    "kind",
    "id",
    "category",
    "date",
    "status",
    "signer_id",
    "submitted_at",
    "reviewed_at",
    "fields",
];

// A4 in points, Courier 9pt.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const LEADING: i64 = 14;
const FONT_SIZE: i64 = 9;
const MAX_LINE_CHARS: usize = 95;

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub entries: usize,
    /// `(sha256, file name)` in manifest order.
    pub files: Vec<(String, String)>,
}

impl LogbookService {
    /// SIGNED entries of one student across every kind, oldest first
    /// within each kind.
    pub async fn signed_entries(
        &self,
        ctx: &RequestContext,
        student_id: &UserId,
    ) -> logbook_core::Result<Vec<LogEntry>> {
        let resource = self.resource_for(ctx, student_id).await?;
        authorize(Action::ViewStudent, ctx, &resource)?;

        let filter = EntryFilter {
            students: Some(vec![student_id.clone()]),
            status: Some(EntryStatus::Signed),
        };
        let mut signed = Vec::new();
        for kind in LogKind::ALL {
            let mut entries = self.store.list_entries(kind, &filter).await?;
            entries.reverse();
            signed.extend(entries);
        }
        Ok(signed)
    }

    pub async fn logbook_csv(&self, ctx: &RequestContext, student_id: &UserId) -> logbook_core::Result<Vec<u8>> {
        let entries = self.signed_entries(ctx, student_id).await?;
        render_csv(&entries).map_err(|e| LogbookError::Internal(format!("{:#}", e)))
    }

    /// Writes `logbook.csv`, `logbook.pdf` and a `sha256.txt` manifest
    /// covering both into `output_dir`.
    pub async fn export_logbook(
        &self,
        ctx: &RequestContext,
        student_id: &UserId,
        output_dir: &Path,
    ) -> Result<ExportSummary> {
        // 1. Fetch data
        let entries = self
            .signed_entries(ctx, student_id)
            .await
            .context("Failed to collect signed entries")?;

        // 2. Prepare output directory
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        // 3. Render both documents
        let csv_path = output_dir.join("logbook.csv");
        fs::write(&csv_path, render_csv(&entries)?)?;

        let pdf_path = output_dir.join("logbook.pdf");
        fs::write(&pdf_path, render_pdf(student_id, &entries)?)?;

        // 4. Write manifest
        let mut files = Vec::new();
        for path in [&csv_path, &pdf_path] {
            let hash = calculate_file_hash(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            files.push((hash, name));
        }

        let manifest_path = output_dir.join("sha256.txt");
        let mut manifest_file = BufWriter::new(File::create(manifest_path)?);
        for (hash, filename) in &files {
            writeln!(manifest_file, "{}  {}", hash, filename)?;
        }
        manifest_file.flush()?;

        tracing::info!(
            student = %student_id,
            actor = %ctx.user_id,
            entries = entries.len(),
            dir = %output_dir.display(),
            "logbook exported"
        );

        Ok(ExportSummary {
            output_dir: output_dir.to_path_buf(),
            entries: entries.len(),
            files,
        })
    }
}

fn entry_date(entry: &LogEntry) -> &str {
    entry.fields.get("date").and_then(|v| v.as_str()).unwrap_or("")
}

fn format_ts(ts: Option<time::OffsetDateTime>) -> Result<String> {
    match ts {
        Some(ts) => Ok(ts.format(&time::format_description::well_known::Rfc3339)?),
        None => Ok(String::new()),
    }
}

/// One row per entry; the clinical fields travel as a JSON object column.
pub fn render_csv(entries: &[LogEntry]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for entry in entries {
        writer.write_record([
            entry.kind.slug().to_string(),
            entry.id.to_string(),
            entry.category.clone(),
            entry_date(entry).to_string(),
            entry.status.to_string(),
            entry.signer_id.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            format_ts(entry.submitted_at)?,
            format_ts(entry.reviewed_at)?,
            serde_json::to_string(&entry.fields)?,
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

/// Plain text listing, one line per entry, paginated on A4.
pub fn render_pdf(student_id: &UserId, entries: &[LogEntry]) -> Result<Vec<u8>> {
    let mut lines = vec![
        format!("Residency logbook: {}", student_id),
        format!("Signed entries: {}", entries.len()),
        String::new(),
    ];
    for entry in entries {
        lines.push(pdf_line(entry));
    }

    let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for chunk in lines.chunks(lines_per_page) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
        ];
        for line in chunk {
            operations.push(Operation::new("Tj", vec![Object::string_literal(pdf_text(line))]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).context("Failed to serialize PDF")?;
    Ok(buf)
}

fn pdf_line(entry: &LogEntry) -> String {
    let signer = entry.signer_id.as_ref().map(UserId::as_str).unwrap_or("-");
    format!(
        "{:<10}  {:<18}  {:<24}  signed by {}",
        entry_date(entry),
        entry.kind.label(),
        entry.category,
        signer
    )
}

// Courier via the standard encoding only covers ASCII.
fn pdf_text(line: &str) -> String {
    line.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .take(MAX_LINE_CHARS)
        .collect()
}

// Synchronous hashing helper
fn calculate_file_hash(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbook_core::models::NewEntry;
    use serde_json::json;

    fn signed_entry(kind: LogKind, category: &str) -> LogEntry {
        let mut entry = LogEntry::new(
            kind,
            UserId::new("s1"),
            NewEntry {
                category: category.to_string(),
                fields: json!({ "date": "2026-01-15", "topic": "Stroke, \"hyperacute\" imaging" })
                    .as_object()
                    .cloned()
                    .unwrap(),
                submit: true,
            },
        );
        entry.status = EntryStatus::Signed;
        entry.signer_id = Some(UserId::new("f1"));
        entry
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_entry() {
        let entries = vec![
            signed_entry(LogKind::Seminar, "departmental"),
            signed_entry(LogKind::Seminar, "grand-rounds"),
        ];
        let bytes = render_csv(&entries).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADERS.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "seminar");
        assert_eq!(&rows[1][2], "grand-rounds");
        assert_eq!(&rows[0][3], "2026-01-15");
        assert_eq!(&rows[0][5], "f1");

        // Quoting keeps the embedded JSON intact.
        let fields: serde_json::Value = serde_json::from_str(&rows[0][8]).unwrap();
        assert_eq!(fields["topic"], "Stroke, \"hyperacute\" imaging");
    }

    #[test]
    fn test_pdf_paginates() {
        let entries: Vec<LogEntry> = (0..120)
            .map(|_| signed_entry(LogKind::Seminar, "departmental"))
            .collect();
        let bytes = render_pdf(&UserId::new("s1"), &entries).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_pdf_text_is_ascii_and_bounded() {
        let text = pdf_text(&format!("Café {}", "x".repeat(200)));
        assert!(text.starts_with("Caf? "));
        assert_eq!(text.chars().count(), MAX_LINE_CHARS);
    }
}
