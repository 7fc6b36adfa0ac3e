// src/export.rs

use crate::models::chat::ChatTurn;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

const HEADER: [&str; 4] = ["id", "user", "bot", "time"];

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 8.0;
const FONT_SIZE_PT: f32 = 11.0;
/// Helvetica at 11pt fits roughly this many characters across A4 minus margins.
const CHARS_PER_LINE: usize = 95;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to read chat log: {0}")]
    Store(#[from] sqlx::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] XlsxError),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "chats.csv",
            ExportFormat::Excel => "chats.xlsx",
            ExportFormat::Pdf => "chats.pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

pub fn render(format: ExportFormat, turns: &[ChatTurn]) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => render_csv(turns),
        ExportFormat::Excel => render_xlsx(turns),
        ExportFormat::Pdf => render_pdf(turns),
    }
}

/// A rendered export and where its copy on disk lives.
#[derive(Debug)]
pub struct Export {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Render `turns` and write them to `dir`, replacing any earlier export of the same format.
///
/// The file is written under a unique temporary name and renamed into place,
/// so a reader never sees a half-written export.
pub async fn write_export(dir: &Path, format: ExportFormat, turns: &[ChatTurn]) -> Result<Export, ExportError> {
    let bytes = render(format, turns)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format.file_name());
    let staging = dir.join(format!(".{}.{}.tmp", format.file_name(), Uuid::new_v4()));
    tokio::fs::write(&staging, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&staging, &path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    tracing::info!("📄 Exported {} turns to {}", turns.len(), path.display());
    Ok(Export { path, bytes })
}

pub fn render_csv(turns: &[ChatTurn]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for turn in turns {
        writer.write_record([
            turn.id.to_string().as_str(),
            turn.user_message.as_str(),
            turn.bot_reply.as_str(),
            turn.timestamp.as_str(),
        ])?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

pub fn render_xlsx(turns: &[ChatTurn]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("chats")?;

    for (col, title) in HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (i, turn) in turns.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_number(row, 0, turn.id as f64)?;
        worksheet.write_string(row, 1, turn.user_message.as_str())?;
        worksheet.write_string(row, 2, turn.bot_reply.as_str())?;
        worksheet.write_string(row, 3, turn.timestamp.as_str())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// The single-line form of a turn used in the PDF export.
pub fn format_turn_line(turn: &ChatTurn) -> String {
    format!("[{}] User: {} | Bot: {}", turn.timestamp, turn.user_message, turn.bot_reply)
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lay out every turn into pages of printable lines.
pub fn layout_pages(turns: &[ChatTurn]) -> Vec<Vec<String>> {
    let lines_per_page = ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM) as usize;
    let mut pages: Vec<Vec<String>> = vec![Vec::new()];

    for turn in turns {
        for line in wrap_text(&format_turn_line(turn), CHARS_PER_LINE) {
            if pages.last().map_or(0, Vec::len) >= lines_per_page {
                pages.push(Vec::new());
            }
            if let Some(page) = pages.last_mut() {
                page.push(line);
            }
        }
    }
    pages
}

pub fn render_pdf(turns: &[ChatTurn]) -> Result<Vec<u8>, ExportError> {
    draw_pages(&layout_pages(turns))
}

/// Draw pre-laid-out pages, one text line per entry.
fn draw_pages(pages: &[Vec<String>]) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Chat history", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    for (page_number, lines) in pages.iter().enumerate() {
        let (page, layer) = if page_number == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Layer {}", page_number + 1))
        };
        let current_layer = doc.get_page(page).get_layer(layer);

        for (n, line) in lines.iter().enumerate() {
            let y = PAGE_HEIGHT_MM - MARGIN_MM - LINE_HEIGHT_MM * (n as f32 + 1.0);
            current_layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
        }
    }

    doc.save_to_bytes().map_err(|e| ExportError::Pdf(e.to_string()))
}
