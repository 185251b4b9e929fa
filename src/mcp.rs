use anyhow::{Context, Result};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::commands::Options;
use crate::commands::merge::{MergeInput, merge_files};
use crate::commands::split::{RotationPlan, extract_pages};
use crate::file_utils::output_file_name;
use crate::page_range::parse_page_range;
use crate::pdf::PdfDocument;
use crate::rotation::Rotation;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfParsePagesRequest {
    #[schemars(description = "Path to the PDF file the range refers to")]
    pub path: String,
    #[schemars(description = "Page ranges, 1-based (e.g., '1-3, 5, 8-10')")]
    pub pages: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MergeInputRequest {
    #[schemars(description = "Path to a PDF or image (JPEG, PNG, WebP, GIF)")]
    pub path: String,
    #[schemars(description = "Clockwise rotation in degrees: 0, 90, 180 or 270 (default: 0)")]
    #[serde(default)]
    pub rotation: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "Files to merge, in order")]
    pub inputs: Vec<MergeInputRequest>,
    #[schemars(description = "Output file path; '.pdf' is added if missing (default: merged.pdf)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges, 1-based (e.g., '1-3, 5, 8-10')")]
    pub pages: String,
    #[schemars(
        description = "Optional clockwise rotation per selected page, in degrees, added to each page's own rotation"
    )]
    #[serde(default)]
    pub rotations: Option<Vec<i64>>,
    #[schemars(description = "Output file path; '.pdf' is added if missing (default: split.pdf)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    options: Options,
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata, page count and the rotation of every page")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match info(&path) {
            Ok(result) => to_json(&result),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Resolve a page range expression like '1-3, 5, 8-10' against a PDF's page count")]
    fn pdf_parse_pages(&self, Parameters(req): Parameters<PdfParsePagesRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {:#}", e),
        };
        let page_count = doc.page_count();
        let parsed = parse_page_range(&req.pages, page_count);

        let result = ParsePagesResult {
            page_count,
            valid: parsed.valid,
            pages: parsed.to_canonical_string(),
            indices: parsed.indices,
            error: parsed.error,
        };
        to_json(&result)
    }

    #[tool(description = "Merge PDFs and images into one PDF, in order. Each image becomes one page; \
                          a rotation on a PDF input turns every one of its pages.")]
    async fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        let inputs = match req
            .inputs
            .iter()
            .map(|input| {
                Ok(MergeInput {
                    path: PathBuf::from(&input.path),
                    rotation: rotation(input.rotation)?,
                })
            })
            .collect::<Result<Vec<_>>>()
        {
            Ok(inputs) => inputs,
            Err(e) => return format!("Error: {:#}", e),
        };

        let mut progress = |percent: u8| tracing::debug!(percent, "merge progress");
        let (queue, bytes) =
            match merge_files(&inputs, self.options.max_file_size, &mut progress).await {
                Ok(merged) => merged,
                Err(e) => return format!("Error: {:#}", e),
            };

        let output_path = output_file_name(req.output.as_deref().unwrap_or_default(), "merged");
        if let Err(e) = write_output(&output_path, &bytes).await {
            return format!("Error: {:#}", e);
        }

        let result = MergeResult {
            output_path,
            file_count: queue.len(),
            page_count: queue.total_pages(),
            size_bytes: bytes.len() as u64,
        };
        to_json(&result)
    }

    #[tool(description = "Extract selected pages of a PDF into a new file, optionally rotating each one")]
    async fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        let plan = match &req.rotations {
            None => RotationPlan::Keep,
            Some(degrees) => match degrees.iter().map(|&d| rotation(d)).collect::<Result<_>>() {
                Ok(rotations) => RotationPlan::PerPage(rotations),
                Err(e) => return format!("Error: {:#}", e),
            },
        };

        let mut progress = |percent: u8| tracing::debug!(percent, "split progress");
        let extracted = extract_pages(
            Path::new(&req.path),
            &req.pages,
            &plan,
            self.options.max_file_size,
            &mut progress,
        )
        .await;
        let (page_count, bytes) = match extracted {
            Ok(extracted) => extracted,
            Err(e) => return format!("Error: {:#}", e),
        };

        let output_path = output_file_name(req.output.as_deref().unwrap_or_default(), "split");
        if let Err(e) = write_output(&output_path, &bytes).await {
            return format!("Error: {:#}", e);
        }

        let result = SplitResult {
            output_path,
            page_count,
            size_bytes: bytes.len() as u64,
        };
        to_json(&result)
    }
}

fn info(path: &str) -> Result<PdfInfoResult> {
    let size_bytes = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path))?
        .len();
    let doc = PdfDocument::open(path)?;
    let info = doc.get_info();

    Ok(PdfInfoResult {
        path: doc.name.clone(),
        size_bytes,
        version: info.version,
        page_count: info.page_count,
        rotations: doc.page_rotations(),
        title: info.title,
        author: info.author,
        creator: info.creator,
        producer: info.producer,
        creation_date: info.creation_date,
        mod_date: info.mod_date,
    })
}

fn rotation(degrees: i64) -> Result<Rotation> {
    Rotation::from_degrees(degrees)
        .with_context(|| format!("Rotation must be a multiple of 90 degrees: {}", degrees))
}

async fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to save PDF: {}", path))
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    pub size_bytes: u64,
    pub version: String,
    pub page_count: u32,
    /// Clockwise degrees, one per page
    pub rotations: Vec<Rotation>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ParsePagesResult {
    pub page_count: u32,
    pub valid: bool,
    /// 1-based, comma-separated
    pub pages: String,
    /// 0-based
    pub indices: Vec<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MergeResult {
    pub output_path: String,
    pub file_count: usize,
    pub page_count: u64,
    pub size_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SplitResult {
    pub output_path: String,
    pub page_count: usize,
    pub size_bytes: u64,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF merge and split tools. Use pdf_info to see page count and page rotations, \
                 pdf_parse_pages to check a page range, pdf_merge to combine PDFs and images \
                 into one PDF, and pdf_split to extract (and rotate) selected pages."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(options: Options) -> Result<()> {
    let server = PdfServer::new(options);
    tracing::info!(max_file_size = options.max_file_size, "starting MCP server on stdio");

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
