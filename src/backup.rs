use anyhow::{anyhow, bail, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATASET_DIR: &str = "dataset";
pub const BUNDLE_FORMAT_V1: &str = "lessond-dataset-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub dataset_file: String,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Snapshots the backing spreadsheet into a zip with a checksummed manifest.
pub fn export_dataset_bundle(dataset_path: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let bytes = std::fs::read(dataset_path)
        .with_context(|| format!("failed to read dataset {}", dataset_path.to_string_lossy()))?;
    let file_name = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("dataset path has no file name"))?
        .to_string();
    let sha256 = sha256_hex(&bytes);

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "datasetFile": file_name,
        "sha256": sha256,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(format!("{DATASET_DIR}/{file_name}"), opts)
        .context("failed to start dataset entry")?;
    zip.write_all(&bytes).context("failed to write dataset entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        sha256,
    })
}

/// Replaces the backing spreadsheet with the snapshot in `in_path` after
/// checking the manifest format, file type and checksum.
pub fn import_dataset_bundle(in_path: &Path, dataset_path: &Path) -> anyhow::Result<ImportSummary> {
    let file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(file).context("bundle is not a zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle has no manifest")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("failed to parse manifest")?;

    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {}", format);
    }
    let file_name = manifest
        .get("datasetFile")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("manifest is missing datasetFile"))?
        .to_string();
    let expected_sha = manifest
        .get("sha256")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    if !same_extension(Path::new(&file_name), dataset_path) {
        bail!(
            "bundle holds {} which does not match {}",
            file_name,
            dataset_path.to_string_lossy()
        );
    }

    let mut bytes = Vec::new();
    archive
        .by_name(&format!("{DATASET_DIR}/{file_name}"))
        .context("bundle has no dataset entry")?
        .read_to_end(&mut bytes)
        .context("failed to read dataset entry")?;
    let actual_sha = sha256_hex(&bytes);
    if actual_sha != expected_sha {
        bail!(
            "dataset checksum mismatch (manifest {}, bundle {})",
            expected_sha,
            actual_sha
        );
    }

    std::fs::write(dataset_path, &bytes).with_context(|| {
        format!(
            "failed to write dataset {}",
            dataset_path.to_string_lossy()
        )
    })?;

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        dataset_file: file_name,
    })
}

fn same_extension(a: &Path, b: &Path) -> bool {
    let ext = |p: &Path| {
        p.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
    };
    ext(a).is_some() && ext(a) == ext(b)
}
