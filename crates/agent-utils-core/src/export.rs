use std::io::{Cursor, Read, Write};

use serde_json::Value;
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::{Document, DocumentFormat};
use crate::error::PackageError;

/// Sections every export bundle must carry, in archive order.
pub const BUNDLE_SECTIONS: [&str; 4] = ["descriptor", "memory", "knowledge", "info"];

const PACKAGE_NAME_PATH: &str = "info.package.name";

/// Export result returned by the agent service, validated for packaging.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    descriptor: Value,
    memory: Value,
    knowledge: Value,
    info: Value,
    package_name: String,
}

impl ExportBundle {
    /// Take the four sections out of a decoded bundle document.
    ///
    /// Fails with [`PackageError::MissingSection`] naming the first absent
    /// section, or `info.package.name` when the package name is not a string.
    pub fn from_document(document: Document) -> Result<Self, PackageError> {
        let mut map = match document {
            Value::Object(map) => map,
            _ => return Err(PackageError::MissingSection(BUNDLE_SECTIONS[0].to_string())),
        };
        let mut take = |section: &str| {
            map.remove(section)
                .ok_or_else(|| PackageError::MissingSection(section.to_string()))
        };
        let descriptor = take("descriptor")?;
        let memory = take("memory")?;
        let knowledge = take("knowledge")?;
        let info = take("info")?;
        let package_name = info
            .get("package")
            .and_then(|package| package.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| PackageError::MissingSection(PACKAGE_NAME_PATH.to_string()))?
            .to_string();
        Ok(Self {
            descriptor,
            memory,
            knowledge,
            info,
            package_name,
        })
    }

    /// Sections paired with their names, in archive order.
    pub fn sections(&self) -> [(&'static str, &Value); 4] {
        [
            (BUNDLE_SECTIONS[0], &self.descriptor),
            (BUNDLE_SECTIONS[1], &self.memory),
            (BUNDLE_SECTIONS[2], &self.knowledge),
            (BUNDLE_SECTIONS[3], &self.info),
        ]
    }

    pub fn archive_file_name(&self) -> String {
        archive_file_name(&self.package_name)
    }
}

/// In-memory ZIP archive ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArchive {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// One file read back out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub contents: String,
}

/// Build the download name for a package: `/`, `-` and spaces become `_`,
/// followed by `_daf.zip`.
pub fn archive_file_name(package_name: &str) -> String {
    let stem: String = package_name
        .chars()
        .map(|c| match c {
            '/' | '-' | ' ' => '_',
            other => other,
        })
        .collect();
    format!("{stem}_daf.zip")
}

/// Serialize each bundle section into `format` and pack all four into a
/// deflate-compressed archive held in memory.
pub fn package(
    bundle: &ExportBundle,
    format: DocumentFormat,
) -> Result<ExportArchive, PackageError> {
    // All sections are encoded before the archive is opened.
    let mut files = Vec::with_capacity(BUNDLE_SECTIONS.len());
    for (section, value) in bundle.sections() {
        let contents = format
            .encode(value)
            .map_err(|source| PackageError::Serialization {
                section: section.to_string(),
                source,
            })?;
        files.push((format!("{section}.{}", format.extension()), contents));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in &files {
        writer.start_file(name.as_str(), entry_options())?;
        writer
            .write_all(contents.as_bytes())
            .map_err(ZipError::from)?;
    }
    let bytes = writer.finish()?.into_inner();

    let file_name = bundle.archive_file_name();
    debug!(
        file_name = %file_name,
        format = %format,
        size = bytes.len(),
        "packaged export bundle"
    );
    Ok(ExportArchive { bytes, file_name })
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Validate a raw bundle document and package it.
pub fn package_document(
    document: Document,
    format: DocumentFormat,
) -> Result<ExportArchive, PackageError> {
    let bundle = ExportBundle::from_document(document)?;
    package(&bundle, format)
}

/// Read every entry of an archive back as UTF-8 text, in archive order.
pub fn unpack(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, PackageError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(ZipError::from)?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            contents,
        });
    }
    Ok(entries)
}
