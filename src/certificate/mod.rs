//! Certificate identifiers and PDF rendering.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod jpeg;
pub mod pdf;

use jpeg::{JpegError, JpegImage};
use pdf::{Font, PAGE_HEIGHT, PAGE_WIDTH, PageBuilder};

pub type CertificateResult<T> = std::result::Result<T, CertificateError>;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("certificate template error: {0}")]
    TemplateError(#[from] JpegError),
}

/// `CERT-YYYYMMDD-XXXXXXXX`, the suffix being 8 upper-case hex digits of a random UUID.
pub fn generate_code(issued_at: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "CERT-{}-{}",
        issued_at.format("%Y%m%d"),
        random[..8].to_uppercase()
    )
}

pub fn is_valid_code(code: &str) -> bool {
    let mut parts = code.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("CERT"), Some(date), Some(suffix), None) => {
            date.len() == 8
                && date.chars().all(|c| c.is_ascii_digit())
                && suffix.len() == 8
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        }
        _ => false,
    }
}

/// What gets printed on the certificate.
#[derive(Debug, Clone)]
pub struct CertificateContent<'a> {
    pub learner_name: &'a str,
    pub course_title: &'a str,
    pub issued_at: DateTime<Utc>,
    pub code: &'a str,
}

pub async fn read_template(path: &Path) -> CertificateResult<JpegImage> {
    let bytes = tokio::fs::read(path).await?;
    Ok(JpegImage::from_bytes(bytes)?)
}

/// Loads the background image. Any problem is logged and yields `None`, so the certificate
/// falls back to a plain bordered page.
pub async fn load_template(path: Option<&Path>) -> Option<JpegImage> {
    let path = path?;
    match read_template(path).await {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(
                "certificate template {} unusable, using plain border: {}",
                path.display(),
                e
            );
            None
        }
    }
}

pub fn render(content: &CertificateContent<'_>, template: Option<JpegImage>) -> Vec<u8> {
    let mut page = match template {
        Some(image) => PageBuilder::new().background(image),
        None => PageBuilder::new(),
    };

    if !page.has_background() {
        page.gray(0.2)
            .rect(20.0, 20.0, PAGE_WIDTH - 40.0, PAGE_HEIGHT - 40.0, 3.0)
            .rect(30.0, 30.0, PAGE_WIDTH - 60.0, PAGE_HEIGHT - 60.0, 1.0);
    }

    page.gray(0.1)
        .centered_text(Font::Bold, 36.0, 430.0, "Certificate of Completion")
        .centered_text(Font::Regular, 16.0, 375.0, "This certifies that")
        .centered_text(Font::Bold, 28.0, 330.0, content.learner_name)
        .centered_text(Font::Regular, 16.0, 290.0, "has successfully completed")
        .centered_text(Font::Bold, 22.0, 250.0, content.course_title)
        .centered_text(
            Font::Regular,
            12.0,
            150.0,
            &format!("Issued on {}", content.issued_at.format("%B %-d, %Y")),
        )
        .centered_text(
            Font::Regular,
            12.0,
            128.0,
            &format!("Certificate ID: {}", content.code),
        );

    page.finish()
}

pub fn file_path_for(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{}.pdf", code))
}

pub async fn write_pdf(dir: &Path, code: &str, bytes: &[u8]) -> CertificateResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = file_path_for(dir, code);
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!("certificate written to {}", path.display());
    Ok(path)
}

/// Removes a file written for a certificate that lost the insert race.
pub async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("unable to remove orphan certificate {}: {}", path.display(), e);
    }
}
