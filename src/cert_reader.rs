// src/cert_reader.rs
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use x509_parser::pem::parse_x509_pem;

/// Why a certificate file produced no expiration
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("certPath {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("could not open service certificate file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not decode PEM block containing cert data in {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("could not parse certificate from DER data in {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

impl ReadError {
    /// Short failure kind used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ReadError::NotFound { .. } => "not_found",
            ReadError::Open { .. } => "open",
            ReadError::Decode { .. } => "decode",
            ReadError::Parse { .. } => "parse",
        }
    }
}

/// One certificate read from disk, tagged with the service that owns the path
#[derive(Debug, Clone)]
pub struct CertificateRecord {
    pub service: String,
    pub path: PathBuf,
    pub not_after: DateTime<Utc>,
    pub subject: Option<String>,
    pub fingerprint: String,
}

/// Loads PEM-encoded certificates and extracts their expiration
pub struct CertificateReader;

impl CertificateReader {
    /// Read and parse the certificate at `path`
    pub async fn read(service: &str, path: &Path) -> Result<CertificateRecord, ReadError> {
        let content = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ReadError::Open {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        Self::parse_pem(service, path, &content)
    }

    /// Parse the first PEM block in `content` as an X.509 certificate
    pub fn parse_pem(
        service: &str,
        path: &Path,
        content: &[u8],
    ) -> Result<CertificateRecord, ReadError> {
        let (_, pem) = parse_x509_pem(content).map_err(|e| ReadError::Decode {
            path: path.to_path_buf(),
            reason: format!("{:?}", e),
        })?;

        let cert = pem.parse_x509().map_err(|e| ReadError::Parse {
            path: path.to_path_buf(),
            reason: format!("{:?}", e),
        })?;

        let timestamp = cert.validity().not_after.timestamp();
        let not_after = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
            ReadError::Parse {
                path: path.to_path_buf(),
                reason: format!("notAfter out of range: {}", timestamp),
            }
        })?;

        let subject = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string);

        let fingerprint = {
            let mut hasher = Sha256::new();
            hasher.update(&pem.contents);
            hex::encode(hasher.finalize())
        };

        Ok(CertificateRecord {
            service: service.to_string(),
            path: path.to_path_buf(),
            not_after,
            subject,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FIXTURE: &str = include_str!("../tests/fixtures/service.pem");

    #[test]
    fn test_parse_fixture_not_after() {
        let record =
            CertificateReader::parse_pem("Alpha", Path::new("service.pem"), FIXTURE.as_bytes())
                .unwrap();

        assert_eq!(
            record.not_after,
            Utc.with_ymd_and_hms(2036, 10, 13, 8, 0, 45).unwrap()
        );
        assert_eq!(record.service, "Alpha");
        assert_eq!(record.subject.as_deref(), Some("alpha.example.org"));
        assert_eq!(record.fingerprint.len(), 64);
    }

    #[test]
    fn test_text_without_pem_block_is_decode_error() {
        let err = CertificateReader::parse_pem(
            "Alpha",
            Path::new("notes.txt"),
            b"this file holds no certificate\n",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_pem_with_garbage_der_is_parse_error() {
        let garbage = "-----BEGIN CERTIFICATE-----\nbm90IGEgY2VydGlmaWNhdGU=\n-----END CERTIFICATE-----\n";
        let err = CertificateReader::parse_pem("Alpha", Path::new("garbage.pem"), garbage.as_bytes())
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = CertificateReader::read("Alpha", Path::new("/nonexistent/cert.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReadError::NotFound { .. }));
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_directory_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CertificateReader::read("Alpha", dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "open");
    }
}
