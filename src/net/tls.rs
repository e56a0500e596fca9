//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, std::io::Error> {
    require_file(&config.cert_path, "Certificate")?;
    require_file(&config.key_path, "Private key")?;

    RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await
}

fn require_file(path: &Path, what: &str) -> Result<(), std::io::Error> {
    if path.is_file() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} file not found: {:?}", what, path),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_material_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = TlsConfig {
            enabled: true,
            cert_path: dir.path().join("cert.pem"),
            key_path: dir.path().join("key.pem"),
        };

        let err = load_tls_config(&config).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("Certificate"));
    }
}
