//! TLS configuration for the portal.
//!
//! The service only speaks HTTPS: it refuses to start without a readable PEM
//! certificate chain and private key. ALPN offers `h2` and `http/1.1`.

use anyhow::{Context, Result, anyhow};
use rustls::{
    ServerConfig,
    pki_types::{CertificateDer, PrivateKeyDer},
};
use rustls_pemfile::{certs, private_key};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Clone)]
pub struct TlsPaths {
    cert: PathBuf,
    key: PathBuf,
}

impl TlsPaths {
    #[must_use]
    pub fn from_cli(cert: String, key: String) -> Self {
        Self {
            cert: PathBuf::from(cert),
            key: PathBuf::from(key),
        }
    }

    #[must_use]
    pub fn cert_path(&self) -> &Path {
        &self.cert
    }

    #[must_use]
    pub fn key_path(&self) -> &Path {
        &self.key
    }
}

/// Build the rustls server configuration from PEM files.
///
/// # Errors
/// Returns an error if the certificate or key cannot be read, parsed, or do
/// not match.
pub fn load_server_config(paths: &TlsPaths) -> Result<ServerConfig> {
    let cert_chain = load_cert_chain(paths.cert_path())?;
    let key = load_private_key(paths.key_path())?;

    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .context("Failed to select TLS protocol versions")?
            .with_no_client_auth()
            .with_single_cert(cert_chain, key)
            .context("TLS certificate and private key do not form a valid pair")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open TLS certificate: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let certs = certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read TLS certificate: {}", path.display()))?;
    if certs.is_empty() {
        return Err(anyhow!("TLS certificate is empty: {}", path.display()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open TLS key: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    private_key(&mut reader)
        .with_context(|| format!("Failed to read TLS key: {}", path.display()))?
        .ok_or_else(|| anyhow!("TLS private key not found: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir(label: &str) -> Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!("portal-tls-test-{label}-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[test]
    fn load_private_key_missing_fails() -> Result<()> {
        let path = scratch_dir("missing")?.join("tls.key");
        assert!(load_private_key(&path).is_err());
        Ok(())
    }

    #[test]
    fn empty_certificate_fails() -> Result<()> {
        let path = scratch_dir("empty")?.join("tls.crt");
        std::fs::write(&path, "")?;
        let err = load_cert_chain(&path).err().map(|err| err.to_string());
        assert!(err.is_some_and(|msg| msg.contains("empty")));
        Ok(())
    }

    #[test]
    fn load_valid_cert_config() -> Result<()> {
        let dir = scratch_dir("valid")?;
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;
        std::fs::write(dir.join("tls.crt"), cert.cert.pem())?;
        std::fs::write(dir.join("tls.key"), cert.key_pair.serialize_pem())?;

        let paths = TlsPaths {
            cert: dir.join("tls.crt"),
            key: dir.join("tls.key"),
        };
        let config = load_server_config(&paths)?;
        assert_eq!(
            config.alpn_protocols,
            vec![b"h2".to_vec(), b"http/1.1".to_vec()]
        );
        Ok(())
    }
}
