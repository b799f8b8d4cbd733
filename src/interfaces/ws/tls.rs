//! TLS configuration for the charge-point listener
//!
//! TLS is enabled only when both a certificate and a private key are
//! configured. The listener pins a single ECDHE-RSA suite; rustls ships no
//! CBC suites, so the closest modern equivalent of the legacy
//! ECDHE-RSA-AES128-SHA is pinned (AES-128-GCM, TLS 1.2). Stations that
//! require the CBC suite must terminate TLS in front of this service.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;
use tracing::info;

use crate::support::errors::InfraError;

pub fn load_tls_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<TlsAcceptor, InfraError> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let provider = rustls::crypto::CryptoProvider {
        cipher_suites: vec![
            rustls::crypto::ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        ],
        ..rustls::crypto::ring::default_provider()
    };

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS12])
        .map_err(|e| InfraError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| InfraError::Tls(e.to_string()))?;

    info!(
        cert = %cert_path.display(),
        key = %key_path.display(),
        cipher = "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
        "TLS enabled for charge-point listener"
    );

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, InfraError> {
    let file = File::open(path)
        .map_err(|e| InfraError::Tls(format!("cannot open certificate {}: {e}", path.display())))?;
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<_, _>>()
        .map_err(|e| InfraError::Tls(format!("invalid certificate: {e}")))?;
    if certs.is_empty() {
        return Err(InfraError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, InfraError> {
    let file = File::open(path)
        .map_err(|e| InfraError::Tls(format!("cannot open private key {}: {e}", path.display())))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| InfraError::Tls(format!("invalid private key: {e}")))?
        .ok_or_else(|| InfraError::Tls(format!("no private key found in {}", path.display())))
}
