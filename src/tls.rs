//! TLS configuration shared by the WebSocket feed and the REST client.
//!
//! Builds a [`rustls::ClientConfig`] trusting the Mozilla root set shipped
//! in `webpki-roots`, optionally extended with the certificates from a
//! PEM bundle (for corporate proxies or local test servers).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::ClientConfig;
use tracing::info;

use crate::CoinwatchError;
use crate::Result;

/// Builds a [`ClientConfig`] whose root store contains the webpki roots
/// plus every certificate found in `extra_roots`, if given.
///
/// # Errors
///
/// Returns [`CoinwatchError::Tls`] if the bundle cannot be read or parsed.
pub fn build_tls_config(extra_roots: Option<&Path>) -> Result<ClientConfig> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(path) = extra_roots {
        let file = File::open(path).map_err(|e| {
            CoinwatchError::Tls(format!("failed to open CA bundle {}: {e}", path.display()))
        })?;
        let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CoinwatchError::Tls(format!("failed to parse CA PEM: {e}")))?;

        let (added, ignored) = root_store.add_parsable_certificates(certs);
        info!(added, ignored, path = %path.display(), "Loaded extra CA roots");
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| CoinwatchError::Tls(format!("unsupported protocol versions: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(config)
}
