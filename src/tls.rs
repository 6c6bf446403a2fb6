use std::sync::OnceLock;

/// Select the rustls `ring` crypto provider once per process.
///
/// rustls 0.23 panics on the first TLS handshake if more than one provider is compiled in
/// and none was installed. An `Err` from `install_default` means another component already
/// picked one, which is fine.
pub fn install_rustls_crypto_provider() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
