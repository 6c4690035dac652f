use std::sync::Once;
use tracing::debug;

/// Ensures crypto provider is only initialized once.
static INIT_CRYPTO: Once = Once::new();

/// Installs the default cryptographic provider.
///
/// Uses the AWS LC provider. Cargo's feature unification may enable more than one rustls provider,
/// in which case rustls refuses to pick one on its own.
pub fn install_crypto_provider() {
    INIT_CRYPTO.call_once(|| {
        if rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .is_err()
        {
            debug!("a default crypto provider was already installed");
        }
    });
}
