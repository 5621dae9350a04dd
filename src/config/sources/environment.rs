//! Environment variable source: DEVSNAP_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `DEVSNAP_SCRIPTS__TIMEOUT_MS=5000` sets `scripts.timeout_ms`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("DEVSNAP")
            .separator("__")
            .try_parsing(true),
    ))
}
