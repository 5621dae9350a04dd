//! Built-in defaults seeded into every config builder.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

/// Builder pre-populated with defaults so partial files deserialize cleanly.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("storage.encryption.enabled", false)?
        .set_default("storage.encryption.passphrase_env", "DEVSNAP_PASSPHRASE")?
        .set_default("git.timeout_ms", 10_000_i64)?
        .set_default("scripts.timeout_ms", 30_000_i64)?
        .set_default("scripts.script_delay_ms", 500_i64)?
        .set_default("terminal.launch_timeout_ms", 3_000_i64)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "file")
}
