use crate::config::PkgupConfig;
use crate::error::{ConfigError, Result};
use pkgup_bundler::normalize_path;

impl PkgupConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("srcDir", &self.src_dir), ("outDir", &self.out_dir)] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                    hint: "Directories cannot be empty".to_string(),
                }
                .into());
            }
        }

        if normalize_path(&self.src_dir, true) == normalize_path(&self.out_dir, true) {
            return Err(ConfigError::ConflictingOptions(format!(
                "srcDir and outDir both point at {}",
                self.src_dir
            ))
            .into());
        }

        Ok(())
    }
}
