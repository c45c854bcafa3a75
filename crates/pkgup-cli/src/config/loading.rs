use crate::cli::ProjectArgs;
use crate::config::{CONFIG_FILE, ENV_PREFIX, PkgupConfig};
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings layered over the config file; `None` leaves lower layers alone.
///
/// Read in snake_case (`PKGUP_OUT_DIR` arrives as `out_dir`), merged in the
/// file's camelCase.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    src_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sourcemap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<PathBuf>,
}

impl Overrides {
    fn from_env() -> Result<Self> {
        let env = Env::prefixed(ENV_PREFIX).only(&["src_dir", "out_dir", "sourcemap", "minify", "cwd"]);
        Ok(Figment::from(env).extract().map_err(ConfigError::from)?)
    }
}

impl From<&ProjectArgs> for Overrides {
    fn from(args: &ProjectArgs) -> Self {
        Self {
            src_dir: args.src_dir.clone(),
            out_dir: args.out_dir.clone(),
            sourcemap: args.sourcemap.then_some(true),
            minify: args.minify.then_some(true),
            cwd: args.cwd.clone(),
        }
    }
}

impl PkgupConfig {
    /// Load configuration from multiple sources.
    ///
    /// The config file is `args.config` when given, otherwise
    /// `pkgup.config.json` in the working directory if it exists. Relative
    /// paths resolve against `launch_dir`.
    pub fn load(args: &ProjectArgs, launch_dir: &Path) -> Result<Self> {
        let figment = Self::figment(args, launch_dir)?;
        let config: Self = figment.extract().map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// The layered providers, lowest priority first.
    pub fn figment(args: &ProjectArgs, launch_dir: &Path) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = Self::config_file(args, launch_dir)? {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Json::file(path));
        }

        Ok(figment
            .merge(Serialized::defaults(Overrides::from_env()?))
            .merge(Serialized::defaults(Overrides::from(args))))
    }

    fn config_file(args: &ProjectArgs, launch_dir: &Path) -> Result<Option<PathBuf>> {
        if let Some(explicit) = &args.config {
            let path = launch_dir.join(explicit);
            if !path.is_file() {
                return Err(ConfigError::NotFound(path).into());
            }
            return Ok(Some(path));
        }

        let dir = match &args.cwd {
            Some(cwd) => launch_dir.join(cwd),
            None => launch_dir.to_path_buf(),
        };
        let path = dir.join(CONFIG_FILE);
        Ok(path.is_file().then_some(path))
    }
}
