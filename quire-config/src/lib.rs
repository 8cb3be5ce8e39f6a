//! Shared configuration loader for quire's pandoc tooling.
//!
//! `defaults/quire.default.toml` is embedded so that the documented defaults and
//! runtime behavior stay in sync. Applications layer user files and overrides on
//! top via [`Loader`], deserialize into [`QuireConfig`], then turn that into the
//! settings `quire_pandoc::{decode, encode}` take.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use quire_pandoc::math::PandocMath;
use quire_pandoc::render::{ChromeRasterizer, PlaceholderRasterizer, Rasterizer, Viewport};
use quire_pandoc::rpng::{ChunkKind, RpngSettings, RpngStrategy};
use quire_pandoc::store::{DirectoryStore, NodeStore};
use quire_pandoc::{
    BridgeOptions, CodecError, DecodeContext, DecodeSettings, EncodeContext, EncodeSettings,
    RpngError,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_TOML: &str = include_str!("../defaults/quire.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct QuireConfig {
    pub pandoc: PandocConfig,
    pub rpng: RpngConfig,
    pub rasterizer: RasterizerConfig,
}

/// How pandoc is invoked.
#[derive(Debug, Clone, Deserialize)]
pub struct PandocConfig {
    pub binary: String,
    pub template: String,
    pub citeproc: bool,
    /// `pandoc-citeproc`, for bibliographies that are not CSL-JSON.
    pub citeproc_binary: String,
    pub standalone: bool,
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpngConfig {
    pub strategy: RpngStrategy,
    pub compress: bool,
    pub elide_outputs: bool,
    pub store_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RasterizerKind {
    Chrome,
    Placeholder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RasterizerConfig {
    pub kind: RasterizerKind,
    pub chrome_binary: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    (!value.trim().is_empty()).then(|| PathBuf::from(value))
}

impl From<&PandocConfig> for BridgeOptions {
    fn from(config: &PandocConfig) -> Self {
        BridgeOptions {
            binary: non_empty_path(&config.binary),
            standalone: config.standalone,
            template: non_empty_path(&config.template),
            citeproc: config.citeproc,
            extra_args: config.extra_args.clone(),
            ..Default::default()
        }
    }
}

impl From<&RpngConfig> for RpngSettings {
    fn from(config: &RpngConfig) -> Self {
        RpngSettings {
            strategy: config.strategy,
            chunk_kind: if config.compress {
                ChunkKind::Compressed
            } else {
                ChunkKind::Text
            },
            elide_outputs: config.elide_outputs,
        }
    }
}

impl RasterizerConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.viewport_width,
            height: self.viewport_height,
        }
    }

    /// A fresh rasterizer handle. Chrome is not started until first used.
    pub fn build(&self) -> Arc<dyn Rasterizer> {
        match self.kind {
            RasterizerKind::Placeholder => Arc::new(PlaceholderRasterizer::default()),
            RasterizerKind::Chrome => {
                let mut chrome = ChromeRasterizer::new().with_viewport(self.viewport());
                if let Some(binary) = non_empty_path(&self.chrome_binary) {
                    chrome = chrome.with_binary(binary);
                }
                Arc::new(chrome)
            }
        }
    }
}

impl QuireConfig {
    /// The configured node store, if any.
    pub fn store(&self) -> Result<Option<Arc<dyn NodeStore>>, CodecError> {
        let Some(dir) = non_empty_path(&self.rpng.store_dir) else {
            return Ok(None);
        };
        let store: Arc<dyn NodeStore> = Arc::new(DirectoryStore::new(dir)?);
        Ok(Some(store))
    }

    /// Settings for encoding into `format`.
    pub fn encode_settings(&self, format: &str) -> Result<EncodeSettings, CodecError> {
        let store = self.store()?;
        if self.rpng.strategy == RpngStrategy::Link && store.is_none() {
            return Err(RpngError::Store(
                "the link strategy needs rpng.store_dir".to_string(),
            )
            .into());
        }
        Ok(EncodeSettings {
            format: format.to_string(),
            bridge: BridgeOptions::from(&self.pandoc),
            ensure_file: false,
            context: EncodeContext {
                rpng: RpngSettings::from(&self.rpng),
                rasterizer: self.rasterizer.build(),
                math: Arc::new(PandocMath::new(non_empty_path(&self.pandoc.binary))),
                store,
            },
        })
    }

    /// Settings for decoding `format`, resolving images against `source_dir`.
    pub fn decode_settings(
        &self,
        format: &str,
        source_dir: Option<&Path>,
    ) -> Result<DecodeSettings, CodecError> {
        Ok(DecodeSettings {
            format: format.to_string(),
            bridge: BridgeOptions::from(&self.pandoc),
            media_dir: None,
            context: DecodeContext {
                source_dir: source_dir.map(Path::to_path_buf),
                store: self.store()?,
                citeproc_binary: non_empty_path(&self.pandoc.citeproc_binary),
            },
        })
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<QuireConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<QuireConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.rpng.strategy, RpngStrategy::Chunk);
        assert!(config.rpng.elide_outputs);
        assert_eq!(config.rasterizer.kind, RasterizerKind::Chrome);
        assert_eq!(config.rasterizer.viewport(), Viewport::default());
        assert!(config.pandoc.extra_args.is_empty());
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(RpngSettings::from(&config.rpng), RpngSettings::default());
        let options = BridgeOptions::from(&config.pandoc);
        assert_eq!(options.binary, None);
        assert_eq!(options.template, None);
        assert!(options.standalone);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("rpng.strategy", "alt-text")
            .expect("override to apply")
            .set_override("rpng.compress", true)
            .expect("override to apply")
            .build()
            .expect("config to build");
        let settings = RpngSettings::from(&config.rpng);
        assert_eq!(settings.strategy, RpngStrategy::AltText);
        assert_eq!(settings.chunk_kind, ChunkKind::Compressed);
    }

    #[test]
    fn layers_user_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(
            &path,
            "[pandoc]\nciteproc = true\nextra_args = [\"--wrap=none\"]\n\n[rasterizer]\nkind = \"placeholder\"\n",
        )
        .unwrap();

        let config = Loader::new()
            .with_file(&path)
            .with_optional_file(dir.path().join("absent.toml"))
            .build()
            .expect("config to build");
        assert!(config.pandoc.citeproc);
        assert_eq!(config.pandoc.extra_args, vec!["--wrap=none"]);
        assert_eq!(config.rasterizer.kind, RasterizerKind::Placeholder);
        // untouched keys keep their defaults
        assert!(config.pandoc.standalone);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Loader::new()
            .with_file(dir.path().join("absent.toml"))
            .build()
            .is_err());
    }

    #[test]
    fn link_strategy_needs_a_store() {
        let config = Loader::new()
            .set_override("rpng.strategy", "link")
            .unwrap()
            .build()
            .unwrap();
        assert!(config.encode_settings("docx").is_err());

        let dir = tempfile::tempdir().unwrap();
        let config = Loader::new()
            .set_override("rpng.strategy", "link")
            .unwrap()
            .set_override("rpng.store_dir", dir.path().display().to_string())
            .unwrap()
            .build()
            .unwrap();
        let settings = config.encode_settings("docx").unwrap();
        assert!(settings.context.store.is_some());
        assert_eq!(settings.format, "docx");

        let decode = config.decode_settings("docx", Some(dir.path())).unwrap();
        assert!(decode.context.store.is_some());
        assert_eq!(decode.context.source_dir.as_deref(), Some(dir.path()));
    }
}
