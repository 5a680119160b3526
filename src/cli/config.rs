use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::args::CliArgs;
use typecodec_common::limits::MAX_DOCUMENT_DEPTH;
use typecodec_gen::GeneratorConfig;
use typecodec_runtime::DecoderConfig;
use typecodec_types::Inclusion;

pub const CONFIG_FILE_NAME: &str = "typecodec.json";

/// Custom deserializer for boolean options that accepts both bool and string values.
/// This handles cases where typecodec.json contains `"ignoreUnknown": "true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => {
            let normalized = s.trim().to_lowercase();
            match normalized.as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(Error::custom(format!(
                    "invalid boolean value: '{}'. Expected true, false, 'true', or 'false'",
                    s
                ))),
            }
        }
    }
}

/// Contents of `typecodec.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypecodecConfig {
    #[serde(deserialize_with = "deserialize_bool_or_string")]
    pub ignore_unknown: bool,
    pub inclusion: Inclusion,
    pub decoder: DecoderConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitsConfig {
    /// Nested codec invocations allowed while evaluating one document.
    pub max_document_depth: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_depth: MAX_DOCUMENT_DEPTH,
        }
    }
}

/// Options after applying command-line overrides to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub generator: GeneratorConfig,
    pub decoder: DecoderConfig,
    pub max_document_depth: u32,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        let config = TypecodecConfig::default();
        ResolvedOptions {
            generator: GeneratorConfig {
                ignore_unknown: config.ignore_unknown,
                inclusion: config.inclusion,
            },
            decoder: config.decoder,
            max_document_depth: config.limits.max_document_depth,
        }
    }
}

impl ResolvedOptions {
    /// The resolved options in file form, for `--showConfig`.
    pub fn to_config(&self) -> TypecodecConfig {
        TypecodecConfig {
            ignore_unknown: self.generator.ignore_unknown,
            inclusion: self.generator.inclusion,
            decoder: self.decoder,
            limits: LimitsConfig {
                max_document_depth: self.max_document_depth,
            },
        }
    }
}

pub fn parse_config(source: &str) -> Result<TypecodecConfig> {
    if source.trim().is_empty() {
        return Ok(TypecodecConfig::default());
    }
    let config = serde_json::from_str(source)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<TypecodecConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config(&source).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Locate the config file.
///
/// An explicit path may name the file or a directory holding
/// `typecodec.json`, and must exist. Without one, `typecodec.json` in `cwd`
/// is used when present.
pub fn find_config(cwd: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(explicit) = explicit else {
        let candidate = cwd.join(CONFIG_FILE_NAME);
        return Ok(candidate.is_file().then_some(candidate));
    };
    let path = if explicit.is_absolute() {
        explicit.to_path_buf()
    } else {
        cwd.join(explicit)
    };
    let path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path
    };
    if !path.is_file() {
        bail!("config file not found: {}", path.display());
    }
    Ok(Some(path))
}

/// Command-line flags win over file values. Boolean flags can only turn an
/// option on.
pub fn resolve_options(config: &TypecodecConfig, args: &CliArgs) -> ResolvedOptions {
    let inclusion = args
        .inclusion
        .map(|arg| arg.to_inclusion())
        .unwrap_or(config.inclusion);
    ResolvedOptions {
        generator: GeneratorConfig {
            ignore_unknown: config.ignore_unknown || args.ignore_unknown,
            inclusion,
        },
        decoder: DecoderConfig {
            use_big_decimal_for_floats: config.decoder.use_big_decimal_for_floats || args.big_decimal_for_floats,
            use_big_integer_for_ints: config.decoder.use_big_integer_for_ints || args.big_integer_for_ints,
        },
        max_document_depth: args.max_depth.unwrap_or(config.limits.max_document_depth),
    }
}

/// Find, load and resolve in one step.
pub fn load_options(cwd: &Path, args: &CliArgs) -> Result<ResolvedOptions> {
    let config = match find_config(cwd, args.config.as_deref())? {
        Some(path) => load_config(&path)?,
        None => TypecodecConfig::default(),
    };
    Ok(resolve_options(&config, args))
}
