//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{OpfError, Result};
use crate::operation::signature::is_legal_package;
use crate::reflection::accessibility::VisibilityPredicate;
use crate::reflection::instantiator::DEFAULT_REUSE_PROBABILITY;
use crate::reflection::model::ClassNameErrorHandler;

/// Full opforge configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub visibility: VisibilityConfig,
    pub omission: OmissionConfig,
    pub instantiation: InstantiationConfig,
    pub inputs: InputsConfig,
    pub logging: LoggingConfig,
}

/// Which visibility policy applies to generated tests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityPolicy {
    #[default]
    Public,
    NotPrivate,
    Package,
    Everything,
}

impl VisibilityPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::NotPrivate => "not_private",
            Self::Package => "package",
            Self::Everything => "everything",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "public" => Some(Self::Public),
            "not_private" => Some(Self::NotPrivate),
            "package" => Some(Self::Package),
            "everything" => Some(Self::Everything),
            _ => None,
        }
    }
}

/// Visibility of the classes and members tests may name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct VisibilityConfig {
    pub policy: VisibilityPolicy,
    /// Package the tests live in; required by the `package` policy. Empty
    /// means the unnamed package.
    pub package: Option<String>,
}

impl VisibilityConfig {
    #[must_use]
    pub fn predicate(&self) -> VisibilityPredicate {
        match self.policy {
            VisibilityPolicy::Public => VisibilityPredicate::PublicOnly,
            VisibilityPolicy::NotPrivate => VisibilityPredicate::NotPrivate,
            VisibilityPolicy::Package => {
                VisibilityPredicate::Package(self.package.clone().unwrap_or_default())
            }
            VisibilityPolicy::Everything => VisibilityPredicate::Everything,
        }
    }
}

/// Members excluded from the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct OmissionConfig {
    /// Regexes matched against raw signatures of constructors and methods.
    pub methods: Vec<String>,
    /// Fully qualified field names (`pkg.C.f`).
    pub fields: Vec<String>,
}

/// Knobs of the type-parameter instantiator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstantiationConfig {
    pub seed: u64,
    /// Weight of reusing a pool instantiation of the declaring type over
    /// building a fresh one.
    pub reuse_probability: f64,
}

impl Default for InstantiationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            reuse_probability: DEFAULT_REUSE_PROBABILITY,
        }
    }
}

/// What the model is built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct InputsConfig {
    /// Class universe descriptor (JSON).
    pub universe: Option<PathBuf>,
    pub test_classes: Vec<String>,
    pub covered_classes: Vec<String>,
    pub method_signatures: Vec<String>,
    pub literals_files: Vec<PathBuf>,
    /// Executable specifications keyed by signature (JSON).
    pub specifications: Option<PathBuf>,
    pub class_name_errors: ClassNameErrorHandler,
}

/// Where diagnostics go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub diagnostics_log: Option<PathBuf>,
    pub verbose: bool,
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("opforge").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| OpfError::io(&path_buf, source))?;
            Self::from_toml(&raw)?
        } else if is_explicit_path {
            return Err(OpfError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse TOML text without env overrides or validation.
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, so the value is stable across
    /// processes and toolchains.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("OPF_SEED") {
            self.instantiation.seed = parse_env_u64("OPF_SEED", &raw)?;
        }
        if let Some(raw) = lookup("OPF_REUSE_PROBABILITY") {
            self.instantiation.reuse_probability = parse_env_f64("OPF_REUSE_PROBABILITY", &raw)?;
        }

        if let Some(raw) = lookup("OPF_VISIBILITY") {
            self.visibility.policy =
                VisibilityPolicy::parse(&raw).ok_or_else(|| OpfError::ConfigParse {
                    context: "env",
                    details: format!(
                        "OPF_VISIBILITY={raw:?}: expected public, not_private, package or everything"
                    ),
                })?;
        }
        if let Some(raw) = lookup("OPF_PACKAGE") {
            self.visibility.package = Some(raw.trim().to_string());
        }

        // One pattern per line; patterns may contain commas.
        if let Some(raw) = lookup("OPF_OMIT_METHODS") {
            self.omission.methods = raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(raw) = lookup("OPF_VERBOSE") {
            self.logging.verbose = parse_env_bool("OPF_VERBOSE", &raw)?;
        }
        if let Some(raw) = lookup("OPF_DIAGNOSTICS_LOG") {
            self.logging.diagnostics_log = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        validate_prob(
            "instantiation.reuse_probability",
            self.instantiation.reuse_probability,
        )?;

        match (&self.visibility.policy, self.visibility.package.as_deref()) {
            (VisibilityPolicy::Package, None) => {
                return Err(OpfError::InvalidConfig {
                    details: "visibility.policy = \"package\" requires visibility.package"
                        .to_string(),
                });
            }
            (_, Some(package)) if !package.is_empty() && !is_legal_package(package) => {
                return Err(OpfError::InvalidConfig {
                    details: format!("visibility.package {package:?} is not a legal package name"),
                });
            }
            _ => {}
        }

        for pattern in &self.omission.methods {
            regex::Regex::new(pattern).map_err(|error| OpfError::InvalidConfig {
                details: format!("omission.methods pattern {pattern:?}: {error}"),
            })?;
        }

        for field in &self.omission.fields {
            if !field.contains('.') {
                return Err(OpfError::InvalidConfig {
                    details: format!("omission.fields entry {field:?} must be pkg.Class.field"),
                });
            }
        }

        Ok(())
    }
}

fn validate_prob(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(OpfError::InvalidConfig {
            details: format!("{name} must be in [0,1], got {value}"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|error| OpfError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_f64(name: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|error| OpfError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim().parse::<bool>().map_err(|error| OpfError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
