use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::template::render_recipe;
use crate::{Ecosystem, RecipeError, RenderConfig};

pub const META_YAML: &str = "meta.yaml";
pub const META_YAML_ORIG: &str = "meta.yaml.orig";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PackageSection {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct BuildSection {
    #[serde(default, deserialize_with = "scalar_string")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub string: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RequirementsSection {
    #[serde(default, deserialize_with = "string_list")]
    pub build: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub host: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub run: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TestSection {
    #[serde(default, deserialize_with = "string_list")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub source_files: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub requires: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub imports: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub commands: Vec<String>,
}

/// The parts of a conda recipe that matter for re-running its tests.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RecipeMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub package: PackageSection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub build: BuildSection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: RequirementsSection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test: TestSection,
}

impl RecipeMetadata {
    pub fn from_yaml_str(input: &str, config: &RenderConfig) -> Result<Self, RecipeError> {
        let rendered = render_recipe(input, config)?;
        if rendered.trim().is_empty() {
            return Err(RecipeError::MissingField("package/name"));
        }
        let metadata: Self =
            serde_yaml::from_str(&rendered).map_err(|err| RecipeError::Yaml(err.to_string()))?;
        metadata.validate(config)?;
        Ok(metadata)
    }

    fn validate(&self, config: &RenderConfig) -> Result<(), RecipeError> {
        if self.package.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(RecipeError::MissingField("package/name"));
        }
        if self
            .package
            .version
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
        {
            return Err(RecipeError::MissingField("package/version"));
        }

        if config.numpy.is_none() {
            let requirements = &self.requirements;
            for requirement in requirements
                .build
                .iter()
                .chain(&requirements.host)
                .chain(&requirements.run)
            {
                let mut tokens = requirement.split_whitespace();
                if tokens.next() == Some("numpy") && tokens.next() == Some("x.x") {
                    return Err(RecipeError::UnresolvedNumpyPin {
                        requirement: requirement.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.package.name.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.package
            .version
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
    }

    pub fn build_number(&self) -> &str {
        self.build
            .number
            .as_deref()
            .map(str::trim)
            .filter(|number| !number.is_empty())
            .unwrap_or("0")
    }

    pub fn build_string(&self) -> &str {
        self.build
            .string
            .as_deref()
            .map(str::trim)
            .filter(|string| !string.is_empty())
            .unwrap_or_else(|| self.build_number())
    }

    /// `name-version-build`, the identifier conda prints for a package.
    pub fn dist(&self) -> String {
        format!("{}-{}-{}", self.name(), self.version(), self.build_string())
    }

    pub fn ecosystem(&self) -> Ecosystem {
        Ecosystem::from_package_name(self.name())
    }
}

/// A parsed recipe together with the directory its relative paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    dir: PathBuf,
    metadata: RecipeMetadata,
}

impl Recipe {
    pub fn new(dir: impl Into<PathBuf>, metadata: RecipeMetadata) -> Self {
        Self {
            dir: dir.into(),
            metadata,
        }
    }

    /// Reads and parses `metadata_file`, treating `dir` as the recipe root.
    pub fn load(dir: &Path, metadata_file: &Path, config: &RenderConfig) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(metadata_file).with_context(|| {
            format!("failed to read recipe metadata: {}", metadata_file.display())
        })?;
        let metadata = RecipeMetadata::from_yaml_str(&raw, config).with_context(|| {
            format!(
                "failed to parse recipe metadata: {}",
                metadata_file.display()
            )
        })?;
        Ok(Self::new(dir, metadata))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metadata(&self) -> &RecipeMetadata {
        &self.metadata
    }

    /// A test script shipped next to `meta.yaml` (`run_test.py`, `run_test.sh`, ...).
    pub fn bundled_script(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.dir.join(file_name);
        path.is_file().then_some(path)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(&other).into_iter().collect(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
