use anyhow::{Context, Result};
use config::{Config as Settings, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::models::FileCategory;

const LIST_KEYS: [&str; 4] = [
    "image.allowed_mime_types",
    "image.allowed_extensions",
    "pdf.allowed_mime_types",
    "pdf.allowed_extensions",
];

/// Allow-lists for one file category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryOptions {
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

/// Per-category allow-lists. Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileTypeOptions {
    pub image: CategoryOptions,
    pub pdf: CategoryOptions,
}

impl Default for FileTypeOptions {
    fn default() -> Self {
        Self {
            image: CategoryOptions {
                allowed_mime_types: strings(&["image/jpeg", "image/png", "image/gif", "image/webp"]),
                allowed_extensions: strings(&["jpg", "jpeg", "png", "gif", "webp"]),
            },
            pdf: CategoryOptions {
                allowed_mime_types: strings(&["application/pdf"]),
                allowed_extensions: strings(&["pdf"]),
            },
        }
    }
}

impl FileTypeOptions {
    /// Layer built-in defaults, an optional settings file and `FILE_TYPES_*`
    /// environment overrides (e.g. `FILE_TYPES_IMAGE__ALLOWED_EXTENSIONS=png,jpg`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Settings::builder()
            .set_default("image.allowed_mime_types", defaults.image.allowed_mime_types)?
            .set_default("image.allowed_extensions", defaults.image.allowed_extensions)?
            .set_default("pdf.allowed_mime_types", defaults.pdf.allowed_mime_types)?
            .set_default("pdf.allowed_extensions", defaults.pdf.allowed_extensions)?;

        if let Some(path) = path {
            info!("Loading file type options from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let mut env = Environment::with_prefix("FILE_TYPES")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true);
        for key in LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let options: FileTypeOptions = builder
            .add_source(env)
            .build()
            .context("Failed to build file type options")?
            .try_deserialize()
            .context("Failed to deserialize file type options")?;

        let options = options.normalized();
        for category in FileCategory::ALL {
            let rules = options.for_category(category);
            if rules.allowed_extensions.is_empty() || rules.allowed_mime_types.is_empty() {
                warn!(category = %category, "Empty allow-list, every {} upload will be rejected", category);
            }
        }

        Ok(options)
    }

    pub fn for_category(&self, category: FileCategory) -> &CategoryOptions {
        match category {
            FileCategory::Image => &self.image,
            FileCategory::Pdf => &self.pdf,
        }
    }

    /// Trim, lowercase and strip leading dots so lookups compare like with like.
    pub fn normalized(self) -> Self {
        Self {
            image: self.image.normalized(),
            pdf: self.pdf.normalized(),
        }
    }
}

impl CategoryOptions {
    fn normalized(self) -> Self {
        Self {
            allowed_mime_types: self
                .allowed_mime_types
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }

    pub fn allows_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime_type)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
