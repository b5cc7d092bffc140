// ABOUTME: Model name sanitization for text and image capabilities
// ABOUTME: Unknown or mismatched model names are coerced to a safe default

use std::fmt;

/// Text models that support JSON-schema structured output.
pub const TEXT_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"];
pub const PRIMARY_TEXT_MODEL: &str = "gemini-1.5-flash";
pub const FALLBACK_TEXT_MODEL: &str = "gemini-1.5-pro";

pub const IMAGE_MODELS: &[&str] = &[
    "imagen-3.0-fast-generate-001",
    "imagen-3.0-generate-002",
    "imagen-4.0-generate-001",
];
pub const PRIMARY_IMAGE_MODEL: &str = "imagen-3.0-fast-generate-001";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Text,
    Image,
}

impl Capability {
    fn allow_list(self) -> &'static [&'static str] {
        match self {
            Capability::Text => TEXT_MODELS,
            Capability::Image => IMAGE_MODELS,
        }
    }

    fn primary(self) -> &'static str {
        match self {
            Capability::Text => PRIMARY_TEXT_MODEL,
            Capability::Image => PRIMARY_IMAGE_MODEL,
        }
    }
}

/// A model identifier that is known to be valid for its capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName {
    name: String,
    capability: Capability,
}

impl ModelName {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn primary(capability: Capability) -> Self {
        Self {
            name: capability.primary().to_string(),
            capability,
        }
    }

    pub fn fallback_text() -> Self {
        Self {
            name: FALLBACK_TEXT_MODEL.to_string(),
            capability: Capability::Text,
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lower-case `requested` and keep it only if it is allow-listed for `capability`.
pub fn sanitize(requested: Option<&str>, capability: Capability) -> ModelName {
    let name = requested.unwrap_or_default().trim().to_lowercase();
    if capability.allow_list().contains(&name.as_str()) {
        ModelName { name, capability }
    } else {
        ModelName::primary(capability)
    }
}

/// Image sanitization where the fallback is a configured default rather than the primary.
/// The configured default is itself sanitized.
pub fn sanitize_image(requested: Option<&str>, configured_default: Option<&str>) -> ModelName {
    let default = sanitize(configured_default, Capability::Image);
    let name = requested.unwrap_or_default().trim().to_lowercase();
    if IMAGE_MODELS.contains(&name.as_str()) {
        ModelName {
            name,
            capability: Capability::Image,
        }
    } else {
        default
    }
}
