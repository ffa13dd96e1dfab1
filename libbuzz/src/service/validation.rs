//! Content validation service
//!
//! Checks content against the rules every scheduled post must pass before a
//! row is written: not blank, not oversized, within each target platform's
//! character limit.

use serde::Serialize;

use crate::types::{Platform, TargetPlatform};

/// Maximum content size in bytes (100KB)
pub const MAX_CONTENT_LENGTH: usize = 100 * 1024;

/// Service for validating content against platform requirements
///
/// # Example
///
/// ```
/// use libbuzz::service::validation::{ValidationRequest, ValidationService};
/// use libbuzz::TargetPlatform;
///
/// let service = ValidationService::new();
/// let response = service.validate(&ValidationRequest {
///     content: "Launching today!".to_string(),
///     target: TargetPlatform::Both,
/// });
/// assert!(response.valid);
/// assert_eq!(response.results.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationService;

#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub content: String,
    pub target: TargetPlatform,
}

/// Response containing validation results
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResponse {
    /// Whether content is valid for all requested platforms
    pub valid: bool,
    pub results: Vec<PlatformValidation>,
}

impl ValidationResponse {
    /// Every error across platforms, prefixed with the platform name
    pub fn error_messages(&self) -> Vec<String> {
        self.results
            .iter()
            .flat_map(|result| {
                result
                    .errors
                    .iter()
                    .map(move |error| format!("{}: {}", result.platform, error))
            })
            .collect()
    }
}

/// Validation result for a single platform
#[derive(Debug, Clone, Serialize)]
pub struct PlatformValidation {
    pub platform: Platform,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate content for every platform in the request's target
    pub fn validate(&self, request: &ValidationRequest) -> ValidationResponse {
        let results: Vec<PlatformValidation> = request
            .target
            .platforms()
            .iter()
            .map(|platform| self.validate_for_platform(&request.content, *platform))
            .collect();

        ValidationResponse {
            valid: results.iter().all(|result| result.valid),
            results,
        }
    }

    fn validate_for_platform(&self, content: &str, platform: Platform) -> PlatformValidation {
        let mut errors = Vec::new();

        if content.trim().is_empty() {
            errors.push("Content cannot be empty or whitespace-only".to_string());
        }

        if content.len() > MAX_CONTENT_LENGTH {
            errors.push(format!(
                "Content size ({} bytes) exceeds maximum allowed size ({} bytes)",
                content.len(),
                MAX_CONTENT_LENGTH
            ));
        }

        let char_count = content.chars().count();
        let limit = platform.character_limit();
        if char_count > limit {
            errors.push(format!(
                "Content length ({} characters) exceeds {} limit of {} characters",
                char_count, platform, limit
            ));
        }

        PlatformValidation {
            platform,
            valid: errors.is_empty(),
            errors,
        }
    }
}
