//! Prompt Template System
//!
//! Renders the embedded `.pmt` prompt templates with Handlebars. Output is
//! plain text for a model, so HTML escaping is disabled.

pub mod embedded;

use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors from template registration and rendering
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    #[error("Invalid prompt template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Failed to render prompt: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Registry of the embedded prompt templates
pub struct Prompts {
    hbs: Handlebars<'static>,
}

impl Prompts {
    /// Compile every embedded template
    pub fn new() -> Result<Self, PromptError> {
        debug!("Prompts::new: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(no_escape);
        hbs.set_strict_mode(true);

        for name in embedded::NAMES {
            let source = embedded::get_embedded(name).ok_or_else(|| PromptError::NotFound(name.to_string()))?;
            hbs.register_template_string(name, source).map_err(Box::new)?;
        }

        Ok(Self { hbs })
    }

    /// Render a template by name
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, PromptError> {
        debug!(%name, "Prompts::render: called");
        if !self.hbs.has_template(name) {
            return Err(PromptError::NotFound(name.to_string()));
        }
        Ok(self.hbs.render(name, data)?)
    }
}
