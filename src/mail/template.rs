use std::path::{Path, PathBuf};

use anyhow::Context;
use handlebars::Handlebars;

use crate::schema::Recipient;

use super::Renderer;

/// Handlebars renderer backed by a template file.
///
/// The file is read on every render, so edits to the template
/// are picked up mid-run and a missing file fails each
/// recipient individually instead of the whole run.
///
/// Template context:
/// - `{{name}}`
/// - `{{email}}`
///
/// Strict mode is on: referencing any other field is a render
/// error rather than an empty string.
pub struct TemplateRenderer {
    path: PathBuf,
    hbs: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);

        Self {
            path: path.as_ref().to_path_buf(),
            hbs,
        }
    }
}

#[async_trait::async_trait]
impl Renderer for TemplateRenderer {
    async fn render(&self, recipient: &Recipient) -> anyhow::Result<String> {
        let template = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("cannot read template {}", self.path.display()))?;

        let content = self.hbs.render_template(&template, recipient)?;
        Ok(content)
    }
}
