//! HTML email bodies rendered with Tera.
//!
//! The templates are embedded at compile time so the binary never depends on
//! the working directory.

use tera::{Context, Tera};
use thiserror::Error;

const QUOTE_PRICED: &str = "quote_priced.html";
const QUOTE_MANUAL: &str = "quote_manual.html";
const SCHEDULING: &str = "scheduling.html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{name}` failed to load: {message}")]
    Load { name: &'static str, message: String },
    #[error("template `{name}` failed to render: {message}")]
    Render { name: &'static str, message: String },
}

/// Which quote email body was rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteTemplate {
    Priced,
    ManualFollowUp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
    pub template: QuoteTemplate,
    pub html: String,
}

#[derive(Clone, Debug)]
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn embedded() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        for (name, source) in [
            (QUOTE_PRICED, include_str!("../../../templates/email/quote_priced.html")),
            (QUOTE_MANUAL, include_str!("../../../templates/email/quote_manual.html")),
            (SCHEDULING, include_str!("../../../templates/email/scheduling.html")),
        ] {
            tera.add_raw_template(name, source)
                .map_err(|error| TemplateError::Load { name, message: error.to_string() })?;
        }

        Ok(Self { tera })
    }

    pub fn render_priced_quote(
        &self,
        first_name: &str,
        quote_price: &str,
        invoice_url: &str,
    ) -> Result<RenderedEmail, TemplateError> {
        let mut context = Context::new();
        context.insert("first_name", first_name);
        context.insert("quote_price", quote_price);
        context.insert("invoice_url", invoice_url);

        Ok(RenderedEmail {
            template: QuoteTemplate::Priced,
            html: self.render(QUOTE_PRICED, &context)?,
        })
    }

    pub fn render_manual_quote(&self, first_name: &str) -> Result<RenderedEmail, TemplateError> {
        let mut context = Context::new();
        context.insert("first_name", first_name);

        Ok(RenderedEmail {
            template: QuoteTemplate::ManualFollowUp,
            html: self.render(QUOTE_MANUAL, &context)?,
        })
    }

    pub fn render_scheduling(
        &self,
        first_name: &str,
        scheduling_url: &str,
    ) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("first_name", first_name);
        context.insert("scheduling_url", scheduling_url);

        self.render(SCHEDULING, &context)
    }

    fn render(&self, name: &'static str, context: &Context) -> Result<String, TemplateError> {
        self.tera
            .render(name, context)
            .map_err(|error| TemplateError::Render { name, message: error.to_string() })
    }
}
