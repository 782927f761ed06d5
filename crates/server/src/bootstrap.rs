use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tintquote_agent::{ChatCompletionsClient, LlmError, QuoteEstimator};
use tintquote_core::config::{AppConfig, PricingMode};
use tintquote_core::pricing::RuleTablePricingEngine;
use tracing::info;

use crate::health;
use crate::mailer::{MailError, SmtpMailer};
use crate::payments::{HttpInvoiceGateway, PaymentsError};
use crate::routes::{self, AppState};
use crate::templates::{EmailTemplates, TemplateError};

pub struct Application {
    pub config: Arc<AppConfig>,
    pub state: AppState,
}

impl Application {
    pub fn router(&self) -> Router {
        routes::router(self.state.clone()).merge(health::router(
            self.config.pricing.mode,
            self.config.email.scheduling_delivery,
        ))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.config.server.bind_address, self.config.server.port)
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("llm client initialization failed: {0}")]
    Llm(#[from] LlmError),
    #[error("payments client initialization failed: {0}")]
    Payments(#[from] PaymentsError),
    #[error("smtp mailer initialization failed: {0}")]
    Mail(#[from] MailError),
    #[error("email templates failed to load: {0}")]
    Templates(#[from] TemplateError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        pricing_mode = ?config.pricing.mode,
        "starting application bootstrap"
    );
    let config = Arc::new(config);

    let estimator = match config.pricing.mode {
        PricingMode::Model => {
            let client = ChatCompletionsClient::from_config(&config.llm)?;
            info!(
                event_name = "system.bootstrap.llm_ready",
                correlation_id = "bootstrap",
                model = %client.model(),
                "chat completions client initialized"
            );
            Some(QuoteEstimator::new(Arc::new(client)))
        }
        PricingMode::Rules => None,
    };

    let invoices = HttpInvoiceGateway::from_config(&config.payments)?;
    let mailer = SmtpMailer::from_config(&config.smtp, &config.email.from_address)?;
    info!(
        event_name = "system.bootstrap.smtp_ready",
        correlation_id = "bootstrap",
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        "smtp relay configured with starttls"
    );
    let templates = EmailTemplates::embedded()?;

    let state = AppState {
        config: config.clone(),
        pricing: Arc::new(RuleTablePricingEngine::default()),
        estimator,
        invoices: Arc::new(invoices),
        mailer: Arc::new(mailer),
        templates: Arc::new(templates),
    };

    Ok(Application { config, state })
}
