use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub payments: PaymentsConfig,
    pub smtp: SmtpConfig,
    pub email: EmailConfig,
    pub pricing: PricingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    pub access_token: SecretString,
    pub location_id: String,
    pub base_url: String,
    pub currency: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub from_address: String,
    pub quote_subject: String,
    pub scheduling_subject: String,
    pub scheduling_url: String,
    pub scheduling_delivery: SchedulingDelivery,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub mode: PricingMode,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Which calculator answers `/get-quote`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    Rules,
    Model,
}

/// Whether the scheduling email is actually handed to the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingDelivery {
    RenderOnly,
    Smtp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub pricing_mode: Option<PricingMode>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub payments_access_token: Option<String>,
    pub payments_location_id: Option<String>,
    pub payments_base_url: Option<String>,
    pub smtp_api_key: Option<String>,
    pub scheduling_delivery: Option<SchedulingDelivery>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com".to_string(),
                model: "gpt-4".to_string(),
                timeout_secs: 30,
            },
            payments: PaymentsConfig {
                access_token: String::new().into(),
                location_id: String::new(),
                base_url: "https://connect.squareup.com".to_string(),
                currency: "USD".to_string(),
                timeout_secs: 30,
            },
            smtp: SmtpConfig {
                host: "smtp.sendgrid.net".to_string(),
                port: 587,
                username: "apikey".to_string(),
                api_key: String::new().into(),
                timeout_secs: 30,
            },
            email: EmailConfig {
                from_address: "quotes@tintquote.local".to_string(),
                quote_subject: "Your window tinting quote".to_string(),
                scheduling_subject: "Schedule your tinting appointment".to_string(),
                scheduling_url: "https://calendly.com/tintquote/installation".to_string(),
                scheduling_delivery: SchedulingDelivery::RenderOnly,
            },
            pricing: PricingConfig { mode: PricingMode::Rules },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 5000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for PricingMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rules" => Ok(Self::Rules),
            "model" => Ok(Self::Model),
            other => Err(ConfigError::Validation(format!(
                "unsupported pricing mode `{other}` (expected rules|model)"
            ))),
        }
    }
}

impl std::str::FromStr for SchedulingDelivery {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "render_only" => Ok(Self::RenderOnly),
            "smtp" => Ok(Self::Smtp),
            other => Err(ConfigError::Validation(format!(
                "unsupported scheduling delivery `{other}` (expected render_only|smtp)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tintquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(payments) = patch.payments {
            if let Some(access_token_value) = payments.access_token {
                self.payments.access_token = secret_value(access_token_value);
            }
            if let Some(location_id) = payments.location_id {
                self.payments.location_id = location_id;
            }
            if let Some(base_url) = payments.base_url {
                self.payments.base_url = base_url;
            }
            if let Some(currency) = payments.currency {
                self.payments.currency = currency;
            }
            if let Some(timeout_secs) = payments.timeout_secs {
                self.payments.timeout_secs = timeout_secs;
            }
        }

        if let Some(smtp) = patch.smtp {
            if let Some(host) = smtp.host {
                self.smtp.host = host;
            }
            if let Some(port) = smtp.port {
                self.smtp.port = port;
            }
            if let Some(username) = smtp.username {
                self.smtp.username = username;
            }
            if let Some(smtp_api_key_value) = smtp.api_key {
                self.smtp.api_key = secret_value(smtp_api_key_value);
            }
            if let Some(timeout_secs) = smtp.timeout_secs {
                self.smtp.timeout_secs = timeout_secs;
            }
        }

        if let Some(email) = patch.email {
            if let Some(from_address) = email.from_address {
                self.email.from_address = from_address;
            }
            if let Some(quote_subject) = email.quote_subject {
                self.email.quote_subject = quote_subject;
            }
            if let Some(scheduling_subject) = email.scheduling_subject {
                self.email.scheduling_subject = scheduling_subject;
            }
            if let Some(scheduling_url) = email.scheduling_url {
                self.email.scheduling_url = scheduling_url;
            }
            if let Some(scheduling_delivery) = email.scheduling_delivery {
                self.email.scheduling_delivery = scheduling_delivery;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(mode) = pricing.mode {
                self.pricing.mode = mode;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TINTQUOTE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TINTQUOTE_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("TINTQUOTE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("TINTQUOTE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("TINTQUOTE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TINTQUOTE_PAYMENTS_ACCESS_TOKEN") {
            self.payments.access_token = secret_value(value);
        }
        if let Some(value) = read_env("TINTQUOTE_PAYMENTS_LOCATION_ID") {
            self.payments.location_id = value;
        }
        if let Some(value) = read_env("TINTQUOTE_PAYMENTS_BASE_URL") {
            self.payments.base_url = value;
        }
        if let Some(value) = read_env("TINTQUOTE_PAYMENTS_CURRENCY") {
            self.payments.currency = value;
        }
        if let Some(value) = read_env("TINTQUOTE_PAYMENTS_TIMEOUT_SECS") {
            self.payments.timeout_secs = parse_u64("TINTQUOTE_PAYMENTS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TINTQUOTE_SMTP_HOST") {
            self.smtp.host = value;
        }
        if let Some(value) = read_env("TINTQUOTE_SMTP_PORT") {
            self.smtp.port = parse_u16("TINTQUOTE_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("TINTQUOTE_SMTP_USERNAME") {
            self.smtp.username = value;
        }
        if let Some(value) = read_env("TINTQUOTE_SMTP_API_KEY") {
            self.smtp.api_key = secret_value(value);
        }
        if let Some(value) = read_env("TINTQUOTE_SMTP_TIMEOUT_SECS") {
            self.smtp.timeout_secs = parse_u64("TINTQUOTE_SMTP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TINTQUOTE_EMAIL_FROM_ADDRESS") {
            self.email.from_address = value;
        }
        if let Some(value) = read_env("TINTQUOTE_EMAIL_SCHEDULING_URL") {
            self.email.scheduling_url = value;
        }
        if let Some(value) = read_env("TINTQUOTE_EMAIL_SCHEDULING_DELIVERY") {
            self.email.scheduling_delivery = value.parse()?;
        }

        if let Some(value) = read_env("TINTQUOTE_PRICING_MODE") {
            self.pricing.mode = value.parse()?;
        }

        if let Some(value) = read_env("TINTQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TINTQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("TINTQUOTE_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("TINTQUOTE_LOGGING_LEVEL").or_else(|| read_env("TINTQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TINTQUOTE_LOGGING_FORMAT").or_else(|| read_env("TINTQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(pricing_mode) = overrides.pricing_mode {
            self.pricing.mode = pricing_mode;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(access_token) = overrides.payments_access_token {
            self.payments.access_token = secret_value(access_token);
        }
        if let Some(location_id) = overrides.payments_location_id {
            self.payments.location_id = location_id;
        }
        if let Some(base_url) = overrides.payments_base_url {
            self.payments.base_url = base_url;
        }
        if let Some(smtp_api_key) = overrides.smtp_api_key {
            self.smtp.api_key = secret_value(smtp_api_key);
        }
        if let Some(scheduling_delivery) = overrides.scheduling_delivery {
            self.email.scheduling_delivery = scheduling_delivery;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm, self.pricing.mode)?;
        validate_payments(&self.payments)?;
        validate_smtp(&self.smtp)?;
        validate_email(&self.email)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tintquote.toml"), PathBuf::from("config/tintquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_http_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig, mode: PricingMode) -> Result<(), ConfigError> {
    validate_timeout("llm.timeout_secs", llm.timeout_secs)?;
    validate_http_url("llm.base_url", &llm.base_url)?;

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if mode == PricingMode::Model {
        let missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required when pricing.mode is `model`".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_payments(payments: &PaymentsConfig) -> Result<(), ConfigError> {
    validate_timeout("payments.timeout_secs", payments.timeout_secs)?;
    validate_http_url("payments.base_url", &payments.base_url)?;

    if payments.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "payments.access_token is required. Create one in the payment provider's developer dashboard"
                .to_string(),
        ));
    }
    if payments.location_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "payments.location_id is required; invoices are created per business location"
                .to_string(),
        ));
    }
    let currency = payments.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(
            "payments.currency must be a three-letter ISO code such as `USD`".to_string(),
        ));
    }

    Ok(())
}

fn validate_smtp(smtp: &SmtpConfig) -> Result<(), ConfigError> {
    validate_timeout("smtp.timeout_secs", smtp.timeout_secs)?;

    if smtp.host.trim().is_empty() {
        return Err(ConfigError::Validation("smtp.host must not be empty".to_string()));
    }
    if smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be greater than zero".to_string()));
    }
    if smtp.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp.api_key is required; it is used as the relay password".to_string(),
        ));
    }

    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<(), ConfigError> {
    if !email.from_address.contains('@') {
        return Err(ConfigError::Validation(
            "email.from_address must be an email address".to_string(),
        ));
    }
    validate_http_url("email.scheduling_url", &email.scheduling_url)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    payments: Option<PaymentsPatch>,
    smtp: Option<SmtpPatch>,
    email: Option<EmailPatch>,
    pricing: Option<PricingPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentsPatch {
    access_token: Option<String>,
    location_id: Option<String>,
    base_url: Option<String>,
    currency: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpPatch {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    from_address: Option<String>,
    quote_subject: Option<String>,
    scheduling_subject: Option<String>,
    scheduling_url: Option<String>,
    scheduling_delivery: Option<SchedulingDelivery>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    mode: Option<PricingMode>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
