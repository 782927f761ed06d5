use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::VehicleQuoteRequest;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub total: Decimal,
    pub steps: Vec<PricingTraceStep>,
}

/// A single surcharge in the rule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PricingRule {
    /// Applies when the upper-cased vehicle model contains `keyword`.
    ModelKeyword { keyword: &'static str, surcharge: Decimal },
    /// Applies when the extras list contains `name` exactly.
    Extra { name: &'static str, surcharge: Decimal },
}

impl PricingRule {
    fn applies_to(&self, request: &VehicleQuoteRequest) -> bool {
        match self {
            Self::ModelKeyword { keyword, .. } => {
                request.vehicle_model.to_uppercase().contains(keyword)
            }
            Self::Extra { name, .. } => request.extras.iter().any(|extra| extra == name),
        }
    }

    fn trace_step(&self) -> PricingTraceStep {
        match self {
            Self::ModelKeyword { keyword, surcharge } => PricingTraceStep {
                stage: "model_surcharge".to_string(),
                detail: format!("vehicle model contains `{keyword}`"),
                amount: *surcharge,
            },
            Self::Extra { name, surcharge } => PricingTraceStep {
                stage: "extra_service".to_string(),
                detail: format!("extras include `{name}`"),
                amount: *surcharge,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTable {
    pub base: Decimal,
    pub rules: Vec<PricingRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            base: Decimal::new(250, 0),
            rules: vec![
                PricingRule::ModelKeyword { keyword: "SUV", surcharge: Decimal::new(50, 0) },
                PricingRule::ModelKeyword { keyword: "TRUCK", surcharge: Decimal::new(75, 0) },
                PricingRule::Extra { name: "Ceramic Tint", surcharge: Decimal::new(100, 0) },
                PricingRule::Extra { name: "Tint Removal", surcharge: Decimal::new(50, 0) },
            ],
        }
    }
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, request: &VehicleQuoteRequest) -> PricingResult;
}

#[derive(Clone, Debug, Default)]
pub struct RuleTablePricingEngine {
    table: RuleTable,
}

impl RuleTablePricingEngine {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }
}

impl PricingEngine for RuleTablePricingEngine {
    fn price(&self, request: &VehicleQuoteRequest) -> PricingResult {
        price_with_trace(&self.table, request)
    }
}

pub fn price_with_trace(table: &RuleTable, request: &VehicleQuoteRequest) -> PricingResult {
    let mut steps = vec![PricingTraceStep {
        stage: "base".to_string(),
        detail: "default tinting price".to_string(),
        amount: table.base,
    }];
    steps.extend(
        table.rules.iter().filter(|rule| rule.applies_to(request)).map(PricingRule::trace_step),
    );

    let total = steps.iter().map(|step| step.amount).sum();
    PricingResult { total, steps }
}
