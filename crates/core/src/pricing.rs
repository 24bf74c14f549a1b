//! Token pricing for usage recording.
//!
//! Rates are cents per million tokens, split by prompt/response. The
//! resulting figure is an estimate for internal accounting; billing
//! reconciliation happens elsewhere.

/// Per-model token rates, in cents per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_cents_per_mtok: f64,
    pub output_cents_per_mtok: f64,
}

/// Rates applied when the model id is not in the table.
const DEFAULT_PRICING: ModelPricing = ModelPricing {
    input_cents_per_mtok: 30.0,
    output_cents_per_mtok: 250.0,
};

const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    (
        "gemini-2.5-pro",
        ModelPricing {
            input_cents_per_mtok: 125.0,
            output_cents_per_mtok: 1000.0,
        },
    ),
    (
        "gemini-2.5-flash",
        ModelPricing {
            input_cents_per_mtok: 30.0,
            output_cents_per_mtok: 250.0,
        },
    ),
    (
        "gemini-2.0-flash",
        ModelPricing {
            input_cents_per_mtok: 10.0,
            output_cents_per_mtok: 40.0,
        },
    ),
];

/// Look up the pricing for a model id, falling back to default rates.
pub fn pricing_for(model: &str) -> ModelPricing {
    PRICING_TABLE
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_PRICING)
}

/// Estimate the cost of one turn in fractional cents.
pub fn estimate_cost_cents(model: &str, prompt_tokens: u64, response_tokens: u64) -> f64 {
    let pricing = pricing_for(model);
    let input = prompt_tokens as f64 * pricing.input_cents_per_mtok / 1_000_000.0;
    let output = response_tokens as f64 * pricing.output_cents_per_mtok / 1_000_000.0;
    input + output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_table_rates() {
        // 1M prompt tokens + 1M response tokens of gemini-2.5-pro.
        let cents = estimate_cost_cents("gemini-2.5-pro", 1_000_000, 1_000_000);
        assert!((cents - 1125.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_falls_back_to_default_rates() {
        let cents = estimate_cost_cents("mystery-model", 1_000_000, 0);
        assert!((cents - 30.0).abs() < 1e-9);
    }

    #[test]
    fn zero_usage_costs_nothing() {
        assert_eq!(estimate_cost_cents("gemini-2.5-flash", 0, 0), 0.0);
    }
}
