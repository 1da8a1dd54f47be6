//! Per-model token pricing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::provider::{CompletionResponse, LlmProvider};

/// (input, output) USD price per token for known OpenAI models.
///
/// Unknown models are priced at zero.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    let model = model.to_lowercase();
    if model.starts_with("gpt-4o-mini") {
        (dec!(0.00000015), dec!(0.0000006))
    } else if model.starts_with("gpt-4o") {
        (dec!(0.0000025), dec!(0.00001))
    } else if model.starts_with("gpt-4.1-mini") {
        (dec!(0.0000004), dec!(0.0000016))
    } else if model.starts_with("gpt-4.1") {
        (dec!(0.000002), dec!(0.000008))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    }
}

/// Estimated USD cost of one completion.
pub fn estimate_cost(provider: &dyn LlmProvider, response: &CompletionResponse) -> Decimal {
    let (input, output) = provider.cost_per_token();
    input * Decimal::from(response.input_tokens) + output * Decimal::from(response.output_tokens)
}
