//! Per-backend price tables.
//!
//! Prices are USD per million tokens, input and output priced
//! independently. Unknown models fall back to the backend's flagship
//! pricing so estimates stay conservative rather than reading zero.

/// (input, output) USD per million tokens for a backend + model pair.
fn price_per_million(provider: &str, model: &str) -> (f64, f64) {
    match provider {
        "anthropic" => (3.00, 15.00),
        "openai" => (10.00, 30.00),
        "gemini" => {
            if model.starts_with("gemini-1.5-flash") {
                (0.075, 0.30)
            } else {
                (1.25, 5.00)
            }
        }
        "groq" => match model {
            "llama-3.1-8b-instant" => (0.05, 0.08),
            "mixtral-8x7b-32768" => (0.24, 0.24),
            // 70B-class models, also the default
            _ => (0.59, 0.79),
        },
        _ => (0.0, 0.0),
    }
}

/// Estimated USD cost of one request.
pub fn estimate_cost(provider: &str, model: &str, tokens_in: u32, tokens_out: u32) -> f64 {
    let (input, output) = price_per_million(provider, model);
    f64::from(tokens_in) * input / 1_000_000.0 + f64::from(tokens_out) * output / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_prices_input_and_output_independently() {
        let cost = estimate_cost("anthropic", "claude-3-5-sonnet-20241022", 1_000_000, 0);
        assert!((cost - 3.00).abs() < 1e-9);
        let cost = estimate_cost("anthropic", "claude-3-5-sonnet-20241022", 0, 1_000_000);
        assert!((cost - 15.00).abs() < 1e-9);
    }

    #[test]
    fn gemini_flash_is_cheaper_than_pro() {
        let flash = estimate_cost("gemini", "gemini-1.5-flash", 1000, 1000);
        let pro = estimate_cost("gemini", "gemini-1.5-pro", 1000, 1000);
        assert!(flash < pro);
    }

    #[test]
    fn unknown_groq_model_uses_70b_pricing() {
        let known = estimate_cost("groq", "llama-3.3-70b-versatile", 500, 500);
        let unknown = estimate_cost("groq", "some-future-model", 500, 500);
        assert_eq!(known, unknown);
    }
}
