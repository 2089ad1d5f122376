//! Model pricing used for cost estimates.

/// USD per 1K tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl ModelPricing {
    const fn new(prompt_per_1k: f64, completion_per_1k: f64) -> Self {
        Self {
            prompt_per_1k,
            completion_per_1k,
        }
    }

    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.prompt_per_1k
            + (completion_tokens as f64 / 1000.0) * self.completion_per_1k
    }
}

/// Model families, most specific first. A model matches the first family
/// whose every marker occurs in its lowercased name.
static FAMILIES: &[(&str, &[&str], ModelPricing)] = &[
    ("gpt-4.1-nano", &["gpt-4.1", "nano"], ModelPricing::new(0.0001, 0.0004)),
    ("gpt-4.1-mini", &["gpt-4.1", "mini"], ModelPricing::new(0.0004, 0.0016)),
    ("gpt-4.1", &["gpt-4.1"], ModelPricing::new(0.002, 0.008)),
    ("gpt-4o-mini", &["gpt-4o", "mini"], ModelPricing::new(0.00015, 0.0006)),
    ("gpt-4o", &["gpt-4o"], ModelPricing::new(0.0025, 0.01)),
    ("gpt-4", &["gpt-4"], ModelPricing::new(0.03, 0.06)),
    ("gpt-3.5-turbo", &["gpt-3.5"], ModelPricing::new(0.0015, 0.002)),
    ("claude-3-haiku", &["claude-3", "haiku"], ModelPricing::new(0.00025, 0.00125)),
    ("claude-3-sonnet", &["claude-3", "sonnet"], ModelPricing::new(0.003, 0.015)),
    ("claude-3-opus", &["claude-3", "opus"], ModelPricing::new(0.015, 0.075)),
];

fn lookup(model: &str) -> Option<&'static (&'static str, &'static [&'static str], ModelPricing)> {
    let lower = model.to_lowercase();
    FAMILIES
        .iter()
        .find(|(_, markers, _)| markers.iter().all(|m| lower.contains(m)))
}

/// Maps a provider model name (possibly prefixed, e.g. `openai/gpt-4o`) to
/// its pricing family. `None` means the cost cannot be estimated.
pub fn model_family(model: &str) -> Option<&'static str> {
    lookup(model).map(|(family, _, _)| *family)
}

pub fn pricing_for(model: &str) -> Option<ModelPricing> {
    lookup(model).map(|(_, _, pricing)| *pricing)
}

/// `None` when the model's pricing is unknown.
pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> Option<f64> {
    pricing_for(model).map(|p| p.cost(prompt_tokens, completion_tokens))
}
