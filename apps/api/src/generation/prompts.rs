// LLM prompt constants for pass generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for benefit selection.
pub const SELECTION_SYSTEM: &str = "You are a local travel curator building a benefit pass \
    for a visitor to the old town. You pick benefits that match the visitor's request \
    and favour small independent merchants.";

/// Benefit selection prompt template.
/// Replace: {grounding_instruction}, {constraint}, {tier_name}, {themes},
///          {request}, {candidates_json}
pub const SELECTION_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

PASS: {tier_name}
CONSTRAINT: {constraint}

VISITOR THEMES: {themes}
VISITOR REQUEST:
{request}

CANDIDATE BENEFITS (the only benefits you may choose from):
{candidates_json}

Return a JSON ARRAY and nothing else:
[
  {
    "benefit_id": "the exact benefit_id from the candidate list",
    "reason": "one sentence on why this benefit suits the visitor"
  }
]

HARD RULES:
1. Every `benefit_id` MUST be copied exactly from the candidate list
2. Never list the same `benefit_id` twice
3. Respect the CONSTRAINT above exactly
4. Order the array from most to least suitable"#;

/// Constraint line for count-capped tiers. Replace: {count}
pub const COUNT_CONSTRAINT_TEMPLATE: &str =
    "Select exactly {count} benefits (fewer only if fewer candidates exist).";

/// Constraint line for value-capped tiers. Replace: {min_value}, {max_value}
pub const VALUE_CONSTRAINT_TEMPLATE: &str = "Select benefits whose combined eco_value is at \
    least {min_value} and at most {max_value}. The running total of eco_value, summed in \
    the order you list them, must never exceed {max_value}.";
