// Shared prompt fragments.
// Each module that calls the text-generation service defines its own prompts.rs
// alongside it. This file contains cross-cutting fragments.

/// System prompt fragment that enforces a bare JSON array as the only output.
pub const JSON_ARRAY_ONLY_SYSTEM: &str = "You MUST respond with a valid JSON array only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every prompt that lists catalog records.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only reference identifiers that appear in the list provided. \
    Never invent identifiers, stores, or benefits. \
    If nothing in the list fits the request, return an empty array.";
