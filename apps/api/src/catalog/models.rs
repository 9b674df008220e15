use serde::{Deserialize, Serialize};

/// A merchant participating in the pass programme.
///
/// `synergy` is derived when the catalog loads; whatever the source file
/// carries for it is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "location")]
    pub area: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default, alias = "franchise")]
    pub is_franchise: bool,
    #[serde(default)]
    pub synergy: u8,
}

/// Optional discount metadata attached to a benefit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
}

/// A single benefit a store offers to pass holders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    /// Assigned positionally (`B001`, `B002`, ...) when the source omits it.
    #[serde(default)]
    pub id: String,
    pub store_id: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(rename = "type", alias = "benefit_type", default = "default_benefit_type")]
    pub benefit_type: String,
    /// Subjective satisfaction score, 0 – 100.
    #[serde(default = "default_value")]
    pub value: f64,
    /// Monetary worth of the benefit when redeemed.
    #[serde(default = "default_eco_value")]
    pub eco_value: u32,
    #[serde(flatten)]
    pub discount: DiscountInfo,
}

fn default_benefit_type() -> String {
    "discount".to_string()
}

fn default_value() -> f64 {
    50.0
}

fn default_eco_value() -> u32 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_accepts_legacy_field_names() {
        let json = r#"{
            "id": "S001",
            "name": "Sinpo Dumplings",
            "location": "신포동",
            "desc": "Hand-made dumplings since 1978",
            "franchise": true
        }"#;
        let store: Store = serde_json::from_str(json).unwrap();
        assert_eq!(store.area, "신포동");
        assert_eq!(store.description, "Hand-made dumplings since 1978");
        assert!(store.is_franchise);
        assert!(store.themes.is_empty());
    }

    #[test]
    fn test_benefit_defaults_when_fields_missing() {
        let json = r#"{"store_id": "S001", "desc": "Free side dish"}"#;
        let benefit: Benefit = serde_json::from_str(json).unwrap();
        assert!(benefit.id.is_empty());
        assert_eq!(benefit.benefit_type, "discount");
        assert_eq!(benefit.eco_value, 3000);
        assert_eq!(benefit.value, 50.0);
        assert_eq!(benefit.discount, DiscountInfo::default());
    }

    #[test]
    fn test_benefit_reads_flattened_discount_metadata() {
        let json = r#"{
            "id": "B010",
            "store_id": "S002",
            "type": "coupon",
            "description": "10% off drinks",
            "discount_rate": "10%",
            "terms": "One per table"
        }"#;
        let benefit: Benefit = serde_json::from_str(json).unwrap();
        assert_eq!(benefit.benefit_type, "coupon");
        assert_eq!(benefit.discount.discount_rate.as_deref(), Some("10%"));
        assert_eq!(benefit.discount.terms.as_deref(), Some("One per table"));
        assert!(benefit.discount.valid_until.is_none());
    }
}
