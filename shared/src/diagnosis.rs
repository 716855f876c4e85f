//! The diagnosis record and the schema that maps the inference service's
//! loosely-typed JSON onto it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const MAX_PREDICTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub plant_name_traditional: String,
    pub plant_name_cnn: String,
    pub location: String,
    pub diseases_treated: String,
    pub preparation_methods: String,
    pub uploaded_image: String,
    pub confidence: f64,
    pub top3_predictions: Vec<Prediction>,
}

/// One text field of the upstream body: the keys it may appear under, in
/// priority order, and the value used when none of them carries a usable
/// string.
struct TextField {
    keys: &'static [&'static str],
    default: &'static str,
    slot: fn(&mut DiagnosisResult) -> &mut String,
}

const TEXT_FIELDS: &[TextField] = &[
    TextField {
        keys: &["plant_name_traditional", "plant_name"],
        default: UNKNOWN,
        slot: |r| &mut r.plant_name_traditional,
    },
    TextField {
        keys: &["plant_name_cnn"],
        default: UNKNOWN,
        slot: |r| &mut r.plant_name_cnn,
    },
    TextField {
        keys: &["location"],
        default: UNKNOWN,
        slot: |r| &mut r.location,
    },
    TextField {
        keys: &["diseases_treated"],
        default: NOT_SPECIFIED,
        slot: |r| &mut r.diseases_treated,
    },
    TextField {
        keys: &["preparation_methods"],
        default: NOT_SPECIFIED,
        slot: |r| &mut r.preparation_methods,
    },
    TextField {
        keys: &["uploaded_image"],
        default: "",
        slot: |r| &mut r.uploaded_image,
    },
];

const CONFIDENCE_KEY: &str = "confidence";
const PREDICTIONS_KEY: &str = "top_3_predictions";

impl Default for DiagnosisResult {
    fn default() -> Self {
        let mut result = Self {
            plant_name_traditional: String::new(),
            plant_name_cnn: String::new(),
            location: String::new(),
            diseases_treated: String::new(),
            preparation_methods: String::new(),
            uploaded_image: String::new(),
            confidence: 0.0,
            top3_predictions: Vec::new(),
        };
        for field in TEXT_FIELDS {
            *(field.slot)(&mut result) = field.default.to_string();
        }
        result
    }
}

impl DiagnosisResult {
    /// Maps an inference response body. Never fails: anything absent, null,
    /// blank or of the wrong shape falls back to the field's default.
    pub fn from_upstream(body: &Value) -> Self {
        let mut result = Self::default();

        for field in TEXT_FIELDS {
            if let Some(text) = field.keys.iter().find_map(|key| non_blank_str(body.get(*key))) {
                *(field.slot)(&mut result) = text.to_string();
            }
        }

        if let Some(confidence) = body.get(CONFIDENCE_KEY).and_then(number) {
            result.confidence = clamp_percent(confidence);
        }

        if let Some(Value::Array(entries)) = body.get(PREDICTIONS_KEY) {
            result.top3_predictions = entries
                .iter()
                .filter_map(Prediction::from_upstream)
                .take(MAX_PREDICTIONS)
                .collect();
        }

        result
    }

    /// Label to headline: the CNN name when known, else the traditional one.
    pub fn headline(&self) -> &str {
        if self.plant_name_cnn != UNKNOWN {
            &self.plant_name_cnn
        } else {
            &self.plant_name_traditional
        }
    }
}

impl Prediction {
    fn from_upstream(entry: &Value) -> Option<Self> {
        let label = non_blank_str(entry.get("plant"))?;
        Some(Self {
            label: label.to_string(),
            confidence: entry.get(CONFIDENCE_KEY).and_then(number).map(clamp_percent).unwrap_or(0.0),
        })
    }
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
