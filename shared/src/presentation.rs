//! View model for the result page. Pure, so the frontend only turns it into
//! markup.

use crate::diagnosis::{DiagnosisResult, UNKNOWN, clamp_percent};
use crate::handoff::PLACEHOLDER_IMAGE;

pub const EMPTY_TITLE: &str = "No diagnosis available";
pub const EMPTY_MESSAGE: &str = "Upload or capture a photo of a leaf to get a diagnosis.";
pub const CALL_TO_ACTION: &str = "Diagnose a plant";

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Empty {
        title: &'static str,
        message: &'static str,
        call_to_action: &'static str,
    },
    Ready(ResultCard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub image_src: String,
    pub headline: String,
    pub plant_name_traditional: String,
    pub plant_name_cnn: String,
    pub confidence_label: String,
    pub confidence_width: f64,
    pub location: String,
    pub diseases_treated: String,
    pub preparation_methods: String,
    pub predictions: Vec<PredictionRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub label: String,
    pub confidence_label: String,
    pub width: f64,
}

pub fn present(result: Option<&DiagnosisResult>) -> ResultView {
    match result {
        None => ResultView::Empty {
            title: EMPTY_TITLE,
            message: EMPTY_MESSAGE,
            call_to_action: CALL_TO_ACTION,
        },
        Some(result) => ResultView::Ready(ResultCard::from(result)),
    }
}

impl From<&DiagnosisResult> for ResultCard {
    fn from(result: &DiagnosisResult) -> Self {
        let headline = match result.headline() {
            UNKNOWN => "Unknown Plant".to_string(),
            name => name.to_string(),
        };
        Self {
            image_src: image_src(&result.uploaded_image),
            headline,
            plant_name_traditional: result.plant_name_traditional.clone(),
            plant_name_cnn: result.plant_name_cnn.clone(),
            confidence_label: percent_label(result.confidence),
            confidence_width: clamp_percent(result.confidence),
            location: result.location.clone(),
            diseases_treated: result.diseases_treated.clone(),
            preparation_methods: result.preparation_methods.clone(),
            predictions: result
                .top3_predictions
                .iter()
                .map(|p| PredictionRow {
                    label: p.label.clone(),
                    confidence_label: percent_label(p.confidence),
                    width: clamp_percent(p.confidence),
                })
                .collect(),
        }
    }
}

fn percent_label(value: f64) -> String {
    format!("{:.1}%", clamp_percent(value))
}

/// Turns whatever the inference service echoed back into an `<img src>`.
/// Bare base64 is assumed to be JPEG.
pub fn image_src(uploaded: &str) -> String {
    let uploaded = uploaded.trim();
    if uploaded.is_empty() {
        PLACEHOLDER_IMAGE.to_string()
    } else if uploaded.starts_with("data:")
        || uploaded.starts_with("http://")
        || uploaded.starts_with("https://")
    {
        uploaded.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", uploaded)
    }
}
