use crate::diagnosis::DiagnosisResult;

/// Inline SVG shown in place of a missing leaf photo.
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml;utf8,%3Csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 64 64'%3E%3Crect width='64' height='64' fill='%23e8f5e9'/%3E%3Cpath d='M20 44c0-14 10-24 26-26-2 16-12 26-26 26z' fill='%2366bb6a'/%3E%3Cpath d='M20 44l14-14' stroke='%232e7d32' stroke-width='2'/%3E%3C/svg%3E";

impl DiagnosisResult {
    /// The record rendered when nothing has been diagnosed yet.
    pub fn placeholder() -> Self {
        Self {
            uploaded_image: PLACEHOLDER_IMAGE.to_string(),
            ..Self::default()
        }
    }
}

/// Single-slot, last-write-wins holder for the latest diagnosis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandoffSlot {
    result: Option<DiagnosisResult>,
}

impl HandoffSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, result: DiagnosisResult) {
        self.result = Some(result);
    }

    pub fn get(&self) -> Option<&DiagnosisResult> {
        self.result.as_ref()
    }

    pub fn get_or_default(&self) -> DiagnosisResult {
        self.result.clone().unwrap_or_else(DiagnosisResult::placeholder)
    }

    pub fn clear(&mut self) {
        self.result = None;
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tomato() -> DiagnosisResult {
        DiagnosisResult {
            plant_name_cnn: "Tomato".into(),
            confidence: 92.5,
            ..DiagnosisResult::default()
        }
    }

    #[test]
    fn test_empty_slot_yields_placeholder() {
        let slot = HandoffSlot::new();
        assert!(slot.get().is_none());

        let fallback = slot.get_or_default();
        assert_eq!(fallback.uploaded_image, PLACEHOLDER_IMAGE);
        assert_eq!(fallback.location, "Unknown");
        assert_eq!(fallback.preparation_methods, "Not specified");
    }

    #[test]
    fn test_get_or_default_is_idempotent() {
        let mut slot = HandoffSlot::new();
        assert_eq!(slot.get_or_default(), slot.get_or_default());

        slot.set(tomato());
        assert_eq!(slot.get_or_default(), slot.get_or_default());
    }

    #[test]
    fn test_last_write_wins() {
        let mut slot = HandoffSlot::new();
        slot.set(tomato());
        let mut basil = tomato();
        basil.plant_name_cnn = "Basil".into();
        slot.set(basil.clone());

        assert_eq!(slot.get(), Some(&basil));
        assert_eq!(slot.get_or_default(), basil);
    }

    #[test]
    fn test_clear() {
        let mut slot = HandoffSlot::new();
        slot.set(tomato());
        slot.clear();
        assert!(slot.is_empty());
        assert_eq!(slot.get_or_default(), DiagnosisResult::placeholder());
    }
}
