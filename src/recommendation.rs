pub const FALLBACK_RECOMMENDATION: &str =
    "General care is advised. No specific recommendation available.";

const RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "Pepper__bell___Bacterial_spot",
        "Use copper-based fungicides. Avoid overhead watering. Rotate crops and remove infected plant debris.",
    ),
    (
        "Pepper__bell___healthy",
        "Your pepper plant appears healthy. Ensure consistent watering and provide support as it grows.",
    ),
    (
        "Potato___Early_blight",
        "Apply fungicides containing chlorothalonil or mancozeb. Ensure good air circulation and avoid water on leaves.",
    ),
    (
        "Potato___Late_blight",
        "This is a serious disease. Use fungicides like metalaxyl or chlorothalonil immediately. Destroy infected plants to prevent spread.",
    ),
    (
        "Potato___healthy",
        "Your potato plants look healthy. Continue to 'hill' soil around the base to protect tubers from sunlight.",
    ),
    (
        "Tomato_Bacterial_spot",
        "Apply copper-based bactericides. Mulch around plants to prevent soil splash. Do not work with plants when they are wet.",
    ),
    (
        "Tomato_Early_blight",
        "Prune lower leaves. Use fungicides like chlorothalonil. Stake plants to improve air circulation.",
    ),
    (
        "Tomato_Late_blight",
        "A devastating disease. Act fast. Use targeted fungicides and remove all infected plants from the garden.",
    ),
    (
        "Tomato_Leaf_Mold",
        "Ensure good ventilation, especially in greenhouses. Use fungicides. Some tomato varieties are resistant.",
    ),
    (
        "Tomato_Septoria_leaf_spot",
        "Remove infected leaves immediately. Apply fungicides. Mulch heavily to reduce water splashing from soil.",
    ),
    (
        "Tomato_Spider_mites_Two-spotted_spider_mite",
        "Use insecticidal soap or neem oil. Introduce predatory mites. Mist plants to increase humidity.",
    ),
    (
        "Tomato__Target_Spot",
        "Improve air circulation. Apply a fungicide. Remove and destroy crop debris after harvest.",
    ),
    (
        "Tomato__Tomato_YellowLeaf__Curl_Virus",
        "Control whiteflies, which spread the virus. Use insecticidal soap or reflective mulch. Remove infected plants.",
    ),
    (
        "Tomato__Tomato_mosaic_virus",
        "There is no cure. Remove and destroy infected plants. Disinfect tools and wash hands after handling.",
    ),
    (
        "Tomato_healthy",
        "Your tomato plant is healthy. Continue with regular watering and feeding, especially when fruit begins to form.",
    ),
];

/// Advice text for an exact class name, or the generic fallback.
pub fn recommendation_for(class_name: &str) -> &'static str {
    RECOMMENDATIONS
        .iter()
        .find(|(name, _)| *name == class_name)
        .map(|(_, advice)| *advice)
        .unwrap_or(FALLBACK_RECOMMENDATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_class() {
        assert!(recommendation_for("Tomato_Leaf_Mold").starts_with("Ensure good ventilation"));
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(recommendation_for("tomato_leaf_mold"), FALLBACK_RECOMMENDATION);
        assert_eq!(recommendation_for("Corn_Common_rust"), FALLBACK_RECOMMENDATION);
        assert_eq!(recommendation_for(""), FALLBACK_RECOMMENDATION);
    }

    #[test]
    fn test_table_has_no_empty_entries() {
        for (name, advice) in RECOMMENDATIONS {
            assert!(!name.is_empty());
            assert!(!advice.is_empty());
            assert_eq!(recommendation_for(name), *advice);
        }
    }
}
