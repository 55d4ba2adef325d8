//! Fixed text shown to the user

use fasal_tui::widgets::{Feature, Landing};

pub const TITLE: &str = "Indian Agriculture & Climate Data Intelligence";

pub const TAGLINE: &str = "Ask questions in natural language. Get instant insights from official datasets. \
Compare states, analyze trends, and make data-backed decisions.";

pub const INPUT_PLACEHOLDER: &str = "Ask about crop production, rainfall patterns, state comparisons...";

pub const EXAMPLE_QUESTIONS: [&str; 6] = [
    "Compare average rainfall across top 5 states for the last 3 years",
    "Which districts have highest wheat production in Punjab?",
    "Correlate rice production with monsoon rainfall in West Bengal",
    "Analyze crop failure patterns in drought-prone districts",
    "What crops are best suited for low rainfall regions?",
    "Compare state-wise agricultural productivity trends",
];

const FOOTER: [&str; 2] = [
    "Data sources: Ministry of Agriculture & Farmers Welfare, India Meteorological Department (IMD)",
    "Powered by data.gov.in | Demo prototype for policy insights",
];

pub fn default_examples() -> Vec<String> {
    EXAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// Welcome screen content for the TUI
pub fn landing(examples: &[String]) -> Landing {
    Landing {
        badge: "Powered by data.gov.in".to_string(),
        title: TITLE.to_string(),
        tagline: TAGLINE.to_string(),
        features: vec![
            Feature::new("Crop Production", "State & district-wise production data"),
            Feature::new("Climate Analysis", "Rainfall patterns & trends"),
            Feature::new("Policy Insights", "Data-backed recommendations"),
        ],
        examples: examples.to_vec(),
        hints: vec![
            ("Enter".to_string(), "send".to_string()),
            ("Ctrl+E".to_string(), "examples".to_string()),
            ("Ctrl+Y".to_string(), "copy".to_string()),
            ("Ctrl+L".to_string(), "clear".to_string()),
            ("Ctrl+C".to_string(), "stop / quit".to_string()),
        ],
        footer: FOOTER.iter().map(|s| s.to_string()).collect(),
    }
}

/// Numbered example list for line mode and `--examples`
pub fn examples_text(examples: &[String]) -> String {
    let mut text = String::from("Example questions:\n");
    for (i, example) in examples.iter().enumerate() {
        text.push_str(&format!("  {}. {}\n", i + 1, example));
    }
    text
}
