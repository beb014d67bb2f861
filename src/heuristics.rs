//! Keyword heuristics for job type and category
//!
//! Both functions lowercase `title + " " + description` and walk an ordered
//! rule list; the first rule that matches wins.

use crate::models::{Category, JobType};

fn haystack(title: &str, description: &str) -> String {
    format!("{title} {description}").to_lowercase()
}

/// Infer the employment type, defaulting to full-time
pub fn infer_job_type(title: &str, description: &str) -> JobType {
    let text = haystack(title, description);

    if text.contains("full") && text.contains("time") {
        JobType::FullTime
    } else if text.contains("part") && text.contains("time") {
        JobType::PartTime
    } else if text.contains("contract") {
        JobType::Contract
    } else if text.contains("intern") {
        JobType::Internship
    } else if text.contains("freelance") {
        JobType::Freelance
    } else {
        JobType::FullTime
    }
}

const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Engineering,
        &["software", "developer", "engineer", "programming"],
    ),
    (Category::Marketing, &["market"]),
    (Category::Sales, &["sale"]),
    (Category::Design, &["design", "ui", "ux"]),
    (Category::Product, &["product", "pm"]),
    (Category::Data, &["data", "analyst", "science"]),
    (Category::DevOps, &["devops", "sre"]),
];

/// Infer the job category, defaulting to `Other`
pub fn infer_category(title: &str, description: &str) -> Category {
    let text = haystack(title, description);

    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
