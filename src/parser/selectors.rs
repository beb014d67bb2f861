//! CSS selectors for the job listings site
//!
//! Listing cards, detail descriptions, and the markers of anti-bot
//! interstitials.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Container that marks a rendered results page; one per job card
pub const LISTING_CARD: &str = ".job_seen_beacon";

lazy_static! {
    pub static ref CARD: Selector = parse_selector!(".job_seen_beacon");
    pub static ref CARD_TITLE: Selector = parse_selector!("h2.jobTitle a");
    pub static ref CARD_COMPANY: Selector = parse_selector!("[data-testid=\"company-name\"]");
    pub static ref CARD_LOCATION: Selector = parse_selector!("[data-testid=\"text-location\"]");
    pub static ref CARD_SALARY: Selector = parse_selector!(".salary-snippet-container");

    /// Description body strategies, tried in order
    pub static ref DESCRIPTION: Vec<Selector> = vec![
        parse_selector!("#jobDescriptionText"),
        parse_selector!(".jobsearch-JobComponent-description"),
        parse_selector!(".description"),
        parse_selector!("[data-testid=\"job-description\"]"),
    ];

    /// Elements only present on CAPTCHA or anti-bot pages
    pub static ref BLOCK_ELEMENTS: Vec<Selector> = vec![
        parse_selector!("#captcha-container"),
        parse_selector!(".g-recaptcha"),
        parse_selector!(".h-captcha"),
        parse_selector!("iframe[src*=\"captcha\"]"),
        parse_selector!("#challenge-form"),
        parse_selector!("#challenge-running"),
        parse_selector!(".cf-browser-verification"),
    ];

    /// Headline elements whose text is checked for block wording
    pub static ref BLOCK_HEADLINES: Selector = parse_selector!("title, h1, h2.title");
}

/// Lowercase wording that marks an interstitial instead of results
pub const BLOCK_PHRASES: &[&str] = &[
    "captcha",
    "blocked",
    "access denied",
    "security check",
    "verify you are human",
    "unusual traffic",
    "just a moment",
    "additional verification required",
];
