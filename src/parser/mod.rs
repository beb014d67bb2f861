//! HTML parsing for listing and detail pages
//!
//! Pure functions over a parsed [`Html`] document. The crawler hands them
//! the rendered page through [`crate::crawler::session::evaluate`].

pub mod selectors;

use scraper::{ElementRef, Html};

use crate::utils::normalize_whitespace;
use selectors::{
    BLOCK_ELEMENTS, BLOCK_HEADLINES, BLOCK_PHRASES, CARD, CARD_COMPANY, CARD_LOCATION,
    CARD_SALARY, CARD_TITLE, DESCRIPTION,
};

/// Fields read from one listing card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    /// Raw `href` of the title link
    pub href: Option<String>,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn child_text(card: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    card.select(selector).next().map(element_text)
}

/// Cards on a results page that have a title link; untitled cards are skipped
pub fn parse_cards(document: &Html) -> Vec<ListingCard> {
    document
        .select(&CARD)
        .filter_map(|card| {
            let title_link = card.select(&CARD_TITLE).next()?;

            Some(ListingCard {
                title: element_text(title_link),
                href: title_link.value().attr("href").map(str::to_string),
                company: child_text(card, &CARD_COMPANY).unwrap_or_default(),
                location: child_text(card, &CARD_LOCATION).unwrap_or_default(),
                salary: child_text(card, &CARD_SALARY).filter(|s| !s.is_empty()),
            })
        })
        .collect()
}

/// Whether the page is a CAPTCHA or anti-bot interstitial
pub fn is_blocked(document: &Html) -> bool {
    if BLOCK_ELEMENTS
        .iter()
        .any(|selector| document.select(selector).next().is_some())
    {
        return true;
    }

    document.select(&BLOCK_HEADLINES).any(|headline| {
        let text = element_text(headline).to_lowercase();
        BLOCK_PHRASES.iter().any(|phrase| text.contains(phrase))
    })
}

/// Description text of a detail page from the first matching strategy
///
/// Returns `Some("")` when a strategy matches an empty element, `None` when
/// nothing matches.
pub fn parse_description(document: &Html) -> Option<String> {
    DESCRIPTION.iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
    })
}
