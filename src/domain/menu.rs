//! Menu feed entities.
//!
//! The storefront menu is published as a JSON array of [`MenuItem`]s. The
//! feed is the source of truth; [`fallback_menu`] is the fixed embedded list
//! substituted when the feed cannot be loaded, so the storefront never
//! renders an empty menu.

use serde::{Deserialize, Serialize};

/// A single dish or drink in the published menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Display price, already formatted for the storefront locale.
    pub price: String,
    /// Filter category slug (`antipasti`, `primi`, `dolci`, `bevande`, ...).
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_alt: Option<String>,
    /// Emoji stand-in rendered when no photograph is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph: Option<String>,
}

impl MenuItem {
    fn embedded(
        id: u64,
        name: &str,
        description: &str,
        price: &str,
        category: &str,
        glyph: &str,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price: price.to_string(),
            category: category.to_string(),
            img_src: None,
            img_alt: None,
            glyph: Some(glyph.to_string()),
        }
    }
}

/// The embedded fallback menu.
///
/// Kept deliberately small: enough to populate every storefront category when
/// the feed is unreachable. Items carry glyphs instead of image paths so the
/// fallback stays useful even with an empty image cache.
pub fn fallback_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::embedded(
            1,
            "Bruschetta al pomodoro",
            "Grilled bread, crushed tomatoes, basil, cold-pressed olive oil.",
            "€ 7",
            "antipasti",
            "🍅",
        ),
        MenuItem::embedded(
            2,
            "Tagliere della casa",
            "Cured meats, seasonal cheeses and house pickles for two.",
            "€ 14",
            "antipasti",
            "🧀",
        ),
        MenuItem::embedded(
            3,
            "Tagliatelle al ragù",
            "Hand-cut egg pasta with slow-braised beef and pork ragù.",
            "€ 16",
            "primi",
            "🍝",
        ),
        MenuItem::embedded(
            4,
            "Risotto ai funghi",
            "Carnaroli rice, porcini mushrooms, aged parmesan.",
            "€ 17",
            "primi",
            "🍄",
        ),
        MenuItem::embedded(
            5,
            "Tiramisù classico",
            "Espresso-soaked savoiardi, mascarpone cream, cocoa.",
            "€ 8",
            "dolci",
            "🍰",
        ),
        MenuItem::embedded(
            6,
            "Vino della casa",
            "House red or white by the glass, from the Colli Euganei.",
            "€ 5",
            "bevande",
            "🍷",
        ),
    ]
}
