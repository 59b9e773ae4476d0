//! URL-safe name generation.
//!
//! Stores, descriptions, offerings and categories all derive their unique
//! `name` from a human display name with [`slugify`].

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("static regex"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s-]+").expect("static regex"));

/// Converts a display name into a URL-safe slug.
///
/// # Rules
///
/// 1. Accents are folded to their ASCII base letter (NFD + combining mark removal)
/// 2. Lowercased
/// 3. Characters outside `[a-z0-9]`, whitespace and `-` are dropped
/// 4. Runs of whitespace and hyphens collapse into a single `-`
/// 5. Leading and trailing hyphens are trimmed
///
/// The function is idempotent: `slugify(slugify(x)) == slugify(x)`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Description Display Name"), "description-display-name");
/// assert_eq!(slugify("Café  Olé!"), "cafe-ole");
/// ```
pub fn slugify(display_name: &str) -> String {
    let folded: String = display_name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let stripped = DISALLOWED.replace_all(&folded, "");
    let collapsed = SEPARATORS.replace_all(&stripped, "-");

    collapsed.trim_matches('-').to_string()
}
