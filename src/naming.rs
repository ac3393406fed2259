//! Default service names derived from identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(.)([A-Z][a-z]+)").expect("static pattern")
});
static LOWER_UPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-z0-9])([A-Z])").expect("static pattern")
});

/// Derives the registry key for an identifier.
///
/// A `_` is inserted before each capitalized word that follows another
/// character and between a lowercase letter or digit and an uppercase
/// letter; the result is lower-cased. Identifiers that are already
/// snake case come back unchanged.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::derive_service_name;
///
/// assert_eq!(derive_service_name("CamelCasedWord"), "camel_cased_word");
/// assert_eq!(derive_service_name("HTTPServer"), "http_server");
/// assert_eq!(derive_service_name("hello_factory"), "hello_factory");
/// ```
pub fn derive_service_name(identifier: &str) -> String {
    let spaced = WORD_BOUNDARY.replace_all(identifier, "${1}_${2}");
    LOWER_UPPER.replace_all(&spaced, "${1}_${2}").to_lowercase()
}

/// Derives the registry key for a Rust type.
///
/// Module path and generic arguments are dropped before derivation, so
/// `my_app::services::UserRepository<Pg>` becomes `user_repository`.
pub fn service_name_of<T: ?Sized>() -> String {
    derive_service_name(short_type_name(std::any::type_name::<T>()))
}

fn short_type_name(full: &str) -> &str {
    let without_generics = match full.find('<') {
        Some(pos) => &full[..pos],
        None => full,
    };
    match without_generics.rfind("::") {
        Some(pos) => &without_generics[pos + 2..],
        None => without_generics,
    }
}
