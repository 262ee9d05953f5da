//! Display-label derivation for suggestion options.
//!
//! Providers return structured address fields alongside a long display
//! string such as `"10, Hauptstraße, Mitte, Berlin, 10117, Deutschland"`.
//! Users recognise the short form far more easily, so labels are built
//! from the structured fields in a fixed priority:
//!
//! 1. street + house number (`"Hauptstraße 10"`)
//! 2. postal code + locality (`"10117 Berlin"`)
//!
//! Whichever of the two parts are present are joined with `", "`. Only
//! when no structured field is present does the provider's full display
//! string become the label.

/// Structured address fields as returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDetails {
    /// Street name.
    pub street: Option<String>,
    /// House number, possibly with a suffix (`"12ab"`).
    pub house_number: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// City, town, village or other locality name.
    pub locality: Option<String>,
}

impl AddressDetails {
    /// Returns `true` if no structured field carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.street,
            &self.house_number,
            &self.postal_code,
            &self.locality,
        ]
        .iter()
        .all(|f| non_empty(f.as_deref()).is_none())
    }
}

/// Derives the display label for a suggestion.
///
/// Returns `None` if neither the structured fields nor the display string
/// contain any text; such options are not shown.
#[must_use]
pub fn derive_label(details: &AddressDetails, display_name: Option<&str>) -> Option<String> {
    let street_part = join_words(&[
        non_empty(details.street.as_deref()),
        non_empty(details.house_number.as_deref()),
    ]);
    let locality_part = join_words(&[
        non_empty(details.postal_code.as_deref()),
        non_empty(details.locality.as_deref()),
    ]);

    let parts: Vec<String> = [street_part, locality_part].into_iter().flatten().collect();

    if parts.is_empty() {
        return non_empty(display_name).map(String::from);
    }

    Some(parts.join(", "))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn join_words(words: &[Option<&str>]) -> Option<String> {
    let present: Vec<&str> = words.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.join(" "))
    }
}
