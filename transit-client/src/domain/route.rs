//! Route types.

use std::fmt;

use serde::Serialize;

/// Color assigned to routes whose data carries none.
pub const DEFAULT_ROUTE_COLOR: &str = "#1E88E5";

/// Error returned when a route identifier or number is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route: {reason}")]
pub struct InvalidRoute {
    reason: &'static str,
}

/// A non-blank route identifier.
///
/// Identifiers are trimmed on construction, so two ids that differ only in
/// surrounding whitespace compare equal.
///
/// # Examples
///
/// ```
/// use transit_client::domain::RouteId;
///
/// let id = RouteId::parse(" r-12 ").unwrap();
/// assert_eq!(id.as_str(), "r-12");
///
/// assert!(RouteId::parse("").is_err());
/// assert!(RouteId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    /// Parse a route id; blank input is rejected.
    pub fn parse(s: &str) -> Result<Self, InvalidRoute> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidRoute {
                reason: "id must not be blank",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transit route in the catalog.
///
/// Routes are immutable once built; a refresh replaces the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub id: RouteId,
    /// Display number, e.g. "12" or "N4". Never blank.
    pub number: String,
    pub name: String,
    pub description: String,
    /// Hex color, `DEFAULT_ROUTE_COLOR` when the source has none.
    pub color: String,
    pub travel_time: Option<String>,
    pub price_primary: Option<String>,
    pub price_secondary: Option<String>,
    pub payment_methods: Option<String>,
}

impl Route {
    /// Create a route with the required fields and the default color.
    pub fn new(
        id: &str,
        number: &str,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, InvalidRoute> {
        let id = RouteId::parse(id)?;
        let number = number.trim();
        if number.is_empty() {
            return Err(InvalidRoute {
                reason: "number must not be blank",
            });
        }

        Ok(Self {
            id,
            number: number.to_string(),
            name: name.into(),
            description: description.into(),
            color: DEFAULT_ROUTE_COLOR.to_string(),
            travel_time: None,
            price_primary: None,
            price_secondary: None,
            payment_methods: None,
        })
    }

    /// Set the display color; blank input keeps the default.
    pub fn with_color(mut self, color: &str) -> Self {
        if !color.trim().is_empty() {
            self.color = color.trim().to_string();
        }
        self
    }

    /// Set the optional fare and travel metadata. Blank values are omitted.
    pub fn with_details(
        mut self,
        travel_time: &str,
        price_primary: &str,
        price_secondary: &str,
        payment_methods: &str,
    ) -> Self {
        self.travel_time = non_blank(travel_time);
        self.price_primary = non_blank(price_primary);
        self.price_secondary = non_blank(price_secondary);
        self.payment_methods = non_blank(payment_methods);
        self
    }

    /// Case-insensitive substring match over number, name and description.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.number.to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Short label used in reminders, e.g. "12 - Harbour Loop".
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.number.clone()
        } else {
            format!("{} - {}", self.number, self.name)
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_id_rejects_blank() {
        assert!(RouteId::parse("").is_err());
        assert!(RouteId::parse(" \t").is_err());
        assert_eq!(RouteId::parse("r1").unwrap().as_str(), "r1");
    }

    #[test]
    fn route_id_display_and_debug() {
        let id = RouteId::parse("r7").unwrap();
        assert_eq!(id.to_string(), "r7");
        assert_eq!(format!("{:?}", id), "RouteId(r7)");
    }

    #[test]
    fn route_requires_number() {
        let err = Route::new("r1", "  ", "Name", "Desc").unwrap_err();
        assert_eq!(err.to_string(), "invalid route: number must not be blank");
    }

    #[test]
    fn new_route_gets_default_color() {
        let route = Route::new("r1", "1", "Centro", "").unwrap();
        assert_eq!(route.color, DEFAULT_ROUTE_COLOR);
        assert_eq!(route.clone().with_color("").color, DEFAULT_ROUTE_COLOR);
        assert_eq!(route.with_color("#FF0000").color, "#FF0000");
    }

    #[test]
    fn blank_details_are_omitted() {
        let route = Route::new("r1", "1", "Centro", "")
            .unwrap()
            .with_details("45 min", "", " ", "Cash");
        assert_eq!(route.travel_time.as_deref(), Some("45 min"));
        assert_eq!(route.price_primary, None);
        assert_eq!(route.price_secondary, None);
        assert_eq!(route.payment_methods.as_deref(), Some("Cash"));
    }

    #[test]
    fn matching_covers_number_name_description() {
        let route = Route::new("r1", "12A", "Harbour Loop", "Via Market Street").unwrap();
        assert!(route.matches_lowercase("12a"));
        assert!(route.matches_lowercase("harbour"));
        assert!(route.matches_lowercase("market"));
        assert!(!route.matches_lowercase("airport"));
    }

    #[test]
    fn label_falls_back_to_number() {
        let named = Route::new("r1", "12", "Harbour Loop", "").unwrap();
        assert_eq!(named.label(), "12 - Harbour Loop");
        let unnamed = Route::new("r2", "7", "", "").unwrap();
        assert_eq!(unnamed.label(), "7");
    }
}
