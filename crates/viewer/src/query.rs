//! Navigation state carried in the URL query string.
//!
//! `date`, `admin` and `compare` are the only source of truth for what the
//! explore page shows. Each is validated on its own: an invalid value is
//! dropped and the others still apply.

use chrono::NaiveDate;
use ntl_common::{ViewerError, ViewerResult};
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreQuery {
    pub date: Option<NaiveDate>,
    /// Selected region id.
    pub admin: Option<String>,
    pub compare: bool,
    /// Unrelated parameters, kept in order.
    extra: Vec<(String, String)>,
}

impl ExploreQuery {
    /// Parse a query string, with or without the leading `?`. Invalid
    /// parameters are logged and dropped.
    pub fn parse(query: &str) -> Self {
        let (parsed, errors) = Self::parse_report(query);
        for err in errors {
            warn!(error = %err, "Ignoring query parameter");
        }
        parsed
    }

    /// Parse and also return a validation error per dropped parameter.
    pub fn parse_report(query: &str) -> (Self, Vec<ViewerError>) {
        let mut parsed = Self::default();
        let mut errors = Vec::new();

        let pairs: Vec<(String, String)> =
            match serde_urlencoded::from_str(query.trim_start_matches('?')) {
                Ok(pairs) => pairs,
                Err(e) => {
                    errors.push(ViewerError::validation("query", e.to_string()));
                    return (parsed, errors);
                }
            };

        for (key, value) in pairs {
            match key.as_str() {
                "date" => match parse_date(&value) {
                    Ok(date) => parsed.date = Some(date),
                    Err(e) => errors.push(e),
                },
                "admin" => {
                    if value.is_empty() {
                        errors.push(ViewerError::validation("admin", "empty region id"));
                    } else {
                        parsed.admin = Some(value);
                    }
                }
                "compare" => parsed.compare = value == "true",
                _ => parsed.extra.push((key, value)),
            }
        }
        (parsed, errors)
    }

    /// Render as a query string without the leading `?`. Unset parameters
    /// are left out.
    pub fn render(&self) -> String {
        let mut pairs: Vec<(&str, String)> = self
            .extra
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        if let Some(date) = self.date {
            pairs.push(("date", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(admin) = &self.admin {
            pairs.push(("admin", admin.clone()));
        }
        if self.compare {
            pairs.push(("compare", "true".to_string()));
        }
        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }

    /// The comparison view needs a region and a date.
    pub fn is_compare_open(&self) -> bool {
        self.compare && self.admin.is_some() && self.date.is_some()
    }

    /// Select a region. A different region clears the date and closes the
    /// comparison, since dates are per region.
    pub fn select_region(&mut self, admin: Option<String>) {
        if admin != self.admin {
            self.date = None;
            self.compare = false;
        }
        self.admin = admin;
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    pub fn set_compare(&mut self, compare: bool) {
        self.compare = compare;
    }
}

fn parse_date(value: &str) -> ViewerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| ViewerError::validation("date", format!("'{}': {}", value, e)))
}
