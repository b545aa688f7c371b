//! Order models.

use crate::api::models::OrderSummary;

/// One line of a stock conflict: what was asked for versus what the backend
/// can fulfil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConflict {
    /// Product identity of the conflicted line.
    pub product_code: String,

    /// Display name, when the line is known locally.
    pub name: Option<String>,

    /// Quantity that was submitted.
    pub requested: u32,

    /// Quantity the backend can fulfil; zero means out of stock.
    pub available: u32,
}

/// Client-side filter over the order history listing.
#[derive(Debug, Clone, Default)]
pub struct OrderHistoryFilter {
    /// Raw status label the order must carry.
    pub status: Option<String>,

    /// Case-insensitive substring of the order code.
    pub code: Option<String>,
}

impl OrderHistoryFilter {
    /// Whether an order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &OrderSummary) -> bool {
        if let Some(status) = &self.status
            && order.status.as_deref() != Some(status.as_str())
        {
            return false;
        }

        if let Some(code) = &self.code
            && !order.code.to_lowercase().contains(&code.to_lowercase())
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(code: &str, status: Option<&str>) -> OrderSummary {
        OrderSummary {
            id: code.to_string(),
            code: code.to_string(),
            status: status.map(str::to_string),
            created_at: None,
            delivery_time: None,
            courier: None,
            items: Vec::new(),
        }
    }

    #[test]
    fn status_filter_requires_an_exact_label() {
        let filter = OrderHistoryFilter {
            status: Some("pending".to_string()),
            ..OrderHistoryFilter::default()
        };

        assert!(filter.matches(&order("A-1", Some("pending"))));
        assert!(!filter.matches(&order("A-2", Some("assembled"))));
        assert!(!filter.matches(&order("A-3", None)));
    }

    #[test]
    fn code_filter_is_a_case_insensitive_substring() {
        let filter = OrderHistoryFilter {
            code: Some("z-10".to_string()),
            ..OrderHistoryFilter::default()
        };

        assert!(filter.matches(&order("Z-1042", None)));
        assert!(!filter.matches(&order("Z-2042", None)));
    }
}
