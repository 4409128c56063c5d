//! Row filters for PostgREST queries

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
        }
    }
}

/// A `column=op.value` query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    pub fn new<V: ToString>(column: &str, operator: FilterOperator, value: V) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    /// The query parameter pair for this filter
    pub fn to_param(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.operator.as_str(), self.value),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_params() {
        assert_eq!(
            Filter::new("user_id", FilterOperator::Eq, "u-1").to_param(),
            ("user_id".to_string(), "eq.u-1".to_string())
        );
        assert_eq!(
            Filter::new("is_trash", FilterOperator::Eq, false).to_param(),
            ("is_trash".to_string(), "eq.false".to_string())
        );
    }
}
