use serde_json::Value;

use super::{Operand, Predicate, QueryOperator, QueryPart};

/// Creates a fluent predicate builder for the specified search field.
///
/// The returned builder attaches one operator predicate to a [`QueryPart`]
/// per call, preserving call order:
///
/// ```rust,ignore
/// use jsonstore::query::{search_field, QueryPart};
///
/// let part = QueryPart::new()
///     .with(search_field("age").greater_than(18))
///     .with(search_field("name").like("ca"));
/// ```
pub fn search_field(field_name: &str) -> FluentQueryPart {
    FluentQueryPart {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for constructing advanced query predicates on one field.
pub struct FluentQueryPart {
    field_name: String,
}

impl FluentQueryPart {
    /// Field equals the value.
    #[inline]
    pub fn equal<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::Equal, value)
    }

    /// Field does not equal the value.
    #[inline]
    pub fn not_equal<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::NotEqual, value)
    }

    /// Field is strictly less than the value.
    #[inline]
    pub fn less_than<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::LessThan, value)
    }

    /// Field is less than or equal to the value.
    #[inline]
    pub fn less_than_or_equal<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::LessThanOrEqual, value)
    }

    /// Field is strictly greater than the value.
    #[inline]
    pub fn greater_than<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::GreaterThan, value)
    }

    /// Field is greater than or equal to the value.
    #[inline]
    pub fn greater_than_or_equal<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::GreaterThanOrEqual, value)
    }

    /// Field is within the inclusive range.
    pub fn between<T: Into<Value>>(self, lower: T, upper: T) -> Predicate {
        Predicate::new(
            &self.field_name,
            QueryOperator::Between,
            Operand::Pair(lower.into(), upper.into()),
        )
    }

    /// Field is outside the inclusive range.
    pub fn not_between<T: Into<Value>>(self, lower: T, upper: T) -> Predicate {
        Predicate::new(
            &self.field_name,
            QueryOperator::NotBetween,
            Operand::Pair(lower.into(), upper.into()),
        )
    }

    /// Field is one of the given values.
    pub fn inside<T: Into<Value>>(self, values: Vec<T>) -> Predicate {
        Predicate::new(
            &self.field_name,
            QueryOperator::Inside,
            Operand::Set(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Field is none of the given values.
    pub fn not_inside<T: Into<Value>>(self, values: Vec<T>) -> Predicate {
        Predicate::new(
            &self.field_name,
            QueryOperator::NotInside,
            Operand::Set(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Field contains the value as a substring.
    #[inline]
    pub fn like<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::Like, value)
    }

    /// Field does not contain the value as a substring.
    #[inline]
    pub fn not_like<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::NotLike, value)
    }

    /// Field ends with the value.
    #[inline]
    pub fn left_like<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::LeftLike, value)
    }

    /// Field does not end with the value.
    #[inline]
    pub fn not_left_like<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::NotLeftLike, value)
    }

    /// Field starts with the value.
    #[inline]
    pub fn right_like<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::RightLike, value)
    }

    /// Field does not start with the value.
    #[inline]
    pub fn not_right_like<T: Into<Value>>(self, value: T) -> Predicate {
        self.single(QueryOperator::NotRightLike, value)
    }

    fn single<T: Into<Value>>(self, operator: QueryOperator, value: T) -> Predicate {
        Predicate::new(&self.field_name, operator, Operand::Single(value.into()))
    }
}

impl QueryPart {
    /// Appends a predicate built with [`search_field`].
    pub fn with(mut self, predicate: Predicate) -> QueryPart {
        self.add_predicate(predicate);
        self
    }
}
