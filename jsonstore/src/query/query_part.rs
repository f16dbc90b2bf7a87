use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Operators available to advanced queries.
///
/// `Like` matches a substring anywhere in the indexed value, `RightLike`
/// anchors at the start (`value%`), `LeftLike` at the end (`%value`).
/// Comparisons are numeric when both sides parse as numbers, lexicographic
/// otherwise. `Between` is inclusive on both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Between,
    NotBetween,
    Inside,
    NotInside,
    Like,
    NotLike,
    LeftLike,
    NotLeftLike,
    RightLike,
    NotRightLike,
}

impl QueryOperator {
    /// Maps an input key to its operator. Returns `None` for unknown keys.
    pub fn parse(key: &str) -> Option<QueryOperator> {
        match key {
            "equal" => Some(QueryOperator::Equal),
            "notEqual" => Some(QueryOperator::NotEqual),
            "lessThan" => Some(QueryOperator::LessThan),
            "lessThanEquals" => Some(QueryOperator::LessThanOrEqual),
            "greaterThan" => Some(QueryOperator::GreaterThan),
            "greaterThanEquals" => Some(QueryOperator::GreaterThanOrEqual),
            "between" => Some(QueryOperator::Between),
            "notBetween" => Some(QueryOperator::NotBetween),
            "inside" => Some(QueryOperator::Inside),
            "notInside" => Some(QueryOperator::NotInside),
            "like" => Some(QueryOperator::Like),
            "notLike" => Some(QueryOperator::NotLike),
            "leftLike" => Some(QueryOperator::LeftLike),
            "notLeftLike" => Some(QueryOperator::NotLeftLike),
            "rightLike" => Some(QueryOperator::RightLike),
            "notRightLike" => Some(QueryOperator::NotRightLike),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::Equal => "equal",
            QueryOperator::NotEqual => "notEqual",
            QueryOperator::LessThan => "lessThan",
            QueryOperator::LessThanOrEqual => "lessThanEquals",
            QueryOperator::GreaterThan => "greaterThan",
            QueryOperator::GreaterThanOrEqual => "greaterThanEquals",
            QueryOperator::Between => "between",
            QueryOperator::NotBetween => "notBetween",
            QueryOperator::Inside => "inside",
            QueryOperator::NotInside => "notInside",
            QueryOperator::Like => "like",
            QueryOperator::NotLike => "notLike",
            QueryOperator::LeftLike => "leftLike",
            QueryOperator::NotLeftLike => "notLeftLike",
            QueryOperator::RightLike => "rightLike",
            QueryOperator::NotRightLike => "notRightLike",
        }
    }
}

impl Display for QueryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operand of a predicate; the shape is operator-specific.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Single comparison value (equal, like, less-than, ...)
    Single(Value),
    /// Inclusive range bounds for between / not-between
    Pair(Value, Value),
    /// Value set for inside / not-inside
    Set(Vec<Value>),
}

/// One operator predicate of an advanced query, scoped to one search field.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub operator: QueryOperator,
    pub operand: Operand,
}

impl Predicate {
    pub fn new(field: &str, operator: QueryOperator, operand: Operand) -> Predicate {
        Predicate {
            field: field.to_lowercase(),
            operator,
            operand,
        }
    }
}

/// A compiled advanced query: an ordered list of operator predicates plus an
/// optional raw id-equality list.
///
/// The compiler's contract at this layer is purely structural: parse the
/// input into typed predicates preserving input order. Semantic execution
/// (matching against indexed columns) belongs to the store coordinator.
///
/// Input wire form is a JSON object of `operatorKey -> [{field: operand}]`
/// entries:
///
/// ```rust,ignore
/// use jsonstore::query::QueryPart;
/// use serde_json::json;
///
/// let part = QueryPart::parse(&json!({
///     "like": [{"name": "ca"}],
///     "between": [{"age": [18, 30]}],
/// }))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPart {
    predicates: Vec<Predicate>,
    ids: Vec<i64>,
}

impl QueryPart {
    pub fn new() -> QueryPart {
        QueryPart::default()
    }

    /// Compiles one advanced query part from its wire form.
    ///
    /// Fails with `InvalidSearchField` on unknown operator keys or operands
    /// that do not match the operator's required shape.
    pub fn parse(value: &Value) -> JsonStoreResult<QueryPart> {
        let object = match value.as_object() {
            Some(object) => object,
            None => {
                log::error!("Advanced query part must be a JSON object, got: {}", value);
                return Err(JsonStoreError::new(
                    "Advanced query part must be a JSON object",
                    ErrorKind::InvalidSearchField,
                ));
            }
        };

        let mut part = QueryPart::new();
        for (key, entry) in object {
            if key == "ids" {
                part.parse_ids(entry)?;
                continue;
            }

            let operator = match QueryOperator::parse(key) {
                Some(operator) => operator,
                None => {
                    log::error!("Unknown advanced query operator: {}", key);
                    return Err(JsonStoreError::new(
                        &format!("Unknown advanced query operator: {}", key),
                        ErrorKind::InvalidSearchField,
                    ));
                }
            };

            let bindings = match entry.as_array() {
                Some(bindings) => bindings,
                None => {
                    log::error!("Operator {} expects an array of field bindings", key);
                    return Err(JsonStoreError::new(
                        &format!("Operator {} expects an array of field bindings", key),
                        ErrorKind::InvalidSearchField,
                    ));
                }
            };

            for binding in bindings {
                part.parse_binding(operator, binding)?;
            }
        }
        Ok(part)
    }

    fn parse_ids(&mut self, entry: &Value) -> JsonStoreResult<()> {
        let values = entry.as_array().cloned().unwrap_or_else(|| vec![entry.clone()]);
        for id_value in &values {
            match id_value.as_i64() {
                Some(id) => self.ids.push(id),
                None => {
                    log::error!("Advanced query id is not an integer: {}", id_value);
                    return Err(JsonStoreError::new(
                        "Advanced query ids must be integers",
                        ErrorKind::InvalidSearchField,
                    ));
                }
            }
        }
        Ok(())
    }

    fn parse_binding(&mut self, operator: QueryOperator, binding: &Value) -> JsonStoreResult<()> {
        let object = match binding.as_object() {
            Some(object) => object,
            None => {
                log::error!("Field binding must be a JSON object, got: {}", binding);
                return Err(JsonStoreError::new(
                    "Field binding must be a JSON object",
                    ErrorKind::InvalidSearchField,
                ));
            }
        };

        for (field, operand_value) in object {
            let operand = Self::parse_operand(operator, operand_value)?;
            self.predicates.push(Predicate::new(field, operator, operand));
        }
        Ok(())
    }

    fn parse_operand(operator: QueryOperator, value: &Value) -> JsonStoreResult<Operand> {
        match operator {
            QueryOperator::Between | QueryOperator::NotBetween => match value.as_array() {
                Some(bounds) if bounds.len() == 2 => {
                    Ok(Operand::Pair(bounds[0].clone(), bounds[1].clone()))
                }
                _ => {
                    log::error!("{} operand must be a two-element array", operator);
                    Err(JsonStoreError::new(
                        &format!("{} operand must be a two-element array", operator),
                        ErrorKind::InvalidSearchField,
                    ))
                }
            },
            QueryOperator::Inside | QueryOperator::NotInside => match value.as_array() {
                Some(values) => Ok(Operand::Set(values.clone())),
                None => {
                    log::error!("{} operand must be an array of values", operator);
                    Err(JsonStoreError::new(
                        &format!("{} operand must be an array of values", operator),
                        ErrorKind::InvalidSearchField,
                    ))
                }
            },
            _ => Ok(Operand::Single(value.clone())),
        }
    }

    pub(crate) fn add_predicate(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Adds a raw id lookup to this query part.
    pub fn add_id(mut self, id: i64) -> QueryPart {
        self.ids.push(id);
        self
    }

    /// The predicates in input order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty() && self.ids.is_empty()
    }
}
