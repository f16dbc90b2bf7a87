pub mod fluent;
pub mod query_options;
pub mod query_part;
pub mod simple_query;

pub use fluent::{search_field, FluentQueryPart};
pub use query_options::QueryOptions;
pub use query_part::{Operand, Predicate, QueryOperator, QueryPart};
pub use simple_query::SimpleQuery;
