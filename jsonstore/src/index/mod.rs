pub mod extractor;
pub mod schema;

pub use extractor::extract_index_values;
pub use schema::{IndexSchema, SearchFieldType};
