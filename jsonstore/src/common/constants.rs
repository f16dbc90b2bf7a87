//! Reserved document field names and numeric sentinels preserved at the
//! host boundary.

/// Reserved field holding a document's unique identifier.
pub const FIELD_ID: &str = "_id";

/// Reserved field holding a document's JSON payload.
pub const FIELD_JSON: &str = "json";

/// Reserved field holding a document's dirty flag in wire form.
pub const FIELD_DIRTY: &str = "_dirty";

/// Reserved field holding a document's sync operation tag in wire form.
pub const FIELD_OPERATION: &str = "_operation";

/// Success return code.
pub const RC_OK: i32 = 0;

/// Returned by provisioning when an existing table was found and reopened.
pub const RC_PROVISION_TABLE_EXISTS: i32 = 1;

/// Boolean predicate results cross the host boundary as reserved integers,
/// not native booleans.
pub const RC_TRUE: i32 = 1;
pub const RC_FALSE: i32 = 0;

/// Separator for dotted index paths (`address.city`).
pub const PATH_SEPARATOR: &str = ".";
