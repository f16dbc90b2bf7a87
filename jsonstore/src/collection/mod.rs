pub(crate) mod default_store_collection;
mod document;
mod options;
mod store_collection;

pub use document::{Document, DocumentOperation};
pub use options::{AddOptions, ChangeOptions, ProvisionOptions, RemoveOptions};
pub use store_collection::{StoreCollection, StoreCollectionProvider};
