pub mod document;
pub mod error;
pub mod layout;
pub mod lock;
pub mod store;

pub use document::decode_all;
pub use error::{FolioError, Result};
pub use store::{Store, StoreOptions};
