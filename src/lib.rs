pub mod error;
pub(crate) mod parser;
pub mod reader;
pub mod record;
pub mod types;

pub use error::{Error, Result};
pub use reader::{ReaderOptions, VcfRecords};
pub use record::{GenotypeCall, VariantRecord};
pub use types::Header;
