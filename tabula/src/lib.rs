pub use tabula_adapter::*;
pub use {tabula_error as error, tabula_format as format};
