//! JSON backend: the analysis itself, serialized field by field.
//!
//! The output is the import format read back by
//! [`Analysis::from_file`](crate::analysis::Analysis::from_file).

use crate::analysis::Analysis;
use crate::error::Result;

pub fn render(analysis: &Analysis) -> Result<String> {
    analysis.to_json()
}
