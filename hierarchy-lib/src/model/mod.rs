//! Typed models

mod page;
mod record;
mod skel;
mod value;

pub use page::*;
pub use record::*;
pub use skel::*;
pub use value::*;
