pub mod algebra;
pub mod bound;
pub mod element;
pub mod operand;

pub use bound::BoundSet;
pub use element::{Bincoded, Element};
pub use operand::{Classified, Operand, classify};
