// Stream module: blocking I/O primitives behind a swappable interface
pub mod traits;
pub mod tcp;

pub use traits::*;
pub use tcp::*;
