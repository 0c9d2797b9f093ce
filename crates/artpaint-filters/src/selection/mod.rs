//! Turning a membership mask into selection outlines.
//!
//! [`SelectionTracer`] walks the boundary of every connected region of a
//! mask and returns one [`Polygon`] per boundary. Outer boundaries come out
//! clockwise and holes counter-clockwise, so a consumer can rebuild the
//! selection by adding the former and subtracting the latter without an
//! even-odd fill pass.

mod polygon;
mod tracer;

pub use polygon::{Polygon, Winding};
pub use tracer::{SelectionTracer, TraceSettings};
