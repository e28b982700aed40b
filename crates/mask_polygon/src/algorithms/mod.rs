pub mod hull;
pub mod reduction;
pub mod kgon;
pub mod foreground;
pub mod preprocessing;
pub mod filtering;

pub use hull::convex_hull;
pub use reduction::reduce_to_k;
pub use kgon::*;
pub use foreground::*;
pub use preprocessing::*;
pub use filtering::*;
