pub mod conditional;
pub mod score;
pub mod sigma;
pub mod spectral;
pub mod universe;

pub use conditional::*;
pub use score::*;
pub use sigma::*;
pub use spectral::*;
pub use universe::*;
