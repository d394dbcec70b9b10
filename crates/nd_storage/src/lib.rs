pub mod backends;

pub use backends::*;
