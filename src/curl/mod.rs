mod model;
mod patterns;

pub use model::{Headers, Request, BODY_METHODS};
pub use patterns::{parse, ParseError};
