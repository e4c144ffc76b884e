//! Clone report model, XML wire format, and the detection driver that
//! produces report contents from the normalized unit stream.

pub mod detect;
pub mod model;
pub mod reader;
pub mod writer;
