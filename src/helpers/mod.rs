pub mod logging;
pub mod source;
pub(crate) mod xml;
pub(crate) mod zip;
