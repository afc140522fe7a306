//! Low level readers shared by the spreadsheet decoders.
pub(crate) mod xml;
pub(crate) mod zip;
