// CEA-708 character sets.
//
// # Modules
//
// - `bank`: Code values, the EXT1 prefix, and G0/G1/G2 classification
// - `catalog`: Code value to Unicode scalar mapping and scanner ordering

pub mod bank;
pub mod catalog;

pub use bank::{CharacterBank, CodeValue, EXT1};
pub use catalog::{
    Catalog, CatalogEntry, UnknownCode, Utf8Bytes, default_catalog, sort_for_scanner,
};
