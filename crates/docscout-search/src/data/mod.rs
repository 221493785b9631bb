//! Static data tables: document categories, domain lists, brand aliases.

pub mod brands;
pub mod categories;
pub mod domains;
