mod handle;
mod reference;

pub use handle::ArchiveHandle;
pub use reference::{ArchiveReader, ArchiveReference, ArchiveWriter};

/// Suffix of entries holding a loadable code unit.
pub const UNIT_SUFFIX: &str = ".class";

/// Map a dotted unit name (`net.demo.Main`) to its entry (`net/demo/Main.class`).
pub fn unit_entry_name(unit: &str) -> String {
    format!("{}{}", unit.replace('.', "/"), UNIT_SUFFIX)
}

/// Inverse of [`unit_entry_name`]; `None` for entries that are not units.
pub fn unit_name_of(entry: &str) -> Option<String> {
    entry
        .strip_suffix(UNIT_SUFFIX)
        .map(|stem| stem.replace('/', "."))
}
