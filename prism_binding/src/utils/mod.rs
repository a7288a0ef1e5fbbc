mod hash;
mod name_match;

pub use hash::{hash_combine, HashBuilder};
pub use name_match::streq_suff;
