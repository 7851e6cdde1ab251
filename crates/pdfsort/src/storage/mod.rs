pub mod archive;
pub mod filesystem;

pub use archive::{extract_archive, find_archives};
pub use filesystem::{FileStorage, COMMANDE_DIRECTORY, INVOICE_DIRECTORY};
