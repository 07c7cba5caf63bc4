// Moving ledger data in and out: JSON in the storage record format, and CSV.

pub mod export;
pub mod import;

pub use export::*;
pub use import::*;
