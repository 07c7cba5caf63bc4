// Application layer - the ledger store handle and its reports.
// Clients (the CLI, importers, tests) go through LedgerService and never
// touch the repository or the in-memory ledger directly.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
