pub use self::engine::MigrationEngine;
pub use self::report::{FailedRecord, MigrationReport, PassOutcome, PassReport};

mod engine;
mod report;
