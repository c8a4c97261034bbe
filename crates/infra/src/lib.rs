//! Infrastructure layer: configuration, repositories, the unit of work that
//! persists aggregates and dispatches their events, and LDC account enrolment.

/// Configuration loading and representation.
pub mod config;
pub mod ldc_accounts;
pub mod repository;
pub mod store;

pub use config::{ConfigError, InfraConfig};
pub use ldc_accounts::{EnrolmentError, LdcAccountEnrolment};
pub use repository::{InMemoryRepository, Repository, RepositoryError};
pub use store::{AggregateStore, StoreError};
