// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - Database: CoffeeRepository, FlavorRepository, EventRepository, TransactionFactory
// - PgUnitOfWork: UnitOfWork over a single sqlx transaction

pub mod models;
pub mod repositories;
pub mod unit_of_work;

pub use models::*;
pub use repositories::*;
pub use unit_of_work::PgUnitOfWork;
