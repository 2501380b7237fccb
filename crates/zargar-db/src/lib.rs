//! # zargar-db: Database Layer for Zargar ERP
//!
//! SQLite persistence for the gold-shop bookkeeping system, built on
//! sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Zargar Data Flow                                │
//! │                                                                         │
//! │  HTTP Handler (POST /payments/:id/approve)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     zargar-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌────────────────┐  │    │
//! │  │   │   Database    │   │  Repositories  │   │    Engines     │  │    │
//! │  │   │   (pool.rs)   │   │  (user, item,  │   │  (transaction, │  │    │
//! │  │   │               │◄──│   contact...)  │   │    payment)    │  │    │
//! │  │   │ SqlitePool    │   │  plain CRUD    │   │  state machine │  │    │
//! │  │   │ Migrations    │   │  + audit row   │   │  + side effects│  │    │
//! │  │   └───────────────┘   └────────────────┘   └────────────────┘  │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys on)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-aggregate CRUD (user, contact, item, ...)
//! - [`engine`] - Approval state machines with financial side effects
//! - [`audit`] - Audit trail writes and queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zargar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/zargar.db")).await?;
//!
//! let payment = db.payments().create(&principal, input).await?;
//! db.payments().approve(&principal, &payment.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

mod row;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use audit::{AuditLogFilter, AuditLogRepository};
pub use engine::payment::{PaymentEngine, PaymentInput, PaymentSearch};
pub use engine::transaction::{ItemInput, TransactionEngine, TransactionPatch, TransactionSearch};
pub use repository::account_ledger::{AccountLedgerRepository, LedgerSearch, LedgerUpdate};
pub use repository::contact::{ContactRepository, ContactUpdate};
pub use repository::inventory::{InventoryRepository, SnapshotDelta};
pub use repository::investor::InvestorRepository;
pub use repository::item::{ItemRepository, ProfileDefaults};
pub use repository::saved_bank_account::{BankAccountUpdate, SavedBankAccountRepository};
pub use repository::user::UserRepository;
