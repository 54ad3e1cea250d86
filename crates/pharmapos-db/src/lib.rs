//! # pharmapos-db
//!
//! SQLite persistence for the register: one repository per table, plus the
//! checkout transaction that decrements stock and records the sale together.
//!
//! ## Where It Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PharmaPOS Data Flow                              │
//! │                                                                         │
//! │  axum handler (POST /checkout)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   pharmapos-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────────┐  ┌─────────────┐  │   │
//! │  │   │   Database    │    │   Repositories    │  │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                   │  │ (embedded)  │  │   │
//! │  │   │               │    │ ProductRepository │  │             │  │   │
//! │  │   │ SqlitePool    │◄───│ DiscountRepository│  │ 001_initial │  │   │
//! │  │   │ WAL, FKs on   │    │ TransactionRepo.. │  │  _schema    │  │   │
//! │  │   └───────────────┘    └───────────────────┘  └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/pharmapos/pharmapos.db                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories borrow nothing: each accessor on [`Database`] clones the
//! pool handle, so a handler can hold one across awaits.
//!
//!
//! ```rust,ignore
//! use pharmapos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pharmapos.db")).await?;
//! let products = db.products().search("paracetamol").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::{CustomerInput, CustomerRepository};
pub use repository::discount::{
    DiscountInput, DiscountPatch, DiscountRepository, DiscountRuleInput,
};
pub use repository::product::{ProductInput, ProductRepository};
pub use repository::settings::SettingsRepository;
pub use repository::suspended::{SuspendSaleInput, SuspendedSaleRepository};
pub use repository::transaction::{CheckoutRecord, TransactionRepository};
pub use repository::user::UserRepository;

/// Fresh primary key for any table.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
