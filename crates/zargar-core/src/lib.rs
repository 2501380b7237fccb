//! # zargar-core: Pure Business Logic for the Zargar ERP Backend
//!
//! This crate is the **heart** of the Zargar gold-shop ERP. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Zargar ERP Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    api-server (REST / axum)                     │   │
//! │  │    auth ──► routes ──► JSON request/response mapping            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    zargar-db (Database Layer)                   │   │
//! │  │     repositories, engines, audit trail, SQLite migrations       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ zargar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐ │   │
//! │  │   │  types   │ │ pricing  │ │ approval │ │    principal     │ │   │
//! │  │   │ Payment  │ │ formula  │ │  state   │ │  authorization   │ │   │
//! │  │   │AssetKind │ │  totals  │ │ machine  │ │  policy table    │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Transaction, Payment, InventorySnapshot, ...)
//! - [`pricing`] - The per-item pricing formula and transaction totals
//! - [`approval`] - The two-tier approval state machine and side-effect edges
//! - [`principal`] - Caller identity and the authorization policy
//! - [`validation`] - Structural business-rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are Rials (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use zargar_core::pricing::item_total_price;
//!
//! // 2 units at 1000 Rials, 10% wage, 5% profit, 9% tax on the markup.
//! let total = item_total_price(
//!     1000,
//!     Decimal::from(2),
//!     Some(Decimal::from(10)),
//!     Some(Decimal::from(5)),
//!     Some(Decimal::from(9)),
//! );
//! assert_eq!(total, 2337);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod approval;
pub mod error;
pub mod pricing;
pub mod principal;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use zargar_core::Payment` instead of
// `use zargar_core::types::Payment`

pub use approval::{check_rejection, next_approval_status, payment_effects, PaymentEffects};
pub use error::{CoreError, CoreResult};
pub use principal::{authorize, Access, Principal};
pub use types::*;
