//! # Domain Types
//!
//! Core domain types used throughout the Zargar ERP backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  Transaction    │   │    Payment      │   │ InventorySnapshot   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)          │   │
//! │  │  status         │   │  status         │   │  money_balance      │   │
//! │  │  total_price    │   │  direction      │   │  per-asset balances │   │
//! │  │  items (child)  │   │  one settlement │   │  append-only        │   │
//! │  └─────────────────┘   │  target link    │   └─────────────────────┘   │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  AssetKind is the closed set of tracked assets; every Item names        │
//! │  exactly one of them, and every InventorySnapshot carries a balance     │
//! │  for each of them.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Roles
// =============================================================================

/// Roles recognised by the permission layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access; the second approval tier.
    Admin,
    /// Regular shop staff; the first approval tier.
    User,
    /// External capital provider; read access to their own records only.
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Investor => "investor",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "investor" => Ok(Role::Investor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// =============================================================================
// Approval Status
// =============================================================================

/// Shared two-tier approval status for Transactions and Payments.
///
/// ```text
///           approve (user)            approve (admin)
///   Draft ─────────────────► ApprovedByUser ─────────► ApprovedByAdmin
///     ▲  ◄───────────────────────┘    ▲                     │
///     │        reject (any)           └──── approve (admin) │
///     └─────────────────────────────────── reject (admin) ──┘
/// ```
///
/// Financial side effects only ever fire on the edges into and out of
/// `ApprovedByAdmin` (inventory) or out of / back into `Draft` (ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Freely editable by its recorder.
    Draft,
    /// Confirmed by a regular user; awaiting admin review.
    ApprovedByUser,
    /// Fully approved; financial effects applied.
    ApprovedByAdmin,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::ApprovedByUser => "approved_by_user",
            ApprovalStatus::ApprovedByAdmin => "approved_by_admin",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApprovalStatus::Draft),
            "approved_by_user" => Ok(ApprovalStatus::ApprovedByUser),
            "approved_by_admin" => Ok(ApprovalStatus::ApprovedByAdmin),
            other => Err(format!("unknown approval status: {other}")),
        }
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        ApprovalStatus::Draft
    }
}

// =============================================================================
// Transaction Direction
// =============================================================================

/// Direction of a transaction line item, from the shop's perspective.
///
/// Direction only affects the SIGN with which an item contributes to the
/// parent transaction's total and to inventory, never the per-item
/// pricing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// The shop buys from the contact (inventory up, money owed out).
    Buy,
    /// The shop sells to the contact (inventory down, money owed in).
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

// =============================================================================
// Payment Enums
// =============================================================================

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CardTransaction,
    PosMachine,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CardTransaction => "card_transaction",
            PaymentMethod::PosMachine => "pos_machine",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card_transaction" => Ok(PaymentMethod::CardTransaction),
            "pos_machine" => Ok(PaymentMethod::PosMachine),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Direction of a payment relative to the shop's cash balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    /// Money flowing into the business.
    Incoming,
    /// Money flowing out of the business.
    Outgoing,
    /// Debt moving between parties. Never touches the cash balance and
    /// must settle against an account ledger.
    InternalTransfer,
}

impl PaymentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentDirection::Incoming => "incoming",
            PaymentDirection::Outgoing => "outgoing",
            PaymentDirection::InternalTransfer => "internal_transfer",
        }
    }
}

impl FromStr for PaymentDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(PaymentDirection::Incoming),
            "outgoing" => Ok(PaymentDirection::Outgoing),
            "internal_transfer" => Ok(PaymentDirection::InternalTransfer),
            other => Err(format!("unknown payment direction: {other}")),
        }
    }
}

// =============================================================================
// Measurement Kind
// =============================================================================

/// How an item is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Measured by quantity (coins). Whole numbers only.
    Countable,
    /// Measured by weight (gold, saffron) or fractional units (currency).
    Uncountable,
}

impl MeasurementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Countable => "countable",
            MeasurementKind::Uncountable => "uncountable",
        }
    }
}

impl FromStr for MeasurementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "countable" => Ok(MeasurementKind::Countable),
            "uncountable" => Ok(MeasurementKind::Uncountable),
            other => Err(format!("unknown measurement kind: {other}")),
        }
    }
}

// =============================================================================
// Investor Status
// =============================================================================

/// Business status of an investor's account. Gates login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestorStatus {
    Active,
    Suspended,
    Closed,
}

impl InvestorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestorStatus::Active => "active",
            InvestorStatus::Suspended => "suspended",
            InvestorStatus::Closed => "closed",
        }
    }
}

impl FromStr for InvestorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(InvestorStatus::Active),
            "suspended" => Ok(InvestorStatus::Suspended),
            "closed" => Ok(InvestorStatus::Closed),
            other => Err(format!("unknown investor status: {other}")),
        }
    }
}

// =============================================================================
// Audit Operation
// =============================================================================

/// Kind of mutation recorded by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOperation {
    Create,
    Update,
    Delete,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Create => "CREATE",
            AuditOperation::Update => "UPDATE",
            AuditOperation::Delete => "DELETE",
        }
    }
}

impl FromStr for AuditOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditOperation::Create),
            "UPDATE" => Ok(AuditOperation::Update),
            "DELETE" => Ok(AuditOperation::Delete),
            other => Err(format!("unknown audit operation: {other}")),
        }
    }
}

// =============================================================================
// Asset Kinds
// =============================================================================

/// The closed set of tracked inventory assets.
///
/// This enum is the single source of truth: every `Item` names exactly
/// one asset kind, and every `InventorySnapshot` carries one balance per
/// kind. Weight-based kinds use decimal quantities; countable kinds use
/// whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    // Weights and fractional units
    NewGold,
    UsedGold,
    PersianCoin,
    MoltenGold,
    Saffron,
    Dollar,
    Euro,
    Pound,
    // Countable (whole coins)
    EmamiCoin86,
    HalfCoin86,
    QuarterCoin86,
    EmamiCoinEtc,
    HalfCoinEtc,
    QuarterCoinEtc,
}

impl AssetKind {
    /// All asset kinds, in snapshot column order.
    pub const ALL: [AssetKind; 14] = [
        AssetKind::NewGold,
        AssetKind::UsedGold,
        AssetKind::PersianCoin,
        AssetKind::MoltenGold,
        AssetKind::Saffron,
        AssetKind::Dollar,
        AssetKind::Euro,
        AssetKind::Pound,
        AssetKind::EmamiCoin86,
        AssetKind::HalfCoin86,
        AssetKind::QuarterCoin86,
        AssetKind::EmamiCoinEtc,
        AssetKind::HalfCoinEtc,
        AssetKind::QuarterCoinEtc,
    ];

    /// Stable identifier; also the snapshot column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::NewGold => "new_gold",
            AssetKind::UsedGold => "used_gold",
            AssetKind::PersianCoin => "persian_coin",
            AssetKind::MoltenGold => "molten_gold",
            AssetKind::Saffron => "saffron",
            AssetKind::Dollar => "dollar",
            AssetKind::Euro => "euro",
            AssetKind::Pound => "pound",
            AssetKind::EmamiCoin86 => "emami_coin_86",
            AssetKind::HalfCoin86 => "half_coin_86",
            AssetKind::QuarterCoin86 => "quarter_coin_86",
            AssetKind::EmamiCoinEtc => "emami_coin_etc",
            AssetKind::HalfCoinEtc => "half_coin_etc",
            AssetKind::QuarterCoinEtc => "quarter_coin_etc",
        }
    }

    /// Whether this asset is counted in whole units.
    pub fn is_countable(&self) -> bool {
        matches!(
            self,
            AssetKind::EmamiCoin86
                | AssetKind::HalfCoin86
                | AssetKind::QuarterCoin86
                | AssetKind::EmamiCoinEtc
                | AssetKind::HalfCoinEtc
                | AssetKind::QuarterCoinEtc
        )
    }

    /// The measurement kind implied by this asset.
    pub fn measurement(&self) -> MeasurementKind {
        if self.is_countable() {
            MeasurementKind::Countable
        } else {
            MeasurementKind::Uncountable
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_gold" => Ok(AssetKind::NewGold),
            "used_gold" => Ok(AssetKind::UsedGold),
            "persian_coin" => Ok(AssetKind::PersianCoin),
            "molten_gold" => Ok(AssetKind::MoltenGold),
            "saffron" => Ok(AssetKind::Saffron),
            "dollar" => Ok(AssetKind::Dollar),
            "euro" => Ok(AssetKind::Euro),
            "pound" => Ok(AssetKind::Pound),
            "emami_coin_86" => Ok(AssetKind::EmamiCoin86),
            "half_coin_86" => Ok(AssetKind::HalfCoin86),
            "quarter_coin_86" => Ok(AssetKind::QuarterCoin86),
            "emami_coin_etc" => Ok(AssetKind::EmamiCoinEtc),
            "half_coin_etc" => Ok(AssetKind::HalfCoinEtc),
            "quarter_coin_etc" => Ok(AssetKind::QuarterCoinEtc),
            other => Err(format!("unknown asset kind: {other}")),
        }
    }
}

// =============================================================================
// Asset Balances
// =============================================================================

/// One balance per tracked asset. Decimal for weights, i64 for counts.
///
/// This is the per-asset half of an `InventorySnapshot`; the engines
/// manipulate it only through `get`/`apply`, which keeps the
/// countable/uncountable distinction in one place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetBalances {
    pub new_gold: Decimal,
    pub used_gold: Decimal,
    pub persian_coin: Decimal,
    pub molten_gold: Decimal,
    pub saffron: Decimal,
    pub dollar: Decimal,
    pub euro: Decimal,
    pub pound: Decimal,
    pub emami_coin_86: i64,
    pub half_coin_86: i64,
    pub quarter_coin_86: i64,
    pub emami_coin_etc: i64,
    pub half_coin_etc: i64,
    pub quarter_coin_etc: i64,
}

impl AssetBalances {
    /// The well-defined zero state used when no snapshot exists yet.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Current quantity of one asset, as a decimal regardless of kind.
    pub fn get(&self, kind: AssetKind) -> Decimal {
        match kind {
            AssetKind::NewGold => self.new_gold,
            AssetKind::UsedGold => self.used_gold,
            AssetKind::PersianCoin => self.persian_coin,
            AssetKind::MoltenGold => self.molten_gold,
            AssetKind::Saffron => self.saffron,
            AssetKind::Dollar => self.dollar,
            AssetKind::Euro => self.euro,
            AssetKind::Pound => self.pound,
            AssetKind::EmamiCoin86 => Decimal::from(self.emami_coin_86),
            AssetKind::HalfCoin86 => Decimal::from(self.half_coin_86),
            AssetKind::QuarterCoin86 => Decimal::from(self.quarter_coin_86),
            AssetKind::EmamiCoinEtc => Decimal::from(self.emami_coin_etc),
            AssetKind::HalfCoinEtc => Decimal::from(self.half_coin_etc),
            AssetKind::QuarterCoinEtc => Decimal::from(self.quarter_coin_etc),
        }
    }

    /// Applies a signed delta to one asset balance.
    ///
    /// Countable assets reject fractional deltas — a half "whole coin"
    /// is a data corruption, not a rounding question.
    pub fn apply(&mut self, kind: AssetKind, delta: Decimal) -> CoreResult<()> {
        if kind.is_countable() {
            if delta.fract() != Decimal::ZERO {
                return Err(CoreError::validation(format!(
                    "asset '{}' is countable; delta {} is not a whole number",
                    kind.as_str(),
                    delta
                )));
            }
            let whole: i64 = delta.to_i64().ok_or_else(|| {
                CoreError::validation(format!(
                    "asset '{}' delta {} out of range",
                    kind.as_str(),
                    delta
                ))
            })?;
            match kind {
                AssetKind::EmamiCoin86 => self.emami_coin_86 += whole,
                AssetKind::HalfCoin86 => self.half_coin_86 += whole,
                AssetKind::QuarterCoin86 => self.quarter_coin_86 += whole,
                AssetKind::EmamiCoinEtc => self.emami_coin_etc += whole,
                AssetKind::HalfCoinEtc => self.half_coin_etc += whole,
                AssetKind::QuarterCoinEtc => self.quarter_coin_etc += whole,
                _ => unreachable!("countable match covers all countable kinds"),
            }
        } else {
            match kind {
                AssetKind::NewGold => self.new_gold += delta,
                AssetKind::UsedGold => self.used_gold += delta,
                AssetKind::PersianCoin => self.persian_coin += delta,
                AssetKind::MoltenGold => self.molten_gold += delta,
                AssetKind::Saffron => self.saffron += delta,
                AssetKind::Dollar => self.dollar += delta,
                AssetKind::Euro => self.euro += delta,
                AssetKind::Pound => self.pound += delta,
                _ => unreachable!("non-countable match covers all weight kinds"),
            }
        }
        Ok(())
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// A transaction: a collection of individual buy/sell line items with a
/// two-tier approval lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// User who created the record; ownership scope for non-admins.
    pub recorder_id: String,
    pub contact_id: String,
    pub note: Option<String>,
    pub status: ApprovalStatus,
    /// Always >= 0; subtracted from the signed item sum.
    pub discount: i64,
    /// Derived: sum of signed item totals minus discount. Positive means
    /// net money owed to the shop. Recomputed from scratch on every item
    /// mutation, never incrementally patched.
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single line item within a transaction.
///
/// Financial percentages are captured at creation time; once the parent
/// transaction leaves Draft the line is frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub item_id: String,
    /// May differ per line from the item's financial-profile default.
    pub transaction_type: TransactionType,
    /// Free-text label, searchable by substring.
    pub title: String,
    /// Weight for uncountable assets, whole count for countable ones.
    pub weight_count: Decimal,
    /// Market quote per unit, in Rials.
    pub unit_price: i64,
    /// Derived by the pricing formula; always >= 0.
    pub total_price: i64,
    pub karat: Option<Decimal>,
    pub ojrat: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single money movement with its own two-tier approval lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub recorder_id: String,
    /// Always > 0; `direction` carries the sign.
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub direction: PaymentDirection,
    pub description: Option<String>,
    /// Who holds the physical receipt photo.
    pub photo_holder_id: Option<String>,
    pub status: ApprovalStatus,
    // Exactly one of the following four settlement targets is set.
    pub investor_id: Option<String>,
    pub transaction_id: Option<String>,
    pub account_ledger_id: Option<String>,
    pub saved_bank_account_id: Option<String>,
    /// Auxiliary context, not a settlement target.
    pub contact_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-contact running debt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedger {
    pub id: String,
    pub contact_id: String,
    /// Transaction that established the debt, if any.
    pub transaction_id: Option<String>,
    /// Amount the shop owes the contact, in Rials.
    pub debt: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub card_number: Option<String>,
    pub bank_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable point-in-time balance sheet of the shop.
///
/// Lifecycle: created-only, append-only. "Current balance" is the most
/// recently created row; reversal creates a new row with the delta
/// undone, never edits a prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub id: String,
    /// Cash balance in Rials.
    pub money_balance: i64,
    #[serde(flatten)]
    pub assets: AssetBalances,
    /// Set when a transaction approval/rejection produced this row.
    pub transaction_id: Option<String>,
    /// Set when a payment approval/rejection produced this row.
    pub payment_id: Option<String>,
    /// Required for manual admin adjustments.
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An inventory asset class sold or bought by the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// Which tracked asset this item moves. Unique per item.
    pub name: AssetKind,
    /// Display name (Persian).
    pub name_fa: String,
    pub category: String,
    pub description: Option<String>,
    /// Must agree with `name.measurement()`.
    pub measurement: MeasurementKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Default financial rules for an Item in one transaction direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFinancialProfile {
    pub id: String,
    pub item_id: String,
    pub transaction_type: TransactionType,
    pub karat_default: Option<Decimal>,
    pub ojrat_default: Option<Decimal>,
    pub profit_default: Option<Decimal>,
    pub tax_default: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person or organisation the shop deals with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    /// customer / supplier / investor / colleague
    pub contact_type: String,
    pub phone: Option<String>,
    pub note: Option<String>,
    /// User who created the record; ownership scope for non-admins.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 hash; never serialized to clients by the API layer.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saved bank account usable as a payment settlement target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedBankAccount {
    pub id: String,
    pub contact_id: Option<String>,
    pub bank_name: String,
    pub card_number: Option<String>,
    pub iban: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Investor profile: a User + Contact pair with withdrawable credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investor {
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    /// Withdrawable credit in Rials.
    pub credit: i64,
    pub status: InvestorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A derived record of one capital contribution.
///
/// Created automatically when an investor-linked INCOMING payment is
/// fully approved; deleted if that payment is later rejected. Never
/// edited directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: String,
    pub investor_id: String,
    pub payment_id: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// One before/after record of a tracked mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: String,
    pub operation: AuditOperation,
    pub table_name: String,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_kind_round_trip() {
        for kind in AssetKind::ALL {
            assert_eq!(kind.as_str().parse::<AssetKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_asset_kind_measurement() {
        assert!(!AssetKind::NewGold.is_countable());
        assert!(AssetKind::EmamiCoin86.is_countable());
        assert_eq!(AssetKind::Dollar.measurement(), MeasurementKind::Uncountable);
        assert_eq!(
            AssetKind::HalfCoinEtc.measurement(),
            MeasurementKind::Countable
        );
    }

    #[test]
    fn test_balances_apply_weight() {
        let mut balances = AssetBalances::zero();
        balances
            .apply(AssetKind::NewGold, Decimal::new(125, 1)) // 12.5
            .unwrap();
        balances
            .apply(AssetKind::NewGold, Decimal::new(-25, 1)) // -2.5
            .unwrap();
        assert_eq!(balances.new_gold, Decimal::from(10));
    }

    #[test]
    fn test_balances_apply_countable() {
        let mut balances = AssetBalances::zero();
        balances.apply(AssetKind::EmamiCoin86, Decimal::from(3)).unwrap();
        balances.apply(AssetKind::EmamiCoin86, Decimal::from(-1)).unwrap();
        assert_eq!(balances.emami_coin_86, 2);
    }

    #[test]
    fn test_balances_reject_fractional_count() {
        let mut balances = AssetBalances::zero();
        let err = balances
            .apply(AssetKind::HalfCoin86, Decimal::new(15, 1)) // 1.5
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::ValidationConflict(_)
        ));
    }

    #[test]
    fn test_approval_status_round_trip() {
        for status in [
            ApprovalStatus::Draft,
            ApprovalStatus::ApprovedByUser,
            ApprovalStatus::ApprovedByAdmin,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>().unwrap(), status);
        }
    }
}
