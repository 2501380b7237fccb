//! # Row Mapping
//!
//! Decoders from SQLite rows into zargar-core domain types.
//!
//! Queries in this crate use sqlx's runtime API, so every SELECT goes
//! through one of these mappers. Enum columns are stored as their
//! `as_str()` text; decimal quantities are stored as exact decimal
//! strings; timestamps are RFC3339 TEXT which sqlx decodes directly
//! into `DateTime<Utc>`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{DbError, DbResult};
use zargar_core::{
    AccountLedger, AssetBalances, AuditLogEntry, Contact, InventorySnapshot, Investment, Investor,
    Item, ItemFinancialProfile, Payment, SavedBankAccount, Transaction, TransactionItem, User,
};

// =============================================================================
// Column Decoders
// =============================================================================

/// Decodes a TEXT enum column via the domain type's `FromStr`.
///
/// A mismatch means schema/code drift, surfaced as `Decode` rather than
/// silently defaulted.
pub(crate) fn parse_enum<T>(row: &SqliteRow, column: &str) -> DbResult<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: String| DbError::Decode(format!("column '{column}': {e}")))
}

/// Decodes a TEXT decimal column.
pub(crate) fn decimal(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw)
        .map_err(|e| DbError::Decode(format!("column '{column}': bad decimal '{raw}': {e}")))
}

/// Decodes a nullable TEXT decimal column.
pub(crate) fn decimal_opt(row: &SqliteRow, column: &str) -> DbResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        Decimal::from_str(&s)
            .map_err(|e| DbError::Decode(format!("column '{column}': bad decimal '{s}': {e}")))
    })
    .transpose()
}

fn json_opt(row: &SqliteRow, column: &str) -> DbResult<Option<serde_json::Value>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| DbError::Decode(format!("column '{column}': bad JSON: {e}")))
    })
    .transpose()
}

// =============================================================================
// Entity Mappers
// =============================================================================

pub(crate) fn map_user(row: &SqliteRow) -> DbResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_enum(row, "role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_contact(row: &SqliteRow) -> DbResult<Contact> {
    Ok(Contact {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        contact_type: row.try_get("contact_type")?,
        phone: row.try_get("phone")?,
        note: row.try_get("note")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_item(row: &SqliteRow) -> DbResult<Item> {
    Ok(Item {
        id: row.try_get("id")?,
        name: parse_enum(row, "name")?,
        name_fa: row.try_get("name_fa")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        measurement: parse_enum(row, "measurement")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_financial_profile(row: &SqliteRow) -> DbResult<ItemFinancialProfile> {
    Ok(ItemFinancialProfile {
        id: row.try_get("id")?,
        item_id: row.try_get("item_id")?,
        transaction_type: parse_enum(row, "transaction_type")?,
        karat_default: decimal_opt(row, "karat_default")?,
        ojrat_default: decimal_opt(row, "ojrat_default")?,
        profit_default: decimal_opt(row, "profit_default")?,
        tax_default: decimal_opt(row, "tax_default")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_transaction(row: &SqliteRow) -> DbResult<Transaction> {
    Ok(Transaction {
        id: row.try_get("id")?,
        recorder_id: row.try_get("recorder_id")?,
        contact_id: row.try_get("contact_id")?,
        note: row.try_get("note")?,
        status: parse_enum(row, "status")?,
        discount: row.try_get("discount")?,
        total_price: row.try_get("total_price")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_transaction_item(row: &SqliteRow) -> DbResult<TransactionItem> {
    Ok(TransactionItem {
        id: row.try_get("id")?,
        transaction_id: row.try_get("transaction_id")?,
        item_id: row.try_get("item_id")?,
        transaction_type: parse_enum(row, "transaction_type")?,
        title: row.try_get("title")?,
        weight_count: decimal(row, "weight_count")?,
        unit_price: row.try_get("unit_price")?,
        total_price: row.try_get("total_price")?,
        karat: decimal_opt(row, "karat")?,
        ojrat: decimal_opt(row, "ojrat")?,
        profit: decimal_opt(row, "profit")?,
        tax: decimal_opt(row, "tax")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_payment(row: &SqliteRow) -> DbResult<Payment> {
    Ok(Payment {
        id: row.try_get("id")?,
        recorder_id: row.try_get("recorder_id")?,
        amount: row.try_get("amount")?,
        payment_method: parse_enum(row, "payment_method")?,
        direction: parse_enum(row, "direction")?,
        description: row.try_get("description")?,
        photo_holder_id: row.try_get("photo_holder_id")?,
        status: parse_enum(row, "status")?,
        investor_id: row.try_get("investor_id")?,
        transaction_id: row.try_get("transaction_id")?,
        account_ledger_id: row.try_get("account_ledger_id")?,
        saved_bank_account_id: row.try_get("saved_bank_account_id")?,
        contact_id: row.try_get("contact_id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_account_ledger(row: &SqliteRow) -> DbResult<AccountLedger> {
    Ok(AccountLedger {
        id: row.try_get("id")?,
        contact_id: row.try_get("contact_id")?,
        transaction_id: row.try_get("transaction_id")?,
        debt: row.try_get("debt")?,
        deadline: row.try_get::<Option<DateTime<Utc>>, _>("deadline")?,
        description: row.try_get("description")?,
        card_number: row.try_get("card_number")?,
        bank_name: row.try_get("bank_name")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_snapshot(row: &SqliteRow) -> DbResult<InventorySnapshot> {
    let mut assets = AssetBalances::zero();
    assets.new_gold = decimal(row, "new_gold")?;
    assets.used_gold = decimal(row, "used_gold")?;
    assets.persian_coin = decimal(row, "persian_coin")?;
    assets.molten_gold = decimal(row, "molten_gold")?;
    assets.saffron = decimal(row, "saffron")?;
    assets.dollar = decimal(row, "dollar")?;
    assets.euro = decimal(row, "euro")?;
    assets.pound = decimal(row, "pound")?;
    assets.emami_coin_86 = row.try_get("emami_coin_86")?;
    assets.half_coin_86 = row.try_get("half_coin_86")?;
    assets.quarter_coin_86 = row.try_get("quarter_coin_86")?;
    assets.emami_coin_etc = row.try_get("emami_coin_etc")?;
    assets.half_coin_etc = row.try_get("half_coin_etc")?;
    assets.quarter_coin_etc = row.try_get("quarter_coin_etc")?;

    Ok(InventorySnapshot {
        id: row.try_get("id")?,
        money_balance: row.try_get("money_balance")?,
        assets,
        transaction_id: row.try_get("transaction_id")?,
        payment_id: row.try_get("payment_id")?,
        description: row.try_get("description")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

pub(crate) fn map_saved_bank_account(row: &SqliteRow) -> DbResult<SavedBankAccount> {
    Ok(SavedBankAccount {
        id: row.try_get("id")?,
        contact_id: row.try_get("contact_id")?,
        bank_name: row.try_get("bank_name")?,
        card_number: row.try_get("card_number")?,
        iban: row.try_get("iban")?,
        description: row.try_get("description")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_investor(row: &SqliteRow) -> DbResult<Investor> {
    Ok(Investor {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        contact_id: row.try_get("contact_id")?,
        credit: row.try_get("credit")?,
        status: parse_enum(row, "status")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_investment(row: &SqliteRow) -> DbResult<Investment> {
    Ok(Investment {
        id: row.try_get("id")?,
        investor_id: row.try_get("investor_id")?,
        payment_id: row.try_get("payment_id")?,
        amount: row.try_get("amount")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

pub(crate) fn map_audit_entry(row: &SqliteRow) -> DbResult<AuditLogEntry> {
    Ok(AuditLogEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        operation: parse_enum(row, "operation")?,
        table_name: row.try_get("table_name")?,
        before_state: json_opt(row, "before_state")?,
        after_state: json_opt(row, "after_state")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

/// Binds an optional decimal as its exact string form.
pub(crate) fn decimal_text(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}
