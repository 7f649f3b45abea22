//! Saved-receipt history contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist finalized splits (receipt, items, contacts, assignments).
//! - Serve paginated history reads and deletion.
//!
//! # Invariants
//! - One save writes the receipt and all dependent rows in a single
//!   transaction; a failed save leaves no partial receipt behind.
//! - Assignments referencing items absent from the draft are skipped,
//!   never persisted as dangling links.
//! - History listing is newest-first with a clamped page size.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::DbError;
use crate::model::receipt::{ItemId, ReceiptItem};
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const HISTORY_DEFAULT_LIMIT: u32 = 10;
const HISTORY_LIMIT_MAX: u32 = 50;
const DEFAULT_RECEIPT_NAME: &str = "Untitled Receipt";

/// Stable identifier for one saved receipt row.
pub type ReceiptId = Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for history persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ReceiptId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "receipt not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted receipt data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One contact's assignment as stored with a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactAssignment {
    pub name: String,
    pub phone_number: Option<String>,
    /// In-session IDs of the items this contact claimed.
    pub item_ids: Vec<ItemId>,
}

/// Write model for one finalized split about to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    /// Optional display name; blank or missing names are stored as
    /// `"Untitled Receipt"`.
    pub name: Option<String>,
    /// Grand total (`subtotal + tax + tip`) at save time.
    pub total: f64,
    pub tax: f64,
    pub tip: f64,
    /// Creation timestamp in epoch milliseconds; `None` means "now".
    pub created_at_ms: Option<i64>,
    pub items: Vec<ReceiptItem>,
    pub contacts: Vec<ContactAssignment>,
}

/// Read model for one saved receipt with its dependents.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRecord {
    pub id: ReceiptId,
    pub name: Option<String>,
    pub total: f64,
    pub tax: f64,
    pub tip: f64,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    pub items: Vec<ReceiptItem>,
    /// Contact assignments referencing stored item IDs.
    pub contacts: Vec<ContactAssignment>,
}

/// Query options for history listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Maximum rows to return. Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// One page of saved receipts.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub receipts: Vec<ReceiptRecord>,
    /// Total saved receipts regardless of pagination.
    pub total: u64,
    /// Whether rows remain past this page.
    pub has_more: bool,
}

/// Repository interface for saved-receipt history.
pub trait HistoryRepository {
    /// Persists one finalized split and returns its stable ID.
    fn save_receipt(&mut self, draft: &ReceiptDraft) -> RepoResult<ReceiptId>;
    /// Gets one saved receipt with items and assignments.
    fn get_receipt(&self, id: ReceiptId) -> RepoResult<Option<ReceiptRecord>>;
    /// Lists saved receipts newest-first with pagination.
    fn list_receipts(&self, query: &HistoryQuery) -> RepoResult<HistoryPage>;
    /// Deletes one saved receipt and all dependents.
    fn delete_receipt(&mut self, id: ReceiptId) -> RepoResult<()>;
}

/// SQLite-backed history repository.
pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl HistoryRepository for SqliteHistoryRepository<'_> {
    fn save_receipt(&mut self, draft: &ReceiptDraft) -> RepoResult<ReceiptId> {
        let receipt_id = Uuid::new_v4();
        let created_at = draft.created_at_ms.unwrap_or_else(now_ms);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let name = draft
            .name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_RECEIPT_NAME);
        tx.execute(
            "INSERT INTO receipts (uuid, name, total, tax, tip, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                receipt_id.to_string(),
                name,
                draft.total,
                draft.tax,
                draft.tip,
                created_at,
            ],
        )?;

        // Item rows get fresh IDs; the map carries session IDs over to
        // the assignment rows below.
        let mut stored_item_ids: HashMap<ItemId, Uuid> = HashMap::new();
        for (position, item) in draft.items.iter().enumerate() {
            let row_id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO receipt_items (uuid, receipt_uuid, name, price, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    row_id.to_string(),
                    receipt_id.to_string(),
                    item.name,
                    item.price,
                    position as i64,
                ],
            )?;
            stored_item_ids.insert(item.id, row_id);
        }

        for (position, contact) in draft.contacts.iter().enumerate() {
            let contact_row_id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO receipt_contacts (uuid, receipt_uuid, name, phone_number, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    contact_row_id.to_string(),
                    receipt_id.to_string(),
                    contact.name,
                    contact.phone_number.as_deref(),
                    position as i64,
                ],
            )?;

            for item_id in &contact.item_ids {
                // Claims on items missing from the draft are dropped.
                let Some(row_id) = stored_item_ids.get(item_id) else {
                    continue;
                };
                tx.execute(
                    "INSERT INTO contact_items (contact_uuid, item_uuid)
                     VALUES (?1, ?2);",
                    params![contact_row_id.to_string(), row_id.to_string()],
                )?;
            }
        }

        tx.commit()?;
        Ok(receipt_id)
    }

    fn get_receipt(&self, id: ReceiptId) -> RepoResult<Option<ReceiptRecord>> {
        let uuid = id.to_string();
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, total, tax, tip, created_at
             FROM receipts
             WHERE uuid = ?1;",
        )?;

        let mut rows = stmt.query([uuid.as_str()])?;
        if let Some(row) = rows.next()? {
            let record = load_receipt_record(
                self.conn,
                parse_uuid(&row.get::<_, String>("uuid")?)?,
                row.get("name")?,
                row.get("total")?,
                row.get("tax")?,
                row.get("tip")?,
                row.get("created_at")?,
            )?;
            return Ok(Some(record));
        }

        Ok(None)
    }

    fn list_receipts(&self, query: &HistoryQuery) -> RepoResult<HistoryPage> {
        let total: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM receipts;", [], |row| row.get(0))?;

        let limit = normalize_history_limit(query.limit);
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, total, tax, tip, created_at
             FROM receipts
             ORDER BY created_at DESC, uuid ASC
             LIMIT ?1 OFFSET ?2;",
        )?;

        let mut rows = stmt.query(params![i64::from(limit), i64::from(query.offset)])?;
        let mut receipts = Vec::new();
        while let Some(row) = rows.next()? {
            receipts.push(load_receipt_record(
                self.conn,
                parse_uuid(&row.get::<_, String>("uuid")?)?,
                row.get("name")?,
                row.get("total")?,
                row.get("tax")?,
                row.get("tip")?,
                row.get("created_at")?,
            )?);
        }

        let has_more = u64::from(query.offset) + (receipts.len() as u64) < total;
        Ok(HistoryPage {
            receipts,
            total,
            has_more,
        })
    }

    fn delete_receipt(&mut self, id: ReceiptId) -> RepoResult<()> {
        let uuid = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "DELETE FROM contact_items
             WHERE contact_uuid IN (
                SELECT uuid FROM receipt_contacts WHERE receipt_uuid = ?1
             );",
            [uuid.as_str()],
        )?;
        tx.execute(
            "DELETE FROM receipt_contacts WHERE receipt_uuid = ?1;",
            [uuid.as_str()],
        )?;
        tx.execute(
            "DELETE FROM receipt_items WHERE receipt_uuid = ?1;",
            [uuid.as_str()],
        )?;
        let removed = tx.execute("DELETE FROM receipts WHERE uuid = ?1;", [uuid.as_str()])?;

        if removed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(())
    }
}

/// Normalizes list limit according to the history contract.
pub fn normalize_history_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => HISTORY_DEFAULT_LIMIT,
        Some(value) if value > HISTORY_LIMIT_MAX => HISTORY_LIMIT_MAX,
        Some(value) => value,
        None => HISTORY_DEFAULT_LIMIT,
    }
}

fn load_receipt_record(
    conn: &Connection,
    id: ReceiptId,
    name: Option<String>,
    total: f64,
    tax: f64,
    tip: f64,
    created_at: i64,
) -> RepoResult<ReceiptRecord> {
    let items = load_items_for_receipt(conn, id)?;
    let contacts = load_contacts_for_receipt(conn, id)?;
    Ok(ReceiptRecord {
        id,
        name,
        total,
        tax,
        tip,
        created_at,
        items,
        contacts,
    })
}

fn load_items_for_receipt(conn: &Connection, receipt_id: ReceiptId) -> RepoResult<Vec<ReceiptItem>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, name, price
         FROM receipt_items
         WHERE receipt_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([receipt_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let id = parse_uuid(&row.get::<_, String>("uuid")?)?;
        items.push(ReceiptItem::with_id(
            id,
            row.get::<_, String>("name")?,
            row.get("price")?,
        ));
    }
    Ok(items)
}

fn load_contacts_for_receipt(
    conn: &Connection,
    receipt_id: ReceiptId,
) -> RepoResult<Vec<ContactAssignment>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, name, phone_number
         FROM receipt_contacts
         WHERE receipt_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([receipt_id.to_string()])?;
    let mut contacts = Vec::new();
    while let Some(row) = rows.next()? {
        let contact_uuid: String = row.get("uuid")?;
        let item_ids = load_assignments_for_contact(conn, &contact_uuid)?;
        contacts.push(ContactAssignment {
            name: row.get("name")?,
            phone_number: row.get("phone_number")?,
            item_ids,
        });
    }
    Ok(contacts)
}

fn load_assignments_for_contact(conn: &Connection, contact_uuid: &str) -> RepoResult<Vec<ItemId>> {
    let mut stmt = conn.prepare(
        "SELECT ci.item_uuid
         FROM contact_items ci
         INNER JOIN receipt_items ri ON ri.uuid = ci.item_uuid
         WHERE ci.contact_uuid = ?1
         ORDER BY ri.position ASC;",
    )?;
    let mut rows = stmt.query([contact_uuid])?;
    let mut item_ids = Vec::new();
    while let Some(row) = rows.next()? {
        item_ids.push(parse_uuid(&row.get::<_, String>(0)?)?);
    }
    Ok(item_ids)
}

fn parse_uuid(value: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in history row"))
    })
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
