//! Messaging transport registry and batch dispatch.
//!
//! # Responsibility
//! - Define the adapter interface for sending one text to one person.
//! - Fan a batch of dues out across contacts with per-contact results.
//!
//! # Invariants
//! - A contact without a phone number or a usable amount fails locally,
//!   without reaching the transport.
//! - One failed send never aborts the remaining batch.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::contact::ContactId;
use crate::notify::summary::{due_message, ContactDue};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type MessengerResult<T> = Result<T, MessengerErrorEnvelope>;

/// Transport failure report.
///
/// Established codes: `messenger_not_selected`, `missing_phone_number`,
/// `missing_total` and `send_failed`. Adapters may add codes; unknown
/// codes are treated as not retryable unless the flag says otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessengerErrorEnvelope {
    /// Adapter (or `registry`) that produced the failure.
    pub messenger: String,
    /// Stable machine-readable failure code.
    pub code: String,
    /// Human-readable failure summary.
    pub message: String,
    /// Whether retrying the same send may succeed.
    pub retryable: bool,
}

impl MessengerErrorEnvelope {
    pub fn new(
        messenger: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            messenger: messenger.into(),
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for MessengerErrorEnvelope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "messaging via `{}` failed [{}]: {}",
            self.messenger, self.code, self.message
        )
    }
}

impl Error for MessengerErrorEnvelope {}

/// One text ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundText {
    pub phone_number: String,
    pub body: String,
}

/// Transport acknowledgement for one delivered text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Transport-side reference, when the transport issues one.
    pub reference: Option<String>,
}

/// Outcome of one contact's send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent {
        reference: Option<String>,
    },
    Failed {
        code: String,
        message: String,
        retryable: bool,
    },
}

impl DispatchStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Per-contact result of one batch dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub contact_id: ContactId,
    pub contact_name: String,
    pub status: DispatchStatus,
}

/// Synchronous messaging adapter interface.
///
/// Adapters own transport, credentials and upstream error mapping; core
/// hands them one composed text per contact.
pub trait MessengerSpi {
    /// Stable adapter identifier used in logs.
    fn messenger_id(&self) -> &str;

    /// Sends one text to one phone number.
    fn send(&self, text: &OutboundText) -> MessengerResult<SendReceipt>;
}

/// Messenger registration/selection errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessengerRegistryError {
    InvalidMessengerId(String),
    DuplicateMessengerId(String),
    MessengerNotFound(String),
}

impl Display for MessengerRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMessengerId(value) => write!(f, "messenger id is invalid: {value}"),
            Self::DuplicateMessengerId(value) => {
                write!(f, "messenger id already registered: {value}")
            }
            Self::MessengerNotFound(value) => write!(f, "messenger not found: {value}"),
        }
    }
}

impl Error for MessengerRegistryError {}

/// Runtime messenger SPI registry.
#[derive(Default)]
pub struct MessengerRegistry {
    messengers: BTreeMap<String, Arc<dyn MessengerSpi>>,
    active_messenger_id: Option<String>,
}

impl MessengerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one messaging adapter.
    pub fn register(
        &mut self,
        messenger: Arc<dyn MessengerSpi>,
    ) -> Result<(), MessengerRegistryError> {
        let messenger_id = messenger.messenger_id().trim().to_string();
        if !is_valid_messenger_id(&messenger_id) {
            return Err(MessengerRegistryError::InvalidMessengerId(messenger_id));
        }
        if self.messengers.contains_key(messenger_id.as_str()) {
            return Err(MessengerRegistryError::DuplicateMessengerId(messenger_id));
        }

        self.messengers.insert(messenger_id, messenger);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.messengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messengers.is_empty()
    }

    /// Returns sorted messenger ids.
    pub fn messenger_ids(&self) -> Vec<String> {
        self.messengers.keys().cloned().collect()
    }

    /// Selects one active messenger.
    pub fn select_active(&mut self, messenger_id: &str) -> Result<(), MessengerRegistryError> {
        let normalized = messenger_id.trim();
        if !self.messengers.contains_key(normalized) {
            return Err(MessengerRegistryError::MessengerNotFound(
                normalized.to_string(),
            ));
        }
        self.active_messenger_id = Some(normalized.to_string());
        Ok(())
    }

    /// Clears active messenger selection.
    pub fn clear_active(&mut self) {
        self.active_messenger_id = None;
    }

    pub fn active_messenger_id(&self) -> Option<&str> {
        self.active_messenger_id.as_deref()
    }

    /// Returns one messenger by id.
    pub fn get(&self, messenger_id: &str) -> Option<Arc<dyn MessengerSpi>> {
        self.messengers.get(messenger_id.trim()).cloned()
    }

    /// Returns active messenger handle.
    pub fn active_messenger(&self) -> Option<Arc<dyn MessengerSpi>> {
        let id = self.active_messenger_id()?;
        self.get(id)
    }

    /// Sends each contact their due via the active messenger.
    ///
    /// Contacts missing a phone number or a positive finite amount fail
    /// locally; transport failures are captured per contact. Either way
    /// the batch runs to the end.
    ///
    /// # Errors
    /// Fails as a whole only when no messenger is selected.
    pub fn dispatch_dues(
        &self,
        dues: &[ContactDue],
        payer: &str,
        bill_date: &str,
    ) -> MessengerResult<Vec<DispatchResult>> {
        let messenger = self.require_active()?;

        let results = dues
            .iter()
            .map(|due| DispatchResult {
                contact_id: due.contact_id,
                contact_name: due.name.clone(),
                status: send_one(messenger.as_ref(), due, payer, bill_date),
            })
            .collect::<Vec<_>>();

        let sent = results
            .iter()
            .filter(|result| result.status.is_sent())
            .count();
        info!(
            "event=dispatch_dues module=notify messenger={} sent={} failed={}",
            messenger.messenger_id(),
            sent,
            results.len() - sent
        );
        Ok(results)
    }

    fn require_active(&self) -> MessengerResult<Arc<dyn MessengerSpi>> {
        match self.active_messenger() {
            Some(messenger) => Ok(messenger),
            None => Err(MessengerErrorEnvelope::new(
                "registry",
                "messenger_not_selected",
                "No active messenger selected.",
                false,
            )),
        }
    }
}

fn send_one(
    messenger: &dyn MessengerSpi,
    due: &ContactDue,
    payer: &str,
    bill_date: &str,
) -> DispatchStatus {
    let Some(phone_number) = due
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return DispatchStatus::Failed {
            code: "missing_phone_number".to_string(),
            message: "Missing phone number".to_string(),
            retryable: false,
        };
    };
    if !due.amount.is_finite() || due.amount <= 0.0 {
        return DispatchStatus::Failed {
            code: "missing_total".to_string(),
            message: "Missing total".to_string(),
            retryable: false,
        };
    }

    let text = OutboundText {
        phone_number: phone_number.to_string(),
        body: due_message(due, payer, bill_date),
    };
    match messenger.send(&text) {
        Ok(receipt) => DispatchStatus::Sent {
            reference: receipt.reference,
        },
        Err(envelope) => {
            warn!(
                "event=dispatch_dues module=notify messenger={} status=error code={} retryable={}",
                envelope.messenger, envelope.code, envelope.retryable
            );
            DispatchStatus::Failed {
                code: envelope.code,
                message: envelope.message,
                retryable: envelope.retryable,
            }
        }
    }
}

fn is_valid_messenger_id(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
