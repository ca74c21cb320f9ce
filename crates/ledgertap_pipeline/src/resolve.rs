//! Sender-to-entity resolution.
//!
//! A sender label is matched against stored customers by exact name, against
//! both the formal company name and the informal contact name. What happens
//! on a miss is policy: opportunistic live monitoring auto-creates an
//! unverified placeholder so nothing is lost, while stricter flows hold the
//! event for explicit human confirmation instead.

use ledgertap_db::{Customer, LedgerDb};
use serde::{Deserialize, Serialize};

/// What to do with a sender that matches no stored customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// Create an unverified placeholder and apply the event
    #[default]
    AutoCreate,
    /// Park the event for human confirmation; no silent auto-create
    Confirm,
}

/// Outcome of resolving one sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Sender matched an existing customer
    Matched(Customer),
    /// No match; a placeholder was auto-created
    Created(Customer),
    /// No match and the policy requires confirmation
    NeedsReview,
}

impl Resolution {
    pub fn customer(&self) -> Option<&Customer> {
        match self {
            Resolution::Matched(c) | Resolution::Created(c) => Some(c),
            Resolution::NeedsReview => None,
        }
    }
}

/// Resolve a sender label under the given policy.
pub async fn resolve_sender(
    db: &LedgerDb,
    sender: &str,
    policy: ResolvePolicy,
) -> ledgertap_db::Result<Resolution> {
    if let Some(existing) = db.find_customer_by_name(sender).await? {
        return Ok(Resolution::Matched(existing));
    }

    match policy {
        ResolvePolicy::AutoCreate => {
            let created = db.find_or_create_customer(sender).await?;
            Ok(Resolution::Created(created))
        }
        ResolvePolicy::Confirm => Ok(Resolution::NeedsReview),
    }
}
