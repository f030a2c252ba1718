//! Customer tasks and the data handed from a customer to its worker.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Customer identifier, unique per simulation run.
pub type CustomerId = usize;

/// Worker identifier in `0..worker_count`.
pub type WorkerId = usize;

/// The errand a customer came to the post office for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Buy stamps (60 simulated seconds).
    BuyStamps,
    /// Mail a letter (90 simulated seconds).
    MailLetter,
    /// Mail a package (120 simulated seconds); needs the scale.
    MailPackage,
}

impl Task {
    /// Every task variant, in declaration order.
    pub const ALL: [Self; 3] = [Self::BuyStamps, Self::MailLetter, Self::MailPackage];

    /// Service time in simulated seconds.
    pub const fn service_secs(self) -> u64 {
        match self {
            Self::BuyStamps => 60,
            Self::MailLetter => 90,
            Self::MailPackage => 120,
        }
    }

    /// Real time the worker spends on this task when one simulated minute
    /// lasts `millis_per_minute` milliseconds.
    ///
    /// The scaling is exact: at 1000 ms per minute a letter takes 1500 ms,
    /// not the whole-minute 1000 ms a truncating conversion would give.
    /// Saturates instead of overflowing for huge minute lengths.
    pub const fn duration(self, millis_per_minute: u64) -> Duration {
        Duration::from_millis(self.service_secs().saturating_mul(millis_per_minute) / 60)
    }

    /// Whether the worker must hold the scale while serving this task.
    pub const fn requires_scale(self) -> bool {
        matches!(self, Self::MailPackage)
    }

    /// Phrase used when a customer asks for this task ("to buy stamps").
    pub const fn request_phrase(self) -> &'static str {
        match self {
            Self::BuyStamps => "buy stamps",
            Self::MailLetter => "mail a letter",
            Self::MailPackage => "mail a package",
        }
    }

    /// Phrase used once the task is done ("finished buying stamps").
    pub const fn progressive_phrase(self) -> &'static str {
        match self {
            Self::BuyStamps => "buying stamps",
            Self::MailLetter => "mailing a letter",
            Self::MailPackage => "mailing a package",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.request_phrase())
    }
}

/// A customer: an id and the task it was assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer id.
    pub id: CustomerId,
    /// Task fixed for the customer's lifetime.
    pub task: Task,
}

impl Customer {
    /// Create a customer.
    pub const fn new(id: CustomerId, task: Task) -> Self {
        Self { id, task }
    }
}

/// What a customer publishes to the worker it claimed.
///
/// Moved by value through the worker's rendezvous channel, so it is only
/// ever visible to one side at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Customer being served.
    pub customer_id: CustomerId,
    /// Task to perform.
    pub task: Task,
}

impl From<Customer> for Assignment {
    fn from(customer: Customer) -> Self {
        Self {
            customer_id: customer.id,
            task: customer.task,
        }
    }
}
