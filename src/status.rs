//! Status presentation: one label and tone per record, used by every table
//! and detail view so the display never diverges from the data.

use crate::models::{AccountState, Priority, Product, ProductStatus, Ticket, TicketStatus, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
    Info,
    Neutral,
}

impl Tone {
    /// Short marker shown next to the label in plain-text tables.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Success => "+",
            Self::Warning => "!",
            Self::Error => "x",
            Self::Info => "i",
            Self::Neutral => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub tone: Tone,
}

impl Badge {
    fn new(label: impl Into<String>, tone: Tone) -> Self {
        Self {
            label: label.into(),
            tone,
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tone.marker(), self.label)
    }
}

/// The suspension flag always renders as "Suspended", whatever the label says.
pub fn user_badge(user: &User) -> Badge {
    match user.account_state() {
        AccountState::Suspended => Badge::new("Suspended", Tone::Warning),
        AccountState::Active => Badge::new("Active", Tone::Success),
        AccountState::Inactive => Badge::new("Inactive", Tone::Error),
        AccountState::Unknown(label) => Badge::new(label, Tone::Neutral),
    }
}

pub fn product_badge(product: &Product) -> Badge {
    match &product.status {
        ProductStatus::Active => Badge::new("Active", Tone::Success),
        ProductStatus::Inactive => Badge::new("Inactive", Tone::Error),
        ProductStatus::Other(s) => Badge::new(s.clone(), Tone::Neutral),
    }
}

pub fn ticket_status_badge(ticket: &Ticket) -> Badge {
    match &ticket.status {
        TicketStatus::Open => Badge::new("Open", Tone::Info),
        TicketStatus::Closed => Badge::new("Closed", Tone::Success),
        TicketStatus::Other(s) => Badge::new(s.clone(), Tone::Neutral),
    }
}

pub fn priority_badge(priority: &Priority) -> Badge {
    let tone = match priority {
        Priority::High => Tone::Error,
        Priority::Medium => Tone::Warning,
        Priority::Low => Tone::Info,
        Priority::Other(_) => Tone::Neutral,
    };
    Badge::new(priority.label(), tone)
}
