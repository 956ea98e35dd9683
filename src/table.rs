//! Stateless table rendering and row-action dispatch.
//!
//! The renderer only formats what it is given. Row actions are handed back to
//! the owning screen through a callback; destructive ones are confirmed
//! first. Nothing here touches the network.

use crate::confirm::Confirm;
use crate::error::ApiResult;
use crate::models::{format_date, format_price, Record, SuspensionCommand};
use crate::models::{Product, Ticket, User};
use crate::status::{priority_badge, product_badge, ticket_status_badge, user_badge};

pub trait TableRow: Record {
    /// Entity noun used in action labels ("Delete User").
    const NOUN: &'static str;

    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    fn empty_message() -> &'static str;

    /// Id the operator types to address the row.
    fn display_id(&self) -> String;

    /// Name used in confirmation prompts.
    fn subject(&self) -> String;

    fn actions(&self) -> Vec<RowAction>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    ViewPerformance,
    ToggleSuspension(SuspensionCommand),
    Delete,
    Close,
}

impl RowAction {
    pub fn label(&self, noun: &str) -> String {
        match self {
            Self::ViewPerformance => "View Performance".to_string(),
            Self::ToggleSuspension(SuspensionCommand::Suspend) => "Suspend".to_string(),
            Self::ToggleSuspension(SuspensionCommand::Activate) => "Reactivate".to_string(),
            Self::Delete => format!("Delete {}", noun),
            Self::Close => "Close".to_string(),
        }
    }

    /// Confirmation prompt for destructive actions; None means no gate.
    pub fn prompt(&self, subject: &str) -> Option<String> {
        match self {
            Self::Delete => Some(format!("Are you sure you want to delete {}?", subject)),
            Self::ToggleSuspension(cmd) => Some(format!(
                "Are you sure you want to {} {}?",
                cmd.verb(),
                subject
            )),
            Self::ViewPerformance | Self::Close => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Done,
    /// The operator said no; the callback was not called.
    Declined,
    /// The action isn't offered for this row.
    Unavailable,
    /// The callback ran and reported failure (already surfaced to the operator).
    Failed(String),
}

/// Route an action on `row` to `handler`, confirming first when destructive.
pub fn dispatch<T, F>(row: &T, action: RowAction, confirm: &dyn Confirm, handler: F) -> Dispatch
where
    T: TableRow,
    F: FnOnce(&T, RowAction) -> ApiResult<()>,
{
    if !row.actions().contains(&action) {
        return Dispatch::Unavailable;
    }
    if let Some(prompt) = action.prompt(&row.subject()) {
        if !confirm.confirm(&prompt) {
            tracing::debug!(action = %action.label(T::NOUN), row = %row.display_id(), "action declined");
            return Dispatch::Declined;
        }
    }
    match handler(row, action) {
        Ok(()) => Dispatch::Done,
        Err(e) => {
            tracing::debug!(action = %action.label(T::NOUN), error = %e, "row action failed");
            Dispatch::Failed(e.to_string())
        }
    }
}

/// First row whose id matches.
pub fn find_row<'a, T: TableRow>(rows: &'a [T], id: &str) -> Option<&'a T> {
    rows.iter().find(|r| r.display_id() == id)
}

/// Row with `id` that offers `action`, else the first row with `id`.
/// Ids can repeat (ticket history), and only some copies take an action.
pub fn find_actionable<'a, T: TableRow>(rows: &'a [T], id: &str, action: RowAction) -> Option<&'a T> {
    let mut matching = rows.iter().filter(|r| r.display_id() == id).peekable();
    let first = matching.peek().copied();
    matching.find(|r| r.actions().contains(&action)).or(first)
}

/// Render rows as an aligned plain-text table.
pub fn render<T: TableRow>(rows: &[&T], loading: bool) -> String {
    if loading {
        return "Loading...\n".to_string();
    }

    let headers = T::headers();
    let body: Vec<Vec<String>> = rows.iter().map(|r| r.cells()).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (w, cell) in widths.iter_mut().zip(cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(|h| h.to_string()), &widths);
    push_line(&mut out, widths.iter().map(|w| "-".repeat(*w)), &widths);
    if body.is_empty() {
        out.push_str(T::empty_message());
        out.push('\n');
    }
    for cells in body {
        push_line(&mut out, cells.into_iter(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, w)| {
            let pad = w.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

/// Action menu for one row, e.g. `View Performance | Suspend | Delete User`.
pub fn action_menu<T: TableRow>(row: &T) -> String {
    row.actions()
        .iter()
        .map(|a| a.label(T::NOUN))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl TableRow for User {
    const NOUN: &'static str = "User";

    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Email", "Phone", "Date Joined", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        let avatar = match &self.photo {
            Some(p) if !p.is_empty() => "[img]".to_string(),
            _ => format!("[{}]", self.initials()),
        };
        vec![
            self.display_id(),
            format!("{} {} ({})", avatar, self.full_name(), self.role.label()),
            self.email.clone(),
            self.phone
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            format_date(self.created()),
            user_badge(self).to_string(),
        ]
    }

    fn empty_message() -> &'static str {
        "No users found. Add your first user to get started."
    }

    fn display_id(&self) -> String {
        self.row_key()
    }

    fn subject(&self) -> String {
        self.full_name()
    }

    fn actions(&self) -> Vec<RowAction> {
        vec![
            RowAction::ViewPerformance,
            RowAction::ToggleSuspension(self.account_state().suspension_command()),
            RowAction::Delete,
        ]
    }
}

impl TableRow for Product {
    const NOUN: &'static str = "Product";

    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Price", "Category", "Images", "Date Added", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            format_price(self.price),
            self.category.clone().unwrap_or_else(|| "-".to_string()),
            self.images.len().to_string(),
            format_date(self.created()),
            product_badge(self).to_string(),
        ]
    }

    fn empty_message() -> &'static str {
        "No products found. Add your first product to get started."
    }

    fn display_id(&self) -> String {
        self.id.to_string()
    }

    fn subject(&self) -> String {
        self.name.clone()
    }

    fn actions(&self) -> Vec<RowAction> {
        vec![RowAction::Delete]
    }
}

impl TableRow for Ticket {
    const NOUN: &'static str = "Ticket";

    fn headers() -> &'static [&'static str] {
        &["Ticket ID", "Subject", "Customer", "Priority", "Status", "Created"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.subject.clone(),
            self.customer_name.clone(),
            priority_badge(&self.priority).to_string(),
            ticket_status_badge(self).to_string(),
            format_date(self.created()),
        ]
    }

    fn empty_message() -> &'static str {
        "No tickets found."
    }

    fn display_id(&self) -> String {
        self.id.clone()
    }

    fn subject(&self) -> String {
        format!("ticket {}", self.id)
    }

    fn actions(&self) -> Vec<RowAction> {
        if self.is_open() {
            vec![RowAction::Close]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::testing::Scripted;
    use crate::error::ApiError;
    use serde_json::json;
    use std::cell::Cell;

    fn users() -> Vec<User> {
        serde_json::from_value(json!([
            {"_id": "m1", "firstName": "Ada", "lastName": "Obi", "email": "ada@x.io",
             "role": "SGManager", "status": "Active", "suspended": false,
             "createdDate": "2024-07-14T10:00:00Z"},
            {"_id": "m2", "firstName": "Bola", "lastName": "Ade", "email": "bola@x.io",
             "phone": "0800", "role": "SGManager", "status": "Active", "suspended": true}
        ]))
        .unwrap()
    }

    #[test]
    fn test_render_user_rows() {
        let users = users();
        let rows: Vec<&User> = users.iter().collect();
        let out = render(&rows, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[2].contains("[AO] Ada Obi (S/G Manager)"));
        assert!(lines[2].contains("N/A"));
        assert!(lines[2].contains("Jul 14, 2024"));
        assert!(lines[3].contains("! Suspended"));
    }

    #[test]
    fn test_render_loading_and_empty() {
        let none: Vec<&Product> = Vec::new();
        assert_eq!(render(&none, true), "Loading...\n");
        let out = render(&none, false);
        assert!(out.ends_with("No products found. Add your first product to get started.\n"));
    }

    #[test]
    fn test_action_menu_follows_flag() {
        let users = users();
        assert_eq!(action_menu(&users[0]), "View Performance | Suspend | Delete User");
        assert_eq!(action_menu(&users[1]), "View Performance | Reactivate | Delete User");
    }

    #[test]
    fn test_destructive_action_is_confirmed() {
        let users = users();
        let confirm = Scripted::new(true);
        let called = Cell::new(false);
        let outcome = dispatch(&users[0], RowAction::Delete, &confirm, |_, _| {
            called.set(true);
            Ok(())
        });
        assert_eq!(outcome, Dispatch::Done);
        assert!(called.get());
        assert_eq!(
            confirm.asked.borrow().as_slice(),
            ["Are you sure you want to delete Ada Obi?"]
        );
    }

    #[test]
    fn test_declined_action_skips_callback() {
        let users = users();
        let confirm = Scripted::new(false);
        let action = RowAction::ToggleSuspension(SuspensionCommand::Activate);
        let outcome = dispatch(&users[1], action, &confirm, |_, _| {
            panic!("callback must not run")
        });
        assert_eq!(outcome, Dispatch::Declined);
        assert_eq!(
            confirm.asked.borrow().as_slice(),
            ["Are you sure you want to reactivate Bola Ade?"]
        );
    }

    #[test]
    fn test_unavailable_and_failed_actions() {
        let users = users();
        let confirm = Scripted::new(true);
        // m1 isn't suspended, so Reactivate isn't on its menu
        let action = RowAction::ToggleSuspension(SuspensionCommand::Activate);
        assert_eq!(
            dispatch(&users[0], action, &confirm, |_, _| Ok(())),
            Dispatch::Unavailable
        );

        let outcome = dispatch(&users[0], RowAction::ViewPerformance, &confirm, |_, _| {
            Err(ApiError::Transport("down".to_string()))
        });
        assert!(matches!(outcome, Dispatch::Failed(_)));
        assert!(confirm.asked.borrow().is_empty());
    }

    #[test]
    fn test_closed_ticket_has_no_actions() {
        let tickets: Vec<Ticket> = serde_json::from_value(json!([
            {"id": "TKT-001", "subject": "Panel", "status": "open", "priority": "high"},
            {"id": "TKT-001", "subject": "Panel", "status": "closed", "priority": "high"}
        ]))
        .unwrap();
        assert_eq!(tickets[0].actions(), vec![RowAction::Close]);
        assert!(tickets[1].actions().is_empty());
        assert_eq!(find_row(&tickets, "TKT-001"), Some(&tickets[0]));
        assert!(tickets[0].cells()[3].starts_with("x High"));
    }
}
