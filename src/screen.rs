//! Screens: one per route, each owning a fetcher and a list query.
//!
//! A screen composes the pieces: it fetches through its `Fetcher`, projects
//! with its `ListQuery`, renders through `table`, and handles row actions the
//! table hands back.

use crate::confirm::Confirm;
use crate::error::{ApiError, ApiResult};
use crate::fetcher::{Fetcher, Labels, Resource, Services};
use crate::filter::{distinct_categories, project, DateRange, Facet, ListQuery};
use crate::models::{format_price, NewProduct, NewUser, Product, Role, Ticket, TicketStatus, User, UserId, UserPatch};
use crate::profile::OperatorProfile;
use crate::table::{self, Dispatch, RowAction, TableRow};
use crate::view::Phase;
use chrono::NaiveDate;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Managers,
    Ambassadors,
    Products,
    Tickets,
    Profile,
    SignIn,
    SignUp,
    NotFound(String),
}

impl Route {
    /// Map a path (`/managers`, `products`, ...) to a route.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim().trim_end_matches('/');
        let normalized = trimmed.trim_start_matches('/').to_ascii_lowercase();
        match normalized.as_str() {
            "" | "home" => Self::Home,
            "managers" | "sgmanagers" => Self::Managers,
            "ambassadors" => Self::Ambassadors,
            "products" => Self::Products,
            "tickets" => Self::Tickets,
            "profile" => Self::Profile,
            "signin" => Self::SignIn,
            "signup" => Self::SignUp,
            _ => Self::NotFound(path.trim().to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Home => "/",
            Self::Managers => "/managers",
            Self::Ambassadors => "/ambassadors",
            Self::Products => "/products",
            Self::Tickets => "/tickets",
            Self::Profile => "/profile",
            Self::SignIn => "/signin",
            Self::SignUp => "/signup",
            Self::NotFound(p) => p,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Home => "Dashboard",
            Self::Managers => "Sales and Growth Managers",
            Self::Ambassadors => "Ambassadors",
            Self::Products => "Products",
            Self::Tickets => "Support Tickets",
            Self::Profile => "Profile",
            Self::SignIn => "Sign In",
            Self::SignUp => "Sign Up",
            Self::NotFound(_) => "Not Found",
        }
    }
}

/// A list page: fetched collection, the operator's query, and a table.
pub struct ListScreen<R: Resource + TableRow> {
    title: String,
    fetcher: Fetcher<R>,
    query: ListQuery,
}

impl<R: Resource + TableRow> ListScreen<R> {
    pub fn new(title: &str, fetcher: Fetcher<R>) -> Self {
        Self {
            title: title.to_string(),
            fetcher,
            query: ListQuery::default(),
        }
    }

    pub fn refresh(&mut self) {
        self.fetcher.fetch();
    }

    /// Size of the collection, once one has loaded.
    pub fn loaded_count(&self) -> Option<usize> {
        match self.fetcher.view().phase() {
            Phase::Loaded(items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.query.search = term.to_string();
    }

    /// Set a facet filter; `all` or an empty value clears it.
    pub fn set_filter(&mut self, facet: Facet, value: &str) -> Result<(), String> {
        if !R::facets().contains(&facet) {
            let supported: Vec<&str> = R::facets().iter().map(|f| f.as_str()).collect();
            return Err(format!(
                "{} can't be filtered by {} (supported: {})",
                self.title,
                facet.as_str(),
                supported.join(", ")
            ));
        }
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            self.query.set_filter(facet, "");
        } else {
            self.query.set_filter(facet, &R::canonical_value(facet, value));
        }
        Ok(())
    }

    pub fn set_dates(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.query.dates = DateRange::new(from, to);
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    pub fn rows(&self) -> Vec<&R> {
        project(self.fetcher.items(), &self.query)
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        table::find_row(self.fetcher.items(), id)
    }

    pub fn render(&self) -> String {
        let rows = self.rows();
        let mut out = format!("{}\n", self.title);
        if !self.query.is_empty() {
            out.push_str(&format!(
                "{} of {} shown ({})\n",
                rows.len(),
                self.fetcher.items().len(),
                describe_query(&self.query)
            ));
        }
        if let Some(reason) = self.fetcher.view().error() {
            out.push_str(&format!("Failed to load: {}\n", reason));
        }
        out.push('\n');
        out.push_str(&table::render(&rows, self.fetcher.is_loading()));
        out
    }

    /// Run a row action through the table's confirmation gate.
    fn act<F>(&mut self, id: &str, action: RowAction, confirm: &dyn Confirm, handler: F) -> Dispatch
    where
        F: FnOnce(&mut Fetcher<R>, &R) -> ApiResult<()>,
    {
        let Some(row) = table::find_actionable(self.fetcher.items(), id, action).cloned() else {
            return self.not_found(id);
        };
        let fetcher = &mut self.fetcher;
        let outcome = table::dispatch(&row, action, confirm, |row, _| handler(fetcher, row));
        if outcome == Dispatch::Declined {
            self.fetcher
                .services()
                .audit
                .borrow_mut()
                .confirm_declined(&action.label(R::NOUN), &row.display_id());
        }
        outcome
    }

    fn not_found(&self, id: &str) -> Dispatch {
        self.fetcher
            .services()
            .notifier
            .error(&format!("No {} with id {}", R::NOUN.to_lowercase(), id));
        Dispatch::Unavailable
    }
}

pub fn describe_query(query: &ListQuery) -> String {
    let mut parts = Vec::new();
    if !query.search.trim().is_empty() {
        parts.push(format!("search \"{}\"", query.search.trim()));
    }
    for (facet, value) in &query.filters {
        parts.push(format!("{} = {}", facet.as_str(), value));
    }
    if let (Some(from), Some(to)) = (query.dates.from, query.dates.to) {
        parts.push(format!("created {} to {}", from, to));
    }
    parts.join(", ")
}

pub type UserScreen = ListScreen<User>;
pub type ProductScreen = ListScreen<Product>;
pub type TicketScreen = ListScreen<Ticket>;

/// Users screen scoped to one role.
pub fn user_screen(services: Rc<Services>, role: Role) -> UserScreen {
    let (title, plural) = match role {
        Role::Manager => ("Sales and Growth Managers", "S/G Managers"),
        Role::Ambassador => ("Ambassadors", "Ambassadors"),
        _ => ("Users", "users"),
    };
    let labels = Labels::new(role.label(), plural);
    let scope = role.clone();
    let fetcher = Fetcher::scoped(services, labels, move |u: &User| u.role == scope);
    ListScreen::new(title, fetcher)
}

pub fn product_screen(services: Rc<Services>) -> ProductScreen {
    ListScreen::new("Products", Fetcher::new(services, Labels::new("Product", "products")))
}

pub fn ticket_screen(services: Rc<Services>) -> TicketScreen {
    ListScreen::new(
        "Support Tickets",
        Fetcher::new(services, Labels::new("Ticket", "tickets")),
    )
}

impl ListScreen<User> {
    /// Role this screen is scoped to; the singular label is the role's label.
    fn role(&self) -> Role {
        Role::parse(&self.fetcher.labels().singular)
    }

    pub fn add(&mut self, input: &NewUser) -> ApiResult<()> {
        let role = self.role();
        self.fetcher.create(&role, input)
    }

    pub fn update(&mut self, id: &str, patch: &UserPatch) -> ApiResult<()> {
        if self.find(id).is_none() {
            return Err(self.missing(id));
        }
        self.fetcher.update(&UserId::parse(id), patch)
    }

    pub fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> Dispatch {
        self.act(id, RowAction::Delete, confirm, |fetcher, user| {
            let Some(uid) = user.user_id() else {
                let message = format!("{} has no id", user.full_name());
                fetcher.services().notifier.error(&message);
                return Err(ApiError::Decode(message));
            };
            fetcher.delete(&uid);
            Ok(())
        })
    }

    pub fn toggle_suspension(&mut self, id: &str, confirm: &dyn Confirm) -> Dispatch {
        let Some(command) = self
            .find(id)
            .map(|u| u.account_state().suspension_command())
        else {
            return self.not_found(id);
        };
        self.act(id, RowAction::ToggleSuspension(command), confirm, |fetcher, user| {
            fetcher.set_suspension(user)
        })
    }

    /// Performance snapshot for one user.
    pub fn performance(&self, id: &str) -> Option<String> {
        self.find(id).map(performance_view)
    }

    fn missing(&self, id: &str) -> ApiError {
        let message = format!("No {} with id {}", self.fetcher.labels().singular, id);
        self.fetcher.services().notifier.error(&message);
        ApiError::Decode(message)
    }
}

pub fn performance_view(user: &User) -> String {
    let mut out = format!("Performance: {}\n", user.full_name());
    match &user.performance {
        Some(p) => {
            out.push_str(&format!("  Total sales:       {}\n", format_price(p.total_sales)));
            out.push_str(&format!("  Total commission:  {}\n", format_price(p.total_commission)));
            out.push_str(&format!("  Active clients:    {}\n", p.active_clients));
        }
        None => out.push_str("  No performance data\n"),
    }
    out
}

impl ListScreen<Product> {
    pub fn add(&mut self, input: &NewProduct) -> ApiResult<()> {
        self.fetcher.create(input)
    }

    pub fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> Dispatch {
        self.act(id, RowAction::Delete, confirm, |fetcher, product| {
            fetcher.delete(product.id);
            Ok(())
        })
    }

    pub fn categories(&self) -> Vec<String> {
        distinct_categories(self.fetcher.items())
    }
}

/// Per-status counts over the whole collection, independent of the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketCounts {
    pub all: usize,
    pub open: usize,
    pub closed: usize,
}

impl ListScreen<Ticket> {
    pub fn counts(&self) -> TicketCounts {
        let items = self.fetcher.items();
        TicketCounts {
            all: items.len(),
            open: items.iter().filter(|t| t.status == TicketStatus::Open).count(),
            closed: items.iter().filter(|t| t.status == TicketStatus::Closed).count(),
        }
    }

    /// Tab strip; the active tab is the status filter.
    pub fn tabs(&self) -> String {
        let counts = self.counts();
        let active = self.query.filters.get(&Facet::Status).map(String::as_str);
        let tab = |name: &str, key: Option<&str>, n: usize| {
            let label = format!("{} ({})", name, n);
            if active == key {
                format!("[{}]", label)
            } else {
                label
            }
        };
        [
            tab("All", None, counts.all),
            tab("Open", Some("open"), counts.open),
            tab("Closed", Some("closed"), counts.closed),
        ]
        .join("  ")
    }

    pub fn close(&mut self, id: &str, confirm: &dyn Confirm) -> Dispatch {
        self.act(id, RowAction::Close, confirm, |fetcher, ticket| fetcher.close(&ticket.id))
    }
}

/// Greeting plus collection counts.
pub fn home_view(profile: Option<&OperatorProfile>, counts: &[(&str, Option<usize>)]) -> String {
    let mut out = match profile {
        Some(p) => format!("Welcome back, {}\n\n", p.display_name()),
        None => "Welcome\n\n".to_string(),
    };
    for (label, count) in counts {
        let shown = count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("  {:<16}{}\n", label, shown));
    }
    out
}

pub fn profile_view(profile: Option<&OperatorProfile>) -> String {
    match profile {
        Some(p) => {
            let role = p.role.as_ref().map(|r| r.label().to_string()).unwrap_or_default();
            format!(
                "Name:   {}\nEmail:  {}\nRole:   {}\nID:     {}\n",
                p.display_name(),
                p.email,
                role,
                p.operator_id().unwrap_or_default()
            )
        }
        None => "No cached profile. Sign in through the web portal first.\n".to_string(),
    }
}
