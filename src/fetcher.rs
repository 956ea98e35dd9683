//! Collection fetchers and mutators, one per entity screen.
//!
//! Every mutation is a single REST call followed by a full re-fetch; there is
//! no local merge or optimistic insert. `fetch` never fails past this
//! boundary: a failed load leaves an empty collection and a notification.

use crate::api::{Endpoints, Method, RestClient};
use crate::audit::AuditLog;
use crate::error::{ApiError, ApiResult};
use crate::filter::Filterable;
use crate::models::{NewProduct, NewUser, Product, Role, Ticket, User, UserId, UserPatch};
use crate::notify::Notifier;
use crate::view::{Command, ViewModel};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handles every screen works through.
pub struct Services {
    pub client: RestClient,
    pub notifier: Rc<dyn Notifier>,
    pub audit: RefCell<AuditLog>,
    /// Id of the signed-in operator, stamped on created/updated records.
    pub operator_id: Option<String>,
}

/// Where an entity collection lives on the server.
pub trait Resource: Filterable + DeserializeOwned + Clone {
    /// Short kind name for logs and the audit trail.
    const KIND: &'static str;
    /// Key wrapping the array when the server returns an object.
    const WRAPPER: &'static str;

    fn list_path(endpoints: &Endpoints) -> &str;
}

impl Resource for User {
    const KIND: &'static str = "user";
    const WRAPPER: &'static str = "users";

    fn list_path(endpoints: &Endpoints) -> &str {
        &endpoints.users
    }
}

impl Resource for Product {
    const KIND: &'static str = "product";
    const WRAPPER: &'static str = "products";

    fn list_path(endpoints: &Endpoints) -> &str {
        &endpoints.products
    }
}

impl Resource for Ticket {
    const KIND: &'static str = "ticket";
    const WRAPPER: &'static str = "tickets";

    fn list_path(endpoints: &Endpoints) -> &str {
        &endpoints.tickets
    }
}

/// How the collection is named in notifications.
#[derive(Debug, Clone)]
pub struct Labels {
    pub singular: String,
    pub plural: String,
}

impl Labels {
    pub fn new(singular: &str, plural: &str) -> Self {
        Self {
            singular: singular.to_string(),
            plural: plural.to_string(),
        }
    }
}

struct Mutation {
    action: &'static str,
    target: Option<String>,
    method: Method,
    path: String,
    body: Option<Value>,
    success: String,
    failure: String,
}

pub struct Fetcher<R: Resource> {
    services: Rc<Services>,
    labels: Labels,
    keep: Option<Box<dyn Fn(&R) -> bool>>,
    view: ViewModel<R>,
}

impl<R: Resource> Fetcher<R> {
    pub fn new(services: Rc<Services>, labels: Labels) -> Self {
        Self {
            services,
            labels,
            keep: None,
            view: ViewModel::default(),
        }
    }

    /// Fetcher that keeps only the records `keep` accepts (client-side scope).
    pub fn scoped(services: Rc<Services>, labels: Labels, keep: impl Fn(&R) -> bool + 'static) -> Self {
        Self {
            keep: Some(Box::new(keep)),
            ..Self::new(services, labels)
        }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn services(&self) -> &Rc<Services> {
        &self.services
    }

    pub fn view(&self) -> &ViewModel<R> {
        &self.view
    }

    pub fn items(&self) -> &[R] {
        self.view.items()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    fn endpoints(&self) -> &Endpoints {
        self.services.client.endpoints()
    }

    /// Issue a fetch; returns its generation.
    pub fn begin_fetch(&mut self) -> u64 {
        self.view = std::mem::take(&mut self.view).apply(Command::Begin);
        self.view.generation()
    }

    /// Apply a fetch result. Results for superseded generations are dropped.
    pub fn resolve_fetch(&mut self, generation: u64, result: ApiResult<Vec<R>>) {
        let current = generation == self.view.generation();
        let outcome = match result {
            Ok(items) => {
                if current {
                    self.services.audit.borrow_mut().fetch(R::KIND, items.len(), true);
                }
                Ok(items)
            }
            Err(e) => {
                if current {
                    self.services.audit.borrow_mut().fetch(R::KIND, 0, false);
                    self.services
                        .notifier
                        .error(&format!("Failed to fetch {}", self.labels.plural));
                }
                Err(e.to_string())
            }
        };
        self.view = std::mem::take(&mut self.view).apply(Command::Resolve {
            generation,
            outcome,
        });
    }

    /// GET the collection without touching state.
    pub fn request(&self) -> ApiResult<Vec<R>> {
        let items: Vec<R> = self
            .services
            .client
            .get_collection(R::list_path(self.endpoints()), R::WRAPPER)?;
        Ok(match &self.keep {
            Some(keep) => items.into_iter().filter(|item| keep(item)).collect(),
            None => items,
        })
    }

    /// Load the collection into the view-model.
    pub fn fetch(&mut self) {
        let generation = self.begin_fetch();
        let result = self.request();
        self.resolve_fetch(generation, result);
    }

    fn run(&mut self, m: Mutation) -> ApiResult<()> {
        let result = self.services.client.send(m.method, &m.path, m.body);
        match result {
            Ok(_) => {
                self.services
                    .audit
                    .borrow_mut()
                    .mutation(R::KIND, m.action, m.target.as_deref());
                self.services.notifier.success(&m.success);
                self.fetch();
                Ok(())
            }
            Err(e) => {
                self.services.audit.borrow_mut().mutation_failed(
                    R::KIND,
                    m.action,
                    m.target.as_deref(),
                    &e.to_string(),
                );
                self.services
                    .notifier
                    .error(e.server_message().unwrap_or(&m.failure));
                Err(e)
            }
        }
    }

    /// Delete failures are reported, never raised: the caller has no follow-up.
    fn delete_at(&mut self, path: String, target: String) {
        let m = Mutation {
            action: "delete",
            target: Some(target),
            method: Method::Delete,
            path,
            body: None,
            success: format!("{} deleted successfully", self.labels.singular),
            failure: format!("Failed to delete {}", self.labels.singular),
        };
        if let Err(e) = self.run(m) {
            tracing::debug!(kind = R::KIND, error = %e, "delete failed");
        }
    }

    fn stamp(&self, payload: &mut Value, field: &str) {
        if let Some(operator) = &self.services.operator_id {
            payload[field] = json!(operator);
        }
    }
}

fn to_payload<T: serde::Serialize>(input: &T) -> ApiResult<Value> {
    serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))
}

impl Fetcher<User> {
    /// Register a user with `role`. Status and creation date are stamped here.
    pub fn create(&mut self, role: &Role, input: &NewUser) -> ApiResult<()> {
        let mut payload = to_payload(input)?;
        payload["role"] = json!(role.wire_name());
        payload["status"] = json!("Active");
        payload["createdDate"] = json!(Utc::now().to_rfc3339());
        self.stamp(&mut payload, "createdBy");

        let m = Mutation {
            action: "create",
            target: Some(input.email.clone()),
            method: Method::Post,
            path: self.endpoints().register.clone(),
            body: Some(payload),
            success: format!("{} added successfully", self.labels.singular),
            failure: format!("Failed to add {}", self.labels.singular),
        };
        self.run(m)
    }

    pub fn update(&mut self, id: &UserId, patch: &UserPatch) -> ApiResult<()> {
        let mut payload = to_payload(patch)?;
        self.stamp(&mut payload, "updatedBy");

        let m = Mutation {
            action: "update",
            target: Some(id.to_string()),
            method: Method::Put,
            path: self.endpoints().user_path(&id.to_string()),
            body: Some(payload),
            success: format!("{} updated successfully", self.labels.singular),
            failure: format!("Failed to update {}", self.labels.singular),
        };
        self.run(m)
    }

    pub fn delete(&mut self, id: &UserId) {
        let path = self.endpoints().user_path(&id.to_string());
        self.delete_at(path, id.to_string());
    }

    /// Toggle suspension, keyed off the `suspended` flag rather than the
    /// status label. Re-fetches whether or not the call succeeded.
    pub fn set_suspension(&mut self, user: &User) -> ApiResult<()> {
        let Some(id) = user.user_id() else {
            let message = format!("{} has no id", user.full_name());
            self.services.notifier.error(&message);
            return Err(ApiError::Decode(message));
        };
        let command = user.account_state().suspension_command();
        let id = id.to_string();
        let path = match command {
            crate::models::SuspensionCommand::Suspend => self.endpoints().suspend_path(&id),
            crate::models::SuspensionCommand::Activate => self.endpoints().activate_path(&id),
        };

        let m = Mutation {
            action: command.verb(),
            target: Some(id),
            method: Method::Patch,
            path,
            body: None,
            success: format!("{} {} successfully", self.labels.singular, command.past()),
            failure: format!("Failed to update {} status", self.labels.singular),
        };
        let result = self.run(m);
        if result.is_err() {
            self.fetch();
        }
        result
    }
}

impl Fetcher<Product> {
    pub fn create(&mut self, input: &NewProduct) -> ApiResult<()> {
        let mut payload = to_payload(input)?;
        payload["createdDate"] = json!(Utc::now().to_rfc3339());
        self.stamp(&mut payload, "createdBy");

        let m = Mutation {
            action: "create",
            target: Some(input.name.clone()),
            method: Method::Post,
            path: self.endpoints().create_product.clone(),
            body: Some(payload),
            success: format!("{} added successfully", self.labels.singular),
            failure: format!("Failed to add {}. Please try again.", self.labels.singular.to_lowercase()),
        };
        self.run(m)
    }

    pub fn delete(&mut self, id: u64) {
        let path = self.endpoints().product_path(&id.to_string());
        self.delete_at(path, id.to_string());
    }
}

impl Fetcher<Ticket> {
    pub fn close(&mut self, id: &str) -> ApiResult<()> {
        let m = Mutation {
            action: "close",
            target: Some(id.to_string()),
            method: Method::Patch,
            path: self.endpoints().close_ticket_path(id),
            body: None,
            success: format!("{} {} closed", self.labels.singular, id),
            failure: format!("Failed to close {} {}", self.labels.singular.to_lowercase(), id),
        };
        self.run(m)
    }
}
