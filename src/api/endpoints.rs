//! Every REST path the console talks to, in one place.
//!
//! Paths are overridable per key from the `[endpoints]` config table so that
//! client/server drift (e.g. `/api/products/add` vs `/api/products/create`) is
//! fixed in configuration rather than in code.

use std::collections::HashMap;

/// Version tag of the default endpoint table.
pub const DEFAULT_VERSION: &str = "v1";

/// Collection endpoints probed at startup, by config key.
pub const COLLECTION_KEYS: &[&str] = &["users", "products", "tickets"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub version: String,
    pub login: String,
    pub profile: String,
    pub users: String,
    pub register: String,
    /// Prefix; the user id is appended.
    pub user: String,
    pub suspend_user: String,
    pub activate_user: String,
    pub products: String,
    pub create_product: String,
    pub product: String,
    pub tickets: String,
    pub close_ticket: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            login: "/api/auth/login".to_string(),
            profile: "/api/users/profile/".to_string(),
            users: "/api/users".to_string(),
            register: "/api/auth/register".to_string(),
            user: "/api/users/".to_string(),
            suspend_user: "/api/users/suspend/".to_string(),
            activate_user: "/api/users/activate/".to_string(),
            products: "/api/products".to_string(),
            create_product: "/api/products/create".to_string(),
            product: "/api/products/".to_string(),
            tickets: "/api/tickets".to_string(),
            close_ticket: "/api/tickets/close/".to_string(),
        }
    }
}

impl Endpoints {
    /// Build the table from defaults plus config overrides.
    /// Unknown keys are rejected so a typo doesn't silently keep the default.
    pub fn from_overrides(
        version: Option<&str>,
        overrides: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let mut endpoints = Self::default();
        if let Some(v) = version {
            endpoints.version = v.to_string();
        }
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            let slot = endpoints
                .slot_mut(key)
                .ok_or_else(|| format!("unknown endpoint '{}'", key))?;
            *slot = overrides[key].clone();
        }
        Ok(endpoints)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut String> {
        Some(match key {
            "login" => &mut self.login,
            "profile" => &mut self.profile,
            "users" => &mut self.users,
            "register" => &mut self.register,
            "user" => &mut self.user,
            "suspend_user" => &mut self.suspend_user,
            "activate_user" => &mut self.activate_user,
            "products" => &mut self.products,
            "create_product" => &mut self.create_product,
            "product" => &mut self.product,
            "tickets" => &mut self.tickets,
            "close_ticket" => &mut self.close_ticket,
            _ => return None,
        })
    }

    /// Look up a path by its config key.
    pub fn get(&self, key: &str) -> Option<&str> {
        let path = match key {
            "login" => &self.login,
            "profile" => &self.profile,
            "users" => &self.users,
            "register" => &self.register,
            "user" => &self.user,
            "suspend_user" => &self.suspend_user,
            "activate_user" => &self.activate_user,
            "products" => &self.products,
            "create_product" => &self.create_product,
            "product" => &self.product,
            "tickets" => &self.tickets,
            "close_ticket" => &self.close_ticket,
            _ => return None,
        };
        Some(path)
    }

    /// (key, path) pairs in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("login", self.login.as_str()),
            ("profile", self.profile.as_str()),
            ("users", self.users.as_str()),
            ("register", self.register.as_str()),
            ("user", self.user.as_str()),
            ("suspend_user", self.suspend_user.as_str()),
            ("activate_user", self.activate_user.as_str()),
            ("products", self.products.as_str()),
            ("create_product", self.create_product.as_str()),
            ("product", self.product.as_str()),
            ("tickets", self.tickets.as_str()),
            ("close_ticket", self.close_ticket.as_str()),
        ]
    }

    /// Keys whose path gets an id appended.
    pub fn is_prefix(key: &str) -> bool {
        matches!(
            key,
            "profile" | "user" | "suspend_user" | "activate_user" | "product" | "close_ticket"
        )
    }

    pub fn user_path(&self, id: &str) -> String {
        format!("{}{}", self.user, id)
    }

    pub fn suspend_path(&self, id: &str) -> String {
        format!("{}{}", self.suspend_user, id)
    }

    pub fn activate_path(&self, id: &str) -> String {
        format!("{}{}", self.activate_user, id)
    }

    pub fn product_path(&self, id: &str) -> String {
        format!("{}{}", self.product, id)
    }

    pub fn close_ticket_path(&self, id: &str) -> String {
        format!("{}{}", self.close_ticket, id)
    }
}
