//! In-memory backend for tests. Serves the default endpoint table.

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{ApiError, ApiResult};
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct State {
    users: Vec<Value>,
    products: Vec<Value>,
    tickets: Vec<Value>,
    next_id: u64,
    failures: Vec<(Method, String, u16, String)>,
    offline: bool,
    requests: Vec<ApiRequest>,
}

#[derive(Default)]
pub struct MockBackend {
    state: RefCell<State>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<Value>) -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().users = users;
        backend
    }

    pub fn with_products(products: Vec<Value>) -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().products = products;
        backend
    }

    pub fn with_tickets(tickets: Vec<Value>) -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().tickets = tickets;
        backend
    }

    /// Make the next request matching method + exact path fail with `status`.
    pub fn fail_next(&self, method: Method, path: &str, status: u16, message: &str) {
        self.state.borrow_mut().failures.push((
            method,
            path.to_string(),
            status,
            message.to_string(),
        ));
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn users(&self) -> Vec<Value> {
        self.state.borrow().users.clone()
    }

    pub fn products(&self) -> Vec<Value> {
        self.state.borrow().products.clone()
    }

    fn route(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.borrow_mut();
        let path = request.path.as_str();
        let body = request.body.clone().unwrap_or(Value::Null);

        match (request.method, path) {
            (Method::Get, "/api/users") => ok(json!({ "users": state.users })),
            (Method::Get, "/api/products") => ok(Value::Array(state.products.clone())),
            (Method::Get, "/api/tickets") => ok(Value::Array(state.tickets.clone())),
            (Method::Post, "/api/auth/register") => {
                state.next_id += 1;
                let mut user = as_object(body);
                user.insert("_id".into(), json!(format!("u{}", state.next_id)));
                user.entry("suspended").or_insert(json!(false));
                let user = Value::Object(user);
                state.users.push(user.clone());
                created(user)
            }
            (Method::Post, "/api/products/create") => {
                state.next_id += 1;
                let mut product = as_object(body);
                product.insert("id".into(), json!(state.next_id));
                let product = Value::Object(product);
                state.products.push(product.clone());
                created(product)
            }
            (Method::Patch, p) if p.starts_with("/api/users/suspend/") => {
                set_suspended(&mut state.users, &p["/api/users/suspend/".len()..], true)
            }
            (Method::Patch, p) if p.starts_with("/api/users/activate/") => {
                set_suspended(&mut state.users, &p["/api/users/activate/".len()..], false)
            }
            (Method::Patch, p) if p.starts_with("/api/tickets/close/") => {
                let id = &p["/api/tickets/close/".len()..];
                let mut hit = false;
                for t in state.tickets.iter_mut().filter(|t| t["id"] == json!(id)) {
                    t["status"] = json!("closed");
                    hit = true;
                }
                if hit {
                    ok(json!({ "message": "closed" }))
                } else {
                    not_found()
                }
            }
            (Method::Put, p) if p.starts_with("/api/users/") => {
                let id = &p["/api/users/".len()..];
                match state.users.iter_mut().find(|u| matches_id(u, id)) {
                    Some(user) => {
                        if let (Some(target), Value::Object(patch)) = (user.as_object_mut(), body) {
                            for (k, v) in patch {
                                target.insert(k, v);
                            }
                        }
                        ok(user.clone())
                    }
                    None => not_found(),
                }
            }
            (Method::Delete, p) if p.starts_with("/api/users/") => {
                remove_by_id(&mut state.users, &p["/api/users/".len()..])
            }
            (Method::Delete, p) if p.starts_with("/api/products/") => {
                remove_by_id(&mut state.products, &p["/api/products/".len()..])
            }
            _ => not_found(),
        }
    }
}

impl Transport for MockBackend {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        {
            let mut state = self.state.borrow_mut();
            state.requests.push(request.clone());
            if state.offline {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            if let Some(pos) = state
                .failures
                .iter()
                .position(|(m, p, _, _)| *m == request.method && p == &request.path)
            {
                let (_, _, status, message) = state.failures.remove(pos);
                return Ok(ApiResponse {
                    status,
                    body: json!({ "message": message }),
                });
            }
        }
        Ok(self.route(request))
    }
}

impl Transport for Rc<MockBackend> {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.as_ref().send(request)
    }
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse { status: 200, body }
}

fn created(body: Value) -> ApiResponse {
    ApiResponse { status: 201, body }
}

fn not_found() -> ApiResponse {
    ApiResponse {
        status: 404,
        body: json!({ "message": "Not found" }),
    }
}

fn as_object(body: Value) -> Map<String, Value> {
    match body {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn matches_id(entity: &Value, id: &str) -> bool {
    match (&entity["_id"], &entity["id"]) {
        (Value::String(s), _) if s == id => true,
        (_, Value::Number(n)) => n.to_string() == id,
        (_, Value::String(s)) => s == id,
        _ => false,
    }
}

fn set_suspended(users: &mut [Value], id: &str, suspended: bool) -> ApiResponse {
    match users.iter_mut().find(|u| matches_id(u, id)) {
        Some(user) => {
            user["suspended"] = json!(suspended);
            ok(user.clone())
        }
        None => not_found(),
    }
}

fn remove_by_id(items: &mut Vec<Value>, id: &str) -> ApiResponse {
    let before = items.len();
    items.retain(|item| !matches_id(item, id));
    if items.len() < before {
        ok(json!({ "message": "deleted" }))
    } else {
        not_found()
    }
}
