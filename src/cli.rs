//! Interactive console: the REPL, slash commands and screen navigation.

use crate::confirm::Confirm;
use crate::fetcher::{Resource, Services};
use crate::filter::Facet;
use crate::forms::{self, Fields, ProductForm, UserForm};
use crate::models::{format_date, Role, User, UserPatch};
use crate::profile::OperatorProfile;
use crate::screen::{self, ListScreen, ProductScreen, Route, TicketScreen, UserScreen};
use crate::table::{self, Dispatch, TableRow};
use anyhow::Result;
use chrono::NaiveDate;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

pub struct Context {
    pub services: Rc<Services>,
    pub confirm: Box<dyn Confirm>,
    pub profile: Option<OperatorProfile>,
    pub profile_path: Option<PathBuf>,
    pub route: RefCell<Route>,
    pub managers: RefCell<UserScreen>,
    pub ambassadors: RefCell<UserScreen>,
    pub products: RefCell<ProductScreen>,
    pub tickets: RefCell<TicketScreen>,
}

impl Context {
    pub fn new(
        services: Rc<Services>,
        confirm: Box<dyn Confirm>,
        profile: Option<OperatorProfile>,
        profile_path: Option<PathBuf>,
    ) -> Self {
        Self {
            managers: RefCell::new(screen::user_screen(services.clone(), Role::Manager)),
            ambassadors: RefCell::new(screen::user_screen(services.clone(), Role::Ambassador)),
            products: RefCell::new(screen::product_screen(services.clone())),
            tickets: RefCell::new(screen::ticket_screen(services.clone())),
            services,
            confirm,
            profile,
            profile_path,
            route: RefCell::new(Route::Home),
        }
    }

    fn users(&self) -> Option<&RefCell<UserScreen>> {
        match *self.route.borrow() {
            Route::Managers => Some(&self.managers),
            Route::Ambassadors => Some(&self.ambassadors),
            _ => None,
        }
    }
}

/// Run commands non-interactively, stopping at `/exit`.
pub fn run_commands(ctx: &Context, commands: &[String]) -> Result<()> {
    for command in commands {
        let line = command.trim();
        let line = if line.starts_with('/') {
            line.to_string()
        } else {
            format!("/{}", line)
        };
        if handle_command(ctx, &line) {
            break;
        }
    }
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = dirs::home_dir().map(|h| h.join(".admindesk").join("history"));
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    println!("admindesk - type /help for commands, /exit to quit");

    loop {
        let prompt = format!("{}> ", ctx.route.borrow().path());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line.starts_with('/') {
                    if handle_command(&ctx, line) {
                        break;
                    }
                    continue;
                }

                // A bare path navigates
                open(&ctx, line);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(path) = &history {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = rl.save_history(path) {
            tracing::debug!(error = %e, "failed to save history");
        }
    }
    Ok(())
}

/// Navigate to `path`, loading the screen's data as it opens.
pub fn open(ctx: &Context, path: &str) {
    let route = Route::parse(path);
    tracing::debug!(route = route.path(), "open");
    *ctx.route.borrow_mut() = route;
    refresh(ctx);
    print!("{}", render_route(ctx));
}

fn refresh(ctx: &Context) {
    let route = ctx.route.borrow().clone();
    match route {
        Route::Home => {
            ctx.managers.borrow_mut().refresh();
            ctx.ambassadors.borrow_mut().refresh();
            ctx.products.borrow_mut().refresh();
            ctx.tickets.borrow_mut().refresh();
        }
        Route::Managers => ctx.managers.borrow_mut().refresh(),
        Route::Ambassadors => ctx.ambassadors.borrow_mut().refresh(),
        Route::Products => ctx.products.borrow_mut().refresh(),
        Route::Tickets => ctx.tickets.borrow_mut().refresh(),
        Route::Profile | Route::SignIn | Route::SignUp | Route::NotFound(_) => {}
    }
}

pub fn render_route(ctx: &Context) -> String {
    let route = ctx.route.borrow().clone();
    match route {
        Route::Home => {
            let open_tickets = {
                let tickets = ctx.tickets.borrow();
                tickets.loaded_count().map(|_| tickets.counts().open)
            };
            screen::home_view(
                ctx.profile.as_ref(),
                &[
                    ("S/G Managers", ctx.managers.borrow().loaded_count()),
                    ("Ambassadors", ctx.ambassadors.borrow().loaded_count()),
                    ("Products", ctx.products.borrow().loaded_count()),
                    ("Open tickets", open_tickets),
                ],
            )
        }
        Route::Managers => ctx.managers.borrow().render(),
        Route::Ambassadors => ctx.ambassadors.borrow().render(),
        Route::Products => ctx.products.borrow().render(),
        Route::Tickets => {
            let tickets = ctx.tickets.borrow();
            format!("{}\n{}", tickets.tabs(), tickets.render())
        }
        Route::Profile => screen::profile_view(ctx.profile.as_ref()),
        Route::SignIn | Route::SignUp => {
            let path = ctx
                .profile_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no profile path configured)".to_string());
            format!(
                "{}\nAccounts are managed by the web portal; this console reads the cached profile at {}\n",
                route.title(),
                path
            )
        }
        Route::NotFound(path) => format!("Page not found: {}\nTry /open / for the dashboard.\n", path),
    }
}

/// Handle a slash command. Returns true when the session should end.
pub fn handle_command(ctx: &Context, cmd: &str) -> bool {
    let parts = match shell_words::split(cmd) {
        Ok(parts) => parts,
        Err(e) => {
            println!("Could not parse command: {}", e);
            return false;
        }
    };
    let Some((name, args)) = parts.split_first() else {
        return false;
    };

    match name.as_str() {
        "/exit" | "/quit" => return true,
        "/help" => print_help(),
        "/open" | "/go" => open(ctx, args.first().map(String::as_str).unwrap_or("/")),
        "/refresh" => {
            refresh(ctx);
            print!("{}", render_route(ctx));
        }
        "/show" => print!("{}", render_route(ctx)),
        "/search" | "/filter" | "/dates" | "/clear" => {
            let route = ctx.route.borrow().clone();
            let result = match route {
                Route::Managers => query_command(&mut *ctx.managers.borrow_mut(), name, args),
                Route::Ambassadors => query_command(&mut *ctx.ambassadors.borrow_mut(), name, args),
                Route::Products => query_command(&mut *ctx.products.borrow_mut(), name, args),
                Route::Tickets => query_command(&mut *ctx.tickets.borrow_mut(), name, args),
                _ => Err("Open a list screen first (/open managers, products, tickets...)".to_string()),
            };
            match result {
                Ok(()) => print!("{}", render_route(ctx)),
                Err(e) => println!("{}", e),
            }
        }
        "/add" => add(ctx, args),
        "/update" => update(ctx, args),
        "/delete" => with_id(args, "/delete <id>", |id| delete(ctx, id)),
        "/suspend" | "/reactivate" => with_id(args, "/suspend <id>", |id| {
            match ctx.users() {
                Some(users) => {
                    let outcome = users.borrow_mut().toggle_suspension(id, ctx.confirm.as_ref());
                    report(ctx, outcome);
                }
                None => println!("Suspension applies to managers and ambassadors"),
            }
        }),
        "/perf" => with_id(args, "/perf <id>", |id| match ctx.users() {
            Some(users) => match users.borrow().performance(id) {
                Some(view) => print!("{}", view),
                None => println!("No user with id {}", id),
            },
            None => println!("Performance is shown for managers and ambassadors"),
        }),
        "/actions" => with_id(args, "/actions <id>", |id| actions(ctx, id)),
        "/close" => with_id(args, "/close <ticket-id>", |id| {
            if *ctx.route.borrow() != Route::Tickets {
                println!("Open /tickets first");
                return;
            }
            let outcome = ctx.tickets.borrow_mut().close(id, ctx.confirm.as_ref());
            report(ctx, outcome);
        }),
        "/categories" => {
            let categories = ctx.products.borrow().categories();
            if categories.is_empty() {
                println!("No categories (open /products to load them)");
            } else {
                println!("Categories: {}", categories.join(", "));
            }
        }
        "/endpoints" => {
            let endpoints = ctx.services.client.endpoints();
            println!("Endpoints ({}):", endpoints.version);
            for (key, path) in endpoints.entries() {
                println!("  {:<16}{}", key, path);
            }
        }
        "/whoami" | "/session" => {
            match &ctx.profile {
                Some(p) => println!("Operator: {} <{}>", p.display_name(), p.email),
                None => println!("Operator: (no cached profile)"),
            }
            let audit = ctx.services.audit.borrow();
            println!("Session: {}", audit.session_id());
            match &audit.path {
                Some(path) => println!("Audit log: {}", path.display()),
                None => println!("Audit log: disabled"),
            }
        }
        _ => println!("Unknown command: {}", name),
    }
    false
}

fn print_help() {
    println!("Navigation:");
    println!("  /open <path>        - open a screen: / managers ambassadors products tickets profile");
    println!("  /refresh            - reload the current screen");
    println!("  /show               - redraw the current screen");
    println!("Narrowing the list:");
    println!("  /search <text>      - free-text search (empty clears)");
    println!("  /filter <facet> <value|all>");
    println!("                        facets: status (all lists), category (products), priority (tickets)");
    println!("  /dates <from> <to>  - creation date range, YYYY-MM-DD (no args clears)");
    println!("  /clear              - clear search, filters and dates");
    println!("Records:");
    println!("  /add key=value ...  - add a user (first last email [phone password])");
    println!("                        or a product (name price description image=... [category status])");
    println!("  /update <id> key=value ...  - edit a user; shows the change before applying");
    println!("  /delete <id>        - delete a user or product");
    println!("  /suspend <id>       - suspend or reactivate a user");
    println!("  /perf <id>          - show a user's performance");
    println!("  /actions <id>       - list the actions available on a row");
    println!("  /close <id>         - close an open ticket");
    println!("  /categories         - list product categories");
    println!("Session:");
    println!("  /endpoints          - show the REST endpoint table");
    println!("  /whoami             - show operator, session and audit log");
    println!("  /help               - show commands");
    println!("  /exit               - quit");
}

fn with_id(args: &[String], usage: &str, f: impl FnOnce(&str)) {
    match args.first() {
        Some(id) => f(id),
        None => println!("Usage: {}", usage),
    }
}

fn query_command<R: Resource + TableRow>(
    screen: &mut ListScreen<R>,
    name: &str,
    args: &[String],
) -> Result<(), String> {
    match name {
        "/search" => {
            screen.set_search(&args.join(" "));
            Ok(())
        }
        "/filter" => {
            let [facet, value @ ..] = args else {
                return Err("Usage: /filter <facet> <value|all>".to_string());
            };
            if value.is_empty() {
                return Err("Usage: /filter <facet> <value|all>".to_string());
            }
            let facet = Facet::parse(facet).ok_or_else(|| format!("Unknown facet: {}", facet))?;
            screen.set_filter(facet, &value.join(" "))
        }
        "/dates" => {
            match args {
                [] => screen.set_dates(None, None),
                [from, to] => screen.set_dates(Some(parse_day(from)?), Some(parse_day(to)?)),
                _ => return Err("Usage: /dates <from> <to>  (YYYY-MM-DD)".to_string()),
            }
            Ok(())
        }
        _ => {
            screen.clear_query();
            Ok(())
        }
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

fn print_form_errors(errors: &[crate::error::FormError]) {
    println!("Not submitted:");
    for e in errors {
        println!("  - {}", e);
    }
}

fn add(ctx: &Context, args: &[String]) {
    let fields = match Fields::parse(args) {
        Ok(f) if !f.is_empty() => f,
        Ok(_) => {
            println!("Usage: /add key=value ...");
            return;
        }
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    let route = ctx.route.borrow().clone();
    let result = match route {
        Route::Managers | Route::Ambassadors => match UserForm::from_fields(&fields).validate() {
            Ok(input) => ctx.users().map(|users| users.borrow_mut().add(&input)),
            Err(errors) => return print_form_errors(&errors),
        },
        Route::Products => match ProductForm::from_fields(&fields).validate() {
            Ok(input) => Some(ctx.products.borrow_mut().add(&input)),
            Err(errors) => return print_form_errors(&errors),
        },
        _ => {
            println!("Open managers, ambassadors or products to add records");
            return;
        }
    };
    // Failures were already notified; the form stays for a retry
    if let Some(Ok(())) = result {
        print!("{}", render_route(ctx));
    }
}

fn user_lines(user: &User) -> String {
    format!(
        "first_name: {}\nlast_name: {}\nemail: {}\nphone: {}\nstatus: {}\njoined: {}\n",
        user.first_name,
        user.last_name,
        user.email,
        user.phone.as_deref().unwrap_or("N/A"),
        user.status.as_str(),
        format_date(user.created_date.or(user.created_at)),
    )
}

fn update(ctx: &Context, args: &[String]) {
    let Some((id, rest)) = args.split_first() else {
        println!("Usage: /update <id> key=value ...");
        return;
    };
    let Some(users) = ctx.users() else {
        println!("Open managers or ambassadors to edit users");
        return;
    };
    let patch: UserPatch = match Fields::parse(rest).map_err(|e| vec![e]).and_then(|f| forms::user_patch(&f)) {
        Ok(p) => p,
        Err(errors) => return print_form_errors(&errors),
    };

    let before = match users.borrow().find(id) {
        Some(user) => user.clone(),
        None => {
            println!("No user with id {}", id);
            return;
        }
    };
    let after = patch.apply_to(&before);
    let (old, new) = (user_lines(&before), user_lines(&after));
    let preview = diffy::create_patch(&old, &new);
    print!("{}", preview);

    let prompt = format!("Apply these changes to {}?", before.full_name());
    if !ctx.confirm.confirm(&prompt) {
        ctx.services
            .audit
            .borrow_mut()
            .confirm_declined("update", id);
        println!("Not changed");
        return;
    }
    if users.borrow_mut().update(id, &patch).is_ok() {
        print!("{}", render_route(ctx));
    }
}

fn delete(ctx: &Context, id: &str) {
    let route = ctx.route.borrow().clone();
    let outcome = match route {
        Route::Managers | Route::Ambassadors => match ctx.users() {
            Some(users) => users.borrow_mut().delete(id, ctx.confirm.as_ref()),
            None => return,
        },
        Route::Products => ctx.products.borrow_mut().delete(id, ctx.confirm.as_ref()),
        _ => {
            println!("Open managers, ambassadors or products to delete records");
            return;
        }
    };
    report(ctx, outcome);
}

fn actions(ctx: &Context, id: &str) {
    let route = ctx.route.borrow().clone();
    let menu = match route {
        Route::Managers => ctx.managers.borrow().find(id).map(table::action_menu),
        Route::Ambassadors => ctx.ambassadors.borrow().find(id).map(table::action_menu),
        Route::Products => ctx.products.borrow().find(id).map(table::action_menu),
        Route::Tickets => ctx.tickets.borrow().find(id).map(table::action_menu),
        _ => None,
    };
    match menu {
        Some(menu) if !menu.is_empty() => println!("{}", menu),
        Some(_) => println!("No actions for {}", id),
        None => println!("No row with id {} on this screen", id),
    }
}

fn report(ctx: &Context, outcome: Dispatch) {
    match outcome {
        Dispatch::Done => print!("{}", render_route(ctx)),
        Dispatch::Declined => println!("Cancelled"),
        Dispatch::Unavailable | Dispatch::Failed(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockBackend;
    use crate::api::Method;
    use crate::confirm::testing::Scripted;
    use crate::fetcher::testing::harness;
    use crate::notify::Level;
    use serde_json::json;

    fn context(backend: MockBackend, answer: bool) -> (Context, crate::fetcher::testing::Harness) {
        let h = harness(backend);
        let ctx = Context::new(h.services.clone(), Box::new(Scripted::new(answer)), None, None);
        (ctx, h)
    }

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_open_fetches_screen() {
        let (ctx, h) = context(MockBackend::new(), true);
        run_commands(&ctx, &cmds(&["open products"])).unwrap();
        assert_eq!(*ctx.route.borrow(), Route::Products);
        assert_eq!(h.backend.count(Method::Get, "/api/products"), 1);
        assert!(render_route(&ctx).contains("No products found"));
    }

    #[test]
    fn test_add_product_validation_blocks_request() {
        let (ctx, h) = context(MockBackend::new(), true);
        run_commands(
            &ctx,
            &cmds(&["/open /products", "/add name=X price=abc"]),
        )
        .unwrap();
        assert_eq!(h.backend.count(Method::Post, "/api/products/create"), 0);
    }

    #[test]
    fn test_add_and_delete_product() {
        let (ctx, h) = context(MockBackend::new(), true);
        run_commands(
            &ctx,
            &cmds(&[
                "/open products",
                "/add name=\"Reseller Hosting\" price=5000 description=\"Managed reseller hosting\" image=https://cdn.example.com/r.png",
            ]),
        )
        .unwrap();
        assert_eq!(ctx.products.borrow().rows().len(), 1);
        let id = ctx.products.borrow().rows()[0].id.to_string();

        run_commands(&ctx, &[format!("/delete {}", id)]).unwrap();
        assert!(ctx.products.borrow().rows().is_empty());
        assert_eq!(
            h.notes.messages(Level::Success),
            vec!["Product added successfully", "Product deleted successfully"]
        );
    }

    #[test]
    fn test_filter_and_update_user() {
        let (ctx, h) = context(
            MockBackend::with_users(vec![
                json!({"_id": "m1", "firstName": "Ada", "lastName": "Obi", "email": "ada@x.io",
                       "role": "SGManager", "status": "Active", "suspended": false}),
                json!({"_id": "m2", "firstName": "Bola", "lastName": "Ade", "email": "bola@x.io",
                       "role": "SGManager", "status": "Active", "suspended": true}),
            ]),
            true,
        );
        run_commands(&ctx, &cmds(&["/open managers", "/filter status suspended"])).unwrap();
        assert_eq!(ctx.managers.borrow().rows().len(), 1);

        run_commands(&ctx, &cmds(&["/clear", "/update m1 phone=0800"])).unwrap();
        assert_eq!(h.backend.count(Method::Put, "/api/users/m1"), 1);
        assert_eq!(
            ctx.managers.borrow().find("m1").unwrap().phone.as_deref(),
            Some("0800")
        );
    }

    #[test]
    fn test_declined_update_sends_nothing() {
        let (ctx, h) = context(
            MockBackend::with_users(vec![json!({"_id": "m1", "firstName": "Ada",
                "lastName": "Obi", "email": "ada@x.io", "role": "SGManager"})]),
            false,
        );
        run_commands(&ctx, &cmds(&["/open managers", "/update m1 phone=0800"])).unwrap();
        assert_eq!(h.backend.count(Method::Put, "/api/users/m1"), 0);
    }

    #[test]
    fn test_exit_stops_command_run() {
        let (ctx, h) = context(MockBackend::new(), true);
        run_commands(&ctx, &cmds(&["/exit", "/open tickets"])).unwrap();
        assert_eq!(h.backend.count(Method::Get, "/api/tickets"), 0);
    }

    #[test]
    fn test_not_found_route() {
        let (ctx, _h) = context(MockBackend::new(), true);
        run_commands(&ctx, &cmds(&["/open /reports"])).unwrap();
        assert!(render_route(&ctx).starts_with("Page not found: /reports"));
    }
}
