//! In-process stand-in for the task-board backend.
//!
//! Serves the same routes and JSON shapes over a random loopback port,
//! with handles for seeding state and injecting failures. `delay_reads`
//! models a backend that reassigns tickets asynchronously after a
//! category delete, which is what the post-delete polling exists for.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use cardwall::client::{
    AddLabel, Credentials, NewCategory, NewLabel, NewTicket, Registration, UpdateCategory,
    UpdateLabel, UpdateTicket,
};
use cardwall::models::{Category, Label, Session, Ticket, TicketHistoryEntry, User};

pub const TEST_EMAIL: &str = "dev@example.com";
pub const TEST_PASSWORD: &str = "Hunter2!";
pub const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
struct BackendState {
    categories: Vec<Category>,
    tickets: Vec<Ticket>,
    labels: Vec<Label>,
    users: Vec<User>,
    credentials: Vec<(String, String)>,
    next_id: i64,
    // Ticket reassignments from a category delete that have not been
    // applied yet, plus how many GET /tickets reads still see the old
    // assignment.
    pending_moves: Vec<(i64, i64)>,
    lagging_reads: u32,
    fail_next: bool,
    hits: usize,
}

impl BackendState {
    fn seeded() -> Self {
        let now = Utc::now();
        Self {
            users: vec![User {
                id: 1,
                email: TEST_EMAIL.to_string(),
                created_at: now,
                updated_at: now,
            }],
            credentials: vec![(TEST_EMAIL.to_string(), TEST_PASSWORD.to_string())],
            next_id: 2,
            ..Self::default()
        }
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

type AppState = Arc<Mutex<BackendState>>;

pub struct MockBackend {
    addr: SocketAddr,
    state: AppState,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state: AppState = Arc::new(Mutex::new(BackendState::seeded()));
        let router = Router::new()
            .route("/authentication", post(login))
            .route("/users/registration", post(register))
            .route("/users/me", get(me))
            .route("/categories", get(list_categories).post(create_category))
            .route(
                "/categories/{id}",
                patch(update_category).delete(delete_category),
            )
            .route("/categories/{id}/swap-order/{other}", patch(swap_order))
            .route("/tickets", get(list_tickets).post(create_ticket))
            .route("/tickets/get/{id}", get(get_ticket))
            .route("/tickets/{id}", patch(update_ticket).delete(delete_ticket))
            .route("/tickets/{id}/labels", post(add_label))
            .route("/tickets/{id}/labels/{label_id}", delete(remove_label))
            .route("/labels", get(list_labels).post(create_label))
            .route("/labels/{id}", patch(update_label).delete(delete_label))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// Total requests served so far, successful or not.
    pub fn hits(&self) -> usize {
        self.lock().hits
    }

    /// Make the next write against the board collections fail with a 500.
    pub fn fail_next_mutation(&self) {
        self.lock().fail_next = true;
    }

    /// After the next category delete, serve `reads` further GET /tickets
    /// responses with the old assignment before applying it.
    pub fn delay_reassignment(&self, reads: u32) {
        self.lock().lagging_reads = reads;
    }

    pub fn seed_category(&self, title: &str, order: i64) -> Category {
        let mut st = self.lock();
        let id = st.take_id();
        let now = Utc::now();
        let category = Category {
            id,
            title: title.to_string(),
            order: Some(order),
            created_at: now,
            updated_at: now,
        };
        st.categories.push(category.clone());
        category
    }

    pub fn seed_ticket(&self, category_id: i64, title: &str) -> Ticket {
        self.seed_ticket_expiring(category_id, title, None)
    }

    pub fn seed_ticket_expiring(
        &self,
        category_id: i64,
        title: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Ticket {
        let mut st = self.lock();
        let id = st.take_id();
        let now = Utc::now();
        let ticket = Ticket {
            id,
            title: title.to_string(),
            description: format!("{} description", title),
            expires_at,
            category_id,
            labels: vec![],
            history: vec![TicketHistoryEntry {
                timestamp: now,
                category_id,
            }],
            created_at: now,
            updated_at: now,
        };
        st.tickets.push(ticket.clone());
        ticket
    }

    pub fn seed_label(&self, title: &str) -> Label {
        let mut st = self.lock();
        let id = st.take_id();
        let now = Utc::now();
        let label = Label {
            id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        st.labels.push(label.clone());
        label
    }

    pub fn attach_label(&self, ticket_id: i64, label_id: i64) {
        let mut st = self.lock();
        let label = st
            .labels
            .iter()
            .find(|l| l.id == label_id)
            .cloned()
            .unwrap();
        let ticket = st.tickets.iter_mut().find(|t| t.id == ticket_id).unwrap();
        ticket.labels.push(label);
    }

    /// Server-side view of a ticket, bypassing the client cache.
    pub fn server_ticket(&self, id: i64) -> Option<Ticket> {
        self.lock().tickets.iter().find(|t| t.id == id).cloned()
    }
}

fn lock_app(app: &AppState) -> MutexGuard<'_, BackendState> {
    app.lock().unwrap()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn check_auth(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", TEST_TOKEN);
    let ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

fn take_failure(st: &mut BackendState) -> Option<Response> {
    if st.fail_next {
        st.fail_next = false;
        return Some(error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        ));
    }
    None
}

fn apply_pending_moves(st: &mut BackendState) {
    let moves = std::mem::take(&mut st.pending_moves);
    let now = Utc::now();
    for (from, to) in moves {
        for ticket in st.tickets.iter_mut().filter(|t| t.category_id == from) {
            ticket.category_id = to;
            ticket.history.push(TicketHistoryEntry {
                timestamp: now,
                category_id: to,
            });
            ticket.updated_at = now;
        }
    }
}

// ── Auth routes ──────────────────────────────────────────────────────

async fn login(State(app): State<AppState>, Json(body): Json<Credentials>) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    let known = st
        .credentials
        .iter()
        .any(|(email, password)| *email == body.email && *password == body.password);
    if !known {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let user = st
        .users
        .iter()
        .find(|u| u.email == body.email)
        .cloned()
        .unwrap();
    Json(Session {
        user,
        access_token: TEST_TOKEN.to_string(),
    })
    .into_response()
}

async fn register(State(app): State<AppState>, Json(body): Json<Registration>) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if st.users.iter().any(|u| u.email == body.email) {
        return error(StatusCode::CONFLICT, "User with that email already exists");
    }
    let id = st.take_id();
    let now = Utc::now();
    let user = User {
        id,
        email: body.email.clone(),
        created_at: now,
        updated_at: now,
    };
    st.users.push(user.clone());
    st.credentials.push((body.email, body.password));
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn me(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    Json(st.users[0].clone()).into_response()
}

// ── Category routes ──────────────────────────────────────────────────

async fn list_categories(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    Json(st.categories.clone()).into_response()
}

async fn create_category(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewCategory>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let id = st.take_id();
    let order = st.categories.iter().filter_map(|c| c.order).max().unwrap_or(0) + 1;
    let now = Utc::now();
    let category = Category {
        id,
        title: body.title,
        order: Some(order),
        created_at: now,
        updated_at: now,
    };
    st.categories.push(category.clone());
    (StatusCode::CREATED, Json(category)).into_response()
}

async fn update_category(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateCategory>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let Some(category) = st.categories.iter_mut().find(|c| c.id == id) else {
        return error(StatusCode::NOT_FOUND, "Category not found");
    };
    category.title = body.title;
    category.updated_at = Utc::now();
    Json(category.clone()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCategoryParams {
    move_existing_tickets_to_category_id: Option<i64>,
}

async fn delete_category(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteCategoryParams>,
    headers: HeaderMap,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let before = st.categories.len();
    st.categories.retain(|c| c.id != id);
    if st.categories.len() == before {
        return error(StatusCode::NOT_FOUND, "Category not found");
    }
    if let Some(dest) = params.move_existing_tickets_to_category_id {
        st.pending_moves.push((id, dest));
        if st.lagging_reads == 0 {
            apply_pending_moves(&mut st);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn swap_order(
    State(app): State<AppState>,
    Path((id, other)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let pos_a = st.categories.iter().position(|c| c.id == id);
    let pos_b = st.categories.iter().position(|c| c.id == other);
    let (Some(a), Some(b)) = (pos_a, pos_b) else {
        return error(StatusCode::NOT_FOUND, "Category not found");
    };
    let tmp = st.categories[a].order;
    st.categories[a].order = st.categories[b].order;
    st.categories[b].order = tmp;
    StatusCode::NO_CONTENT.into_response()
}

// ── Ticket routes ────────────────────────────────────────────────────

async fn list_tickets(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if !st.pending_moves.is_empty() {
        if st.lagging_reads > 0 {
            st.lagging_reads -= 1;
        } else {
            apply_pending_moves(&mut st);
        }
    }
    Json(st.tickets.clone()).into_response()
}

async fn get_ticket(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    match st.tickets.iter().find(|t| t.id == id) {
        Some(ticket) => Json(ticket.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Ticket not found"),
    }
}

async fn create_ticket(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewTicket>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let id = st.take_id();
    let now = Utc::now();
    let ticket = Ticket {
        id,
        title: body.title,
        description: body.description,
        expires_at: body.expires_at,
        category_id: body.category_id,
        labels: vec![],
        history: vec![TicketHistoryEntry {
            timestamp: now,
            category_id: body.category_id,
        }],
        created_at: now,
        updated_at: now,
    };
    st.tickets.push(ticket.clone());
    (StatusCode::CREATED, Json(ticket)).into_response()
}

async fn update_ticket(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateTicket>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let now = Utc::now();
    let Some(ticket) = st.tickets.iter_mut().find(|t| t.id == id) else {
        return error(StatusCode::NOT_FOUND, "Ticket not found");
    };
    if let Some(target) = body.category_id {
        if target != ticket.category_id {
            if ticket.expires_at.is_some_and(|at| at < now) {
                return error(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed");
            }
            ticket.category_id = target;
            ticket.history.push(TicketHistoryEntry {
                timestamp: now,
                category_id: target,
            });
        }
    }
    if let Some(title) = body.title {
        ticket.title = title;
    }
    if let Some(description) = body.description {
        ticket.description = description;
    }
    if let Some(expires_at) = body.expires_at {
        ticket.expires_at = Some(expires_at);
    }
    ticket.updated_at = now;
    Json(ticket.clone()).into_response()
}

async fn delete_ticket(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let before = st.tickets.len();
    st.tickets.retain(|t| t.id != id);
    if st.tickets.len() == before {
        return error(StatusCode::NOT_FOUND, "Ticket not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn add_label(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<AddLabel>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let Some(label) = st.labels.iter().find(|l| l.id == body.label_id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Label not found");
    };
    let Some(ticket) = st.tickets.iter_mut().find(|t| t.id == id) else {
        return error(StatusCode::NOT_FOUND, "Ticket not found");
    };
    if !ticket.labels.iter().any(|l| l.id == label.id) {
        ticket.labels.push(label);
    }
    ticket.updated_at = Utc::now();
    Json(ticket.clone()).into_response()
}

async fn remove_label(
    State(app): State<AppState>,
    Path((id, label_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let Some(ticket) = st.tickets.iter_mut().find(|t| t.id == id) else {
        return error(StatusCode::NOT_FOUND, "Ticket not found");
    };
    ticket.labels.retain(|l| l.id != label_id);
    ticket.updated_at = Utc::now();
    Json(ticket.clone()).into_response()
}

// ── Label routes ─────────────────────────────────────────────────────

async fn list_labels(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    Json(st.labels.clone()).into_response()
}

async fn create_label(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewLabel>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let id = st.take_id();
    let now = Utc::now();
    let label = Label {
        id,
        title: body.title,
        created_at: now,
        updated_at: now,
    };
    st.labels.push(label.clone());
    (StatusCode::CREATED, Json(label)).into_response()
}

async fn update_label(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateLabel>,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let Some(label) = st.labels.iter_mut().find(|l| l.id == id) else {
        return error(StatusCode::NOT_FOUND, "Label not found");
    };
    label.title = body.title;
    label.updated_at = Utc::now();
    let label = label.clone();
    // The backend renames the label everywhere it is attached.
    for ticket in st.tickets.iter_mut() {
        for attached in ticket.labels.iter_mut() {
            if attached.id == id {
                attached.title = label.title.clone();
            }
        }
    }
    Json(label).into_response()
}

async fn delete_label(
    State(app): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut st = lock_app(&app);
    st.hits += 1;
    if let Err(resp) = check_auth(&headers) {
        return resp;
    }
    if let Some(resp) = take_failure(&mut st) {
        return resp;
    }
    let before = st.labels.len();
    st.labels.retain(|l| l.id != id);
    if st.labels.len() == before {
        return error(StatusCode::NOT_FOUND, "Label not found");
    }
    for ticket in st.tickets.iter_mut() {
        ticket.labels.retain(|l| l.id != id);
    }
    StatusCode::NO_CONTENT.into_response()
}
