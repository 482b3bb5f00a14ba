// memory.rs — MemoryGateway: an in-process DataGateway.
//
// Mirrors the backend rules the stores rely on, so offline runs and tests
// exercise the same failure modes as the real service:
//   - row ownership: rows are visible and writable only by their owner
//     (`profiles.id`, `*.user_id`), writes without a session are refused
//   - not-null columns and the goal_steps → goals foreign key
//   - generated `id` and strictly increasing `created_at` on insert
//   - deleting a goal cascades to its steps

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::{AuthEvent, Credentials, Session, User};
use crate::data::{tables, DataGateway};
use crate::error::{GatewayError, Result};
use crate::query::Query;

const AUTH_EVENT_CAPACITY: usize = 16;

struct Account {
    password: String,
    user: User,
}

#[derive(Default)]
struct MemoryState {
    session: Option<Session>,
    accounts: HashMap<String, Account>,
    tables: HashMap<String, Vec<Value>>,
    objects: HashMap<String, Vec<u8>>,
    last_stamp: Option<DateTime<Utc>>,
    table_calls: usize,
    fail_next: Option<GatewayError>,
}

impl MemoryState {
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    /// Count a table/storage call and consume an injected failure, if any.
    fn begin_call(&mut self) -> Result<()> {
        self.table_calls += 1;
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn owner(&self) -> Result<String> {
        self.session
            .as_ref()
            .map(|s| s.user.id.to_string())
            .ok_or(GatewayError::Unauthenticated)
    }

    fn stamp_new_row(&mut self, row: &mut Map<String, Value>) {
        if !row.contains_key("id") {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !row.contains_key("created_at") {
            let stamp = self.next_stamp().to_rfc3339_opts(SecondsFormat::Micros, true);
            row.insert("created_at".to_string(), Value::String(stamp));
        }
    }

    fn check_row(&self, table: &str, row: &Map<String, Value>, owner: &str) -> Result<()> {
        for column in required_columns(table) {
            if row.get(*column).map_or(true, Value::is_null) {
                return Err(GatewayError::ValidationRejected(format!(
                    "null value in column \"{}\" of relation \"{}\"",
                    column, table
                )));
            }
        }
        if row.get(owner_column(table)).and_then(Value::as_str) != Some(owner) {
            return Err(GatewayError::Unauthenticated);
        }
        if table == tables::GOAL_STEPS {
            let goal_id = row.get("goal_id").cloned().unwrap_or(Value::Null);
            let goal_exists = self.tables.get(tables::GOALS).is_some_and(|goals| {
                goals.iter().any(|g| {
                    g.get("id") == Some(&goal_id)
                        && g.get("user_id").and_then(Value::as_str) == Some(owner)
                })
            });
            if !goal_exists {
                return Err(GatewayError::ValidationRejected(
                    "insert or update on table \"goal_steps\" violates foreign key constraint \"goal_steps_goal_id_fkey\"".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn owned_rows(&self, table: &str, owner: Option<&str>) -> Vec<Value> {
        let column = owner_column(table);
        self.tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| owner.is_some() && row.get(column).and_then(Value::as_str) == owner)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn owner_column(table: &str) -> &'static str {
    if table == tables::PROFILES {
        "id"
    } else {
        "user_id"
    }
}

fn required_columns(table: &str) -> &'static [&'static str] {
    match table {
        tables::PROFILES => &["id"],
        tables::GOALS => &["user_id", "title"],
        tables::GOAL_STEPS => &["goal_id", "user_id", "title"],
        _ => &[],
    }
}

fn as_object(table: &str, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GatewayError::ValidationRejected(format!(
            "row for {} must be a JSON object, got {}",
            table, other
        ))),
    }
}

fn merge(target: &mut Value, patch: &Map<String, Value>) {
    if let Value::Object(fields) = target {
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
    }
}

/// In-process data gateway. Cheap to construct; one per test.
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
        }
    }

    /// Start signed in with `session` (no event is published).
    pub fn with_session(self, session: Session) -> Self {
        self.with_state(|state| state.session = Some(session));
        self
    }

    /// A session for a fresh user id.
    pub fn session_for(user_id: Uuid) -> Session {
        Session {
            access_token: format!("memory-token-{}", Uuid::new_v4()),
            refresh_token: Some(format!("memory-refresh-{}", Uuid::new_v4())),
            expires_at: None,
            user: User {
                id: user_id,
                email: None,
            },
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn publish(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Insert a row directly, bypassing ownership and constraint checks.
    pub fn seed(&self, table: &str, row: Value) -> Value {
        self.with_state(|state| {
            let mut row = match row {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            state.stamp_new_row(&mut row);
            let row = Value::Object(row);
            state
                .tables
                .entry(table.to_string())
                .or_default()
                .push(row.clone());
            row
        })
    }

    /// Remove rows directly, bypassing ownership. Returns how many were removed.
    pub fn remove_rows(&self, table: &str, query: &Query) -> usize {
        self.with_state(|state| {
            let rows = state.tables.entry(table.to_string()).or_default();
            let before = rows.len();
            rows.retain(|row| !query.matches(row));
            before - rows.len()
        })
    }

    /// Every row in a table, regardless of owner.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.with_state(|state| state.tables.get(table).cloned().unwrap_or_default())
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.with_state(|state| state.objects.get(&format!("{}/{}", bucket, path)).cloned())
    }

    /// Make the next table or storage call fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        self.with_state(|state| state.fail_next = Some(error));
    }

    /// Number of table and storage calls received.
    pub fn table_calls(&self) -> usize {
        self.with_state(|state| state.table_calls)
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn session(&self) -> Option<Session> {
        self.with_state(|state| state.session.clone())
    }

    fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>> {
        let session = self.with_state(|state| {
            if state.accounts.contains_key(&credentials.email) {
                return Err(GatewayError::Auth("User already registered".to_string()));
            }
            let user = User {
                id: Uuid::new_v4(),
                email: Some(credentials.email.clone()),
            };
            state.accounts.insert(
                credentials.email.clone(),
                Account {
                    password: credentials.password.clone(),
                    user: user.clone(),
                },
            );
            let session = Session {
                user,
                ..MemoryGateway::session_for(Uuid::nil())
            };
            state.session = Some(session.clone());
            Ok(session)
        })?;
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let session = self.with_state(|state| {
            let user = match state.accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.user.clone(),
                _ => return Err(GatewayError::Auth("Invalid login credentials".to_string())),
            };
            let session = Session {
                user,
                ..MemoryGateway::session_for(Uuid::nil())
            };
            state.session = Some(session.clone());
            Ok(session)
        })?;
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.with_state(|state| state.session = None);
        self.publish(AuthEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session> {
        let session = self.with_state(|state| {
            let current = state.session.as_ref().ok_or(GatewayError::Unauthenticated)?;
            let refreshed = Session {
                user: current.user.clone(),
                ..MemoryGateway::session_for(Uuid::nil())
            };
            state.session = Some(refreshed.clone());
            Ok::<Session, GatewayError>(refreshed)
        })?;
        self.publish(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        self.with_state(|state| {
            state.begin_call()?;
            let owner = state.session.as_ref().map(|s| s.user.id.to_string());
            let mut rows: Vec<Value> = state
                .owned_rows(table, owner.as_deref())
                .into_iter()
                .filter(|row| query.matches(row))
                .collect();
            query.sort(&mut rows);
            Ok(rows)
        })
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.with_state(|state| {
            state.begin_call()?;
            let owner = state.owner()?;
            let mut prepared = Vec::with_capacity(rows.len());
            for row in rows {
                let row = as_object(table, row)?;
                state.check_row(table, &row, &owner)?;
                prepared.push(row);
            }
            // Validated as a batch: either every row lands or none does.
            let mut inserted = Vec::with_capacity(prepared.len());
            for mut row in prepared {
                state.stamp_new_row(&mut row);
                inserted.push(Value::Object(row));
            }
            state
                .tables
                .entry(table.to_string())
                .or_default()
                .extend(inserted.iter().cloned());
            Ok(inserted)
        })
    }

    async fn upsert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        self.with_state(|state| {
            state.begin_call()?;
            let owner = state.owner()?;
            let mut row = as_object(table, row)?;
            state.check_row(table, &row, &owner)?;

            let id = row.get("id").cloned();
            let existing = id.as_ref().and_then(|id| {
                state
                    .tables
                    .get(table)
                    .and_then(|rows| rows.iter().position(|r| r.get("id") == Some(id)))
            });
            match existing {
                Some(index) => {
                    let rows = state.tables.entry(table.to_string()).or_default();
                    merge(&mut rows[index], &row);
                    Ok(vec![rows[index].clone()])
                }
                None => {
                    state.stamp_new_row(&mut row);
                    let row = Value::Object(row);
                    state
                        .tables
                        .entry(table.to_string())
                        .or_default()
                        .push(row.clone());
                    Ok(vec![row])
                }
            }
        })
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>> {
        self.with_state(|state| {
            state.begin_call()?;
            let owner = state.owner()?;
            let patch = as_object(table, patch)?;
            let column = owner_column(table);
            let targets: Vec<(usize, Value)> = state
                .tables
                .get(table)
                .map(|rows| {
                    rows.iter()
                        .enumerate()
                        .filter(|(_, row)| {
                            row.get(column).and_then(Value::as_str) == Some(owner.as_str())
                                && query.matches(row)
                        })
                        .map(|(index, row)| (index, row.clone()))
                        .collect()
                })
                .unwrap_or_default();

            // Merged rows must pass the same checks as an insert before any lands.
            let mut updated = Vec::with_capacity(targets.len());
            for (index, mut row) in targets {
                merge(&mut row, &patch);
                let fields = as_object(table, row)?;
                state.check_row(table, &fields, &owner)?;
                updated.push((index, Value::Object(fields)));
            }
            if let Some(rows) = state.tables.get_mut(table) {
                for (index, row) in &updated {
                    rows[*index] = row.clone();
                }
            }
            Ok(updated.into_iter().map(|(_, row)| row).collect())
        })
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        self.with_state(|state| {
            state.begin_call()?;
            let owner = state.owner()?;
            let column = owner_column(table);
            let rows = state.tables.entry(table.to_string()).or_default();
            let (removed, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|row| {
                    row.get(column).and_then(Value::as_str) == Some(owner.as_str())
                        && query.matches(row)
                });
            *rows = kept;

            if table == tables::GOALS {
                let removed_ids: Vec<&Value> = removed.iter().filter_map(|r| r.get("id")).collect();
                if let Some(steps) = state.tables.get_mut(tables::GOAL_STEPS) {
                    steps.retain(|step| {
                        step.get("goal_id")
                            .map_or(true, |goal_id| !removed_ids.contains(&goal_id))
                    });
                }
            }
            Ok(removed)
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        self.with_state(|state| {
            state.begin_call()?;
            state.owner()?;
            let key = format!("{}/{}", bucket, path);
            if state.objects.contains_key(&key) {
                return Err(GatewayError::ValidationRejected(format!(
                    "object already exists: {}",
                    key
                )));
            }
            state.objects.insert(key, bytes);
            Ok(())
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://storage/{}/{}", bucket, path)
    }
}
