//! # REST API
//!
//! Builds the axum router that exposes the ledger node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                               | Description                          |
//! |--------|------------------------------------|--------------------------------------|
//! | GET    | `/health`                          | Liveness probe                       |
//! | GET    | `/status`                          | Node status summary                  |
//! | POST   | `/add`                             | Record a POS sale                    |
//! | GET    | `/transactions`                    | List POS sales (filterable)          |
//! | POST   | `/sync`                            | Reconcile an offline sale batch      |
//! | GET    | `/stats`                           | Daily/weekly revenue summaries       |
//! | GET    | `/wavepay/test`                    | WavePay subsystem probe              |
//! | POST   | `/wavepay/create_wallet`           | Issue a wallet + keypair             |
//! | GET    | `/wavepay/get_wallet/:wallet_id`   | Wallet lookup                        |
//! | POST   | `/wavepay/create_transaction`      | Build + sign a transfer              |
//! | POST   | `/wavepay/verify_transaction`      | Integrity checks, no state change    |
//! | POST   | `/wavepay/process_transaction`     | Apply a signed transfer              |
//! | POST   | `/wavepay/sync_transactions`       | Reconcile an offline transfer batch  |
//! | GET    | `/wavepay/transactions/:wallet_id` | A wallet's transfer history          |

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wavepay_protocol::attestation::SensorOracle;
use wavepay_protocol::ledger::{LedgerEngine, LedgerError, TransactionRecord, Wallet};
use wavepay_protocol::sales::{SaleDraft, SaleInsert, SaleRecord, SalesFilter, SyncReport};
use wavepay_protocol::transaction::{
    sign_transaction, Amount, Currency, SignedTransaction, TransactionBuilder,
};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The single ledger authority.
    pub engine: Arc<LedgerEngine>,
    /// Sensor source for server-built transfers.
    pub oracle: Arc<dyn SensorOracle>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Process start time, for the status endpoint.
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured API port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/add", post(add_sale_handler))
        .route("/transactions", get(list_sales_handler))
        .route("/sync", post(sync_sales_handler))
        .route("/stats", get(stats_handler))
        .route("/wavepay/test", get(wavepay_test_handler))
        .route("/wavepay/create_wallet", post(create_wallet_handler))
        .route("/wavepay/get_wallet/:wallet_id", get(get_wallet_handler))
        .route(
            "/wavepay/create_transaction",
            post(create_transaction_handler),
        )
        .route(
            "/wavepay/verify_transaction",
            post(verify_transaction_handler),
        )
        .route(
            "/wavepay/process_transaction",
            post(process_transaction_handler),
        )
        .route("/wavepay/sync_transactions", post(sync_transactions_handler))
        .route(
            "/wavepay/transactions/:wallet_id",
            get(wallet_transactions_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind (see [`LedgerError::kind`]).
    pub kind: String,
    /// Human-readable message.
    pub error: String,
}

/// Wrapper that turns a [`LedgerError`] into an HTTP response.
///
/// Mapping: unknown wallet → 404, duplicate transaction → 409 (the transfer
/// already went through — a retrying client should treat this as success),
/// internal failures → 500, everything else the caller can fix → 400.
#[derive(Debug)]
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::WalletNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::DuplicateTransaction(_) => StatusCode::CONFLICT,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::InvalidSignature
            | LedgerError::InvalidAttestation
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        let body = ErrorResponse {
            kind: self.0.kind().to_owned(),
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /wavepay/create_wallet`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateWalletRequest {
    /// Opening balance; zero when omitted.
    #[serde(default)]
    pub initial_balance: Option<Amount>,
    /// Currency code; node default when omitted.
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Response payload for `POST /wavepay/create_wallet`.
///
/// The private key appears here and nowhere else, ever. Clients must store
/// it on their side; the server cannot recover it.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateWalletResponse {
    pub wallet: Wallet,
    pub private_key: String,
}

/// Response payload for `GET /wavepay/get_wallet/:wallet_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub wallet: Wallet,
}

/// Request body for `POST /wavepay/create_transaction`.
///
/// The private key is accepted here so thin clients (the QR-display flow)
/// can delegate building and signing to the node in one call. It is used for
/// the signature and dropped; nothing about it is persisted or logged.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub sender_wallet_id: String,
    pub receiver_wallet_id: String,
    pub amount: Amount,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub private_key: String,
}

/// Response payload for `POST /wavepay/create_transaction`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    pub transaction: SignedTransaction,
    /// The signed transaction as a JSON string, ready to render as a QR code.
    pub qr_data: String,
}

/// Envelope for endpoints that take one signed transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub transaction: SignedTransaction,
}

/// Response payload for `POST /wavepay/verify_transaction`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Response payload for `POST /wavepay/process_transaction`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub transaction_id: String,
    pub new_balances: NewBalances,
}

/// Post-transfer balances for both parties.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewBalances {
    pub sender: Amount,
    pub receiver: Amount,
}

/// Request body for `POST /wavepay/sync_transactions` and `POST /sync`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncTransactionsRequest {
    pub transactions: Vec<SignedTransaction>,
}

/// Request body for `POST /sync`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncSalesRequest {
    pub transactions: Vec<SaleDraft>,
}

/// Request body for `POST /add` — one sale, or a bulk list from a terminal
/// flushing its queue in a single request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddSaleBody {
    One(SaleDraft),
    Many(Vec<SaleDraft>),
}

/// Response payload for `POST /add`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddSaleResponse {
    /// The records actually stored; idempotent retries are omitted.
    pub records: Vec<SaleRecord>,
    /// `local_id`s skipped because they were already known.
    pub duplicates: Vec<String>,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub wallet_count: usize,
    pub transaction_count: usize,
    pub sale_count: usize,
    pub uptime_seconds: i64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Handlers — Node
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators. It intentionally does not
/// check internal subsystem health — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns ledger counters and uptime.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        wallet_count: state.engine.wallet_count(),
        transaction_count: state.engine.transaction_count(),
        sale_count: state.engine.sales_count(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /wavepay/test` — confirms the wallet subsystem is wired up.
async fn wavepay_test_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "WavePay subsystem operational",
    }))
}

// ---------------------------------------------------------------------------
// Handlers — Wallets & Transfers
// ---------------------------------------------------------------------------

/// `POST /wavepay/create_wallet` — issues a wallet with a fresh keypair.
///
/// Returns 201 with the wallet record and the private key. This response is
/// the private key's only appearance; treat it accordingly on the client.
async fn create_wallet_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateWalletRequest>,
) -> impl IntoResponse {
    let created = state.engine.create_wallet(
        req.initial_balance.unwrap_or(Amount::ZERO),
        req.currency.unwrap_or_default(),
    );
    state.metrics.wallets_created_total.inc();
    state
        .metrics
        .wallet_count
        .set(state.engine.wallet_count() as i64);
    (
        StatusCode::CREATED,
        Json(CreateWalletResponse {
            wallet: created.wallet,
            private_key: created.private_key,
        }),
    )
}

/// `GET /wavepay/get_wallet/:wallet_id` — wallet lookup. 404 when unknown.
async fn get_wallet_handler(
    Path(wallet_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet = state.engine.get_wallet(&wallet_id)?;
    Ok(Json(WalletResponse { wallet }))
}

/// `POST /wavepay/create_transaction` — builds, attests, and signs a transfer
/// on behalf of a thin client.
///
/// Returns 201 with the signed transaction plus its JSON form for QR display.
/// The transfer is NOT applied — the receiver's device submits it to
/// `process_transaction` after scanning.
async fn create_transaction_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = TransactionBuilder::new(req.sender_wallet_id, req.receiver_wallet_id)
        .amount(req.amount)
        .currency(req.currency.unwrap_or_default())
        .build(state.oracle.as_ref())
        .map_err(|e| LedgerError::Validation(e.to_string()))?;

    let transaction = sign_transaction(payload, &req.private_key)
        .map_err(|e| LedgerError::Validation(e.to_string()))?;

    let qr_data = serde_json::to_string(&transaction)
        .map_err(|e| LedgerError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            transaction,
            qr_data,
        }),
    ))
}

/// `POST /wavepay/verify_transaction` — runs the integrity checks without
/// touching the ledger.
async fn verify_transaction_handler(
    State(state): State<AppState>,
    Json(req): Json<TransactionEnvelope>,
) -> Result<Json<VerifyResponse>, ApiError> {
    state.engine.verify_transaction(&req.transaction)?;
    Ok(Json(VerifyResponse { valid: true }))
}

/// `POST /wavepay/process_transaction` — applies a signed transfer.
///
/// Returns 201 with the new balances on success. Failure leaves the ledger
/// untouched and reports the specific refusal (see [`ApiError`]).
async fn process_transaction_handler(
    State(state): State<AppState>,
    Json(req): Json<TransactionEnvelope>,
) -> Result<impl IntoResponse, ApiError> {
    let timer = state.metrics.transfer_latency_seconds.start_timer();
    let result = state.engine.process_transaction(req.transaction);
    timer.observe_duration();

    match result {
        Ok(outcome) => {
            state.metrics.transfers_committed_total.inc();
            // The engine records a linked POS sale with every commit.
            state.metrics.sales_recorded_total.inc();
            Ok((
                StatusCode::CREATED,
                Json(ProcessResponse {
                    transaction_id: outcome.transaction_id,
                    new_balances: NewBalances {
                        sender: outcome.sender_balance,
                        receiver: outcome.receiver_balance,
                    },
                }),
            ))
        }
        Err(err) => {
            state.metrics.transfers_rejected_total.inc();
            Err(err.into())
        }
    }
}

/// `POST /wavepay/sync_transactions` — reconciles an offline transfer batch.
///
/// Best-effort and idempotent: known ids are skipped, the report lists what
/// was actually inserted.
async fn sync_transactions_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncTransactionsRequest>,
) -> (StatusCode, Json<SyncReport>) {
    let report = state.engine.sync_transactions(req.transactions);
    state
        .metrics
        .records_synced_total
        .inc_by(report.synced_count as u64);
    (StatusCode::CREATED, Json(report))
}

/// `GET /wavepay/transactions/:wallet_id` — the wallet's transfer history,
/// newest first. An unknown wallet simply has an empty history.
async fn wallet_transactions_handler(
    Path(wallet_id): Path<String>,
    State(state): State<AppState>,
) -> Json<Vec<TransactionRecord>> {
    Json(state.engine.list_wallet_transactions(&wallet_id))
}

// ---------------------------------------------------------------------------
// Handlers — POS Sales
// ---------------------------------------------------------------------------

/// `POST /add` — records sales entered at the register.
///
/// Accepts a single sale or a bulk list. Returns 201 when anything was
/// inserted; a request consisting entirely of idempotent retries returns 200
/// listing the skipped `local_id`s — the terminal can safely fire-and-forget.
async fn add_sale_handler(
    State(state): State<AppState>,
    Json(body): Json<AddSaleBody>,
) -> impl IntoResponse {
    let drafts = match body {
        AddSaleBody::One(draft) => vec![draft],
        AddSaleBody::Many(drafts) => drafts,
    };
    let mut response = AddSaleResponse {
        records: Vec::new(),
        duplicates: Vec::new(),
    };
    for draft in drafts {
        match state.engine.add_sale(draft) {
            SaleInsert::Inserted(record) => {
                state.metrics.sales_recorded_total.inc();
                response.records.push(record);
            }
            SaleInsert::AlreadyKnown(local_id) => response.duplicates.push(local_id),
        }
    }
    let status = if response.records.is_empty() && !response.duplicates.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(response))
}

/// `POST /sync` — reconciles an offline sale batch.
async fn sync_sales_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncSalesRequest>,
) -> (StatusCode, Json<SyncReport>) {
    let report = state.engine.sync_sales(req.transactions);
    state
        .metrics
        .records_synced_total
        .inc_by(report.synced_count as u64);
    state
        .metrics
        .sales_recorded_total
        .inc_by(report.synced_count as u64);
    (StatusCode::CREATED, Json(report))
}

/// `GET /transactions` — lists POS sales, newest first.
///
/// Query parameters: `days` (takes precedence), or `start_date`/`end_date`
/// as ISO-8601 timestamps.
async fn list_sales_handler(
    State(state): State<AppState>,
    Query(filter): Query<SalesFilter>,
) -> Json<Vec<SaleRecord>> {
    Json(state.engine.list_sales(&filter))
}

/// `GET /stats` — daily and weekly revenue summaries.
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.sales_stats())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
