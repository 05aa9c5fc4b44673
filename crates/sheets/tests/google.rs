//! Google backend against an in-process fake of the token, Sheets and Drive
//! endpoints.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use engine::{
    Amount, BudgetEntry, BudgetTable, Direction, EngineError, LedgerStore, TransactionDraft,
    columns,
};
use sheets::{GoogleBudgets, GoogleLedger, ServiceAccountKey, SheetsClient, SheetsError};

const PRIVATE_KEY: &str = include_str!("fixtures/service_account_key.pem");
const SPREADSHEET: &str = "sheet-1";
const TOKEN: &str = "ya29.fake-token";
const REVOKED: &str = "revoked@project.iam.gserviceaccount.com";
const READ_ONLY_SHEET: &str = "唯讀";

#[derive(Default)]
struct Google {
    sheets: HashMap<String, Vec<Vec<Value>>>,
    files: Vec<(String, String)>,
    token_requests: usize,
    render_options: Vec<String>,
    drive_queries: Vec<String>,
}

type Shared = Arc<Mutex<Google>>;

fn google_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message}})),
    )
        .into_response()
}

fn sheet_name(range: &str) -> String {
    range
        .trim_end_matches(":append")
        .trim_matches('\'')
        .replace("''", "'")
}

fn rejected(spreadsheet: &str, headers: &HeaderMap) -> Option<Response> {
    let bearer = format!("Bearer {TOKEN}");
    if headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(bearer.as_str()) {
        return Some(google_error(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
        ));
    }
    if spreadsheet != SPREADSHEET {
        return Some(google_error(
            StatusCode::NOT_FOUND,
            "Requested entity was not found.",
        ));
    }
    None
}

async fn token(
    State(google): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );
    let assertion = form.get("assertion").cloned().unwrap_or_default();
    assert_eq!(assertion.split('.').count(), 3);

    google.lock().unwrap().token_requests += 1;

    if assertion_mentions(&assertion, REVOKED) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."})),
        )
            .into_response();
    }

    Json(json!({"access_token": TOKEN, "expires_in": 3599, "token_type": "Bearer"})).into_response()
}

/// Whether the JWT claims segment contains `needle`.
fn assertion_mentions(assertion: &str, needle: &str) -> bool {
    use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};

    assertion
        .split('.')
        .nth(1)
        .and_then(|claims| BASE64_URL_SAFE_NO_PAD.decode(claims).ok())
        .is_some_and(|claims| String::from_utf8_lossy(&claims).contains(needle))
}

async fn get_values(
    State(google): State<Shared>,
    Path((spreadsheet, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = rejected(&spreadsheet, &headers) {
        return rejection;
    }

    let mut google = google.lock().unwrap();
    google
        .render_options
        .push(query.get("valueRenderOption").cloned().unwrap_or_default());

    let rows = google
        .sheets
        .get(&sheet_name(&range))
        .cloned()
        .unwrap_or_default();
    // The API leaves `values` out for an empty range.
    if rows.is_empty() {
        return Json(json!({"range": range, "majorDimension": "ROWS"})).into_response();
    }
    Json(json!({"range": range, "majorDimension": "ROWS", "values": rows})).into_response()
}

#[derive(Deserialize)]
struct AppendRequest {
    values: Vec<Vec<Value>>,
}

async fn append_values(
    State(google): State<Shared>,
    Path((spreadsheet, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<AppendRequest>,
) -> Response {
    if let Some(rejection) = rejected(&spreadsheet, &headers) {
        return rejection;
    }
    assert!(range.ends_with(":append"));
    assert_eq!(
        query.get("valueInputOption").map(String::as_str),
        Some("RAW")
    );

    let sheet = sheet_name(&range);
    if sheet == READ_ONLY_SHEET {
        return google_error(
            StatusCode::FORBIDDEN,
            "The caller does not have permission",
        );
    }

    let mut google = google.lock().unwrap();
    google.sheets.entry(sheet).or_default().extend(body.values);
    Json(json!({"spreadsheetId": spreadsheet})).into_response()
}

async fn list_files(
    State(google): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = rejected(SPREADSHEET, &headers) {
        return rejection;
    }

    let mut google = google.lock().unwrap();
    let q = query.get("q").cloned().unwrap_or_default();
    google.drive_queries.push(q.clone());

    let files: Vec<Value> = google
        .files
        .iter()
        .filter(|(_, name)| q.contains(&format!("name = '{name}'")))
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    Json(json!({"files": files})).into_response()
}

struct Fake {
    google: Shared,
    base_url: String,
}

impl Fake {
    async fn start() -> Self {
        let google = Shared::default();
        let app = Router::new()
            .route("/token", post(token))
            .route(
                "/v4/spreadsheets/{spreadsheet}/values/{range}",
                get(get_values).post(append_values),
            )
            .route("/drive/v3/files", get(list_files))
            .with_state(google.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            google,
            base_url: format!("http://{addr}"),
        }
    }

    fn seed(&self, sheet: &str, rows: Vec<Vec<Value>>) {
        self.google
            .lock()
            .unwrap()
            .sheets
            .insert(sheet.to_string(), rows);
    }

    fn rows(&self, sheet: &str) -> Vec<Vec<Value>> {
        self.google
            .lock()
            .unwrap()
            .sheets
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }

    fn unbound_client(&self, client_email: &str) -> SheetsClient {
        SheetsClient::new(
            reqwest::Client::builder().no_proxy().build().unwrap(),
            ServiceAccountKey {
                client_email: client_email.to_string(),
                private_key: PRIVATE_KEY.to_string(),
                token_uri: format!("{}/token", self.base_url),
            },
        )
        .with_base_url(&self.base_url)
        .with_drive_url(&self.base_url)
    }

    fn client(&self) -> SheetsClient {
        self.unbound_client("bot@project.iam.gserviceaccount.com")
            .with_spreadsheet_id(SPREADSHEET)
    }
}

fn lunch() -> engine::Transaction {
    TransactionDraft {
        category: "食物".to_string(),
        tool: "現金".to_string(),
        method: "支出".to_string(),
        direction: Direction::Expense,
        amount: Amount::new(120),
        note: "午餐".to_string(),
    }
    .stamp("2026年10月19日 12:30".to_string())
}

fn header_row() -> Vec<Value> {
    columns::ALL.iter().map(|c| Value::from(*c)).collect()
}

#[tokio::test]
async fn append_then_read_returns_the_seven_cells() {
    let fake = Fake::start().await;
    let ledger = GoogleLedger::new(fake.client(), "記帳紀錄");

    ledger.ensure_header().await.unwrap();
    assert_eq!(fake.rows("記帳紀錄"), vec![header_row()]);

    let tx = lunch();
    ledger.append(&tx).await.unwrap();

    let stored = fake.rows("記帳紀錄");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1][5], Value::from(120));

    let rows = ledger.read_all().await.unwrap();
    assert_eq!(rows, vec![tx.to_row()]);

    let google = fake.google.lock().unwrap();
    assert_eq!(google.token_requests, 1);
    assert!(google.render_options.iter().all(|o| o == "UNFORMATTED_VALUE"));
}

#[tokio::test]
async fn ensure_header_leaves_a_used_sheet_alone() {
    let fake = Fake::start().await;
    let existing = vec![
        header_row(),
        vec![
            json!("2026年10月1日 09:00"),
            json!("交通"),
            json!("悠遊卡"),
            json!("支出"),
            json!("-"),
            json!(30),
        ],
    ];
    fake.seed("記帳紀錄", existing.clone());

    let ledger = GoogleLedger::new(fake.client(), "記帳紀錄");
    ledger.ensure_header().await.unwrap();
    assert_eq!(fake.rows("記帳紀錄"), existing);

    // The trailing empty note is omitted by the API and read back as "".
    let rows = ledger.read_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, "30");
    assert_eq!(rows[0].note, "");
}

#[tokio::test]
async fn budgets_are_read_from_the_worksheet() {
    let fake = Fake::start().await;
    fake.seed(
        "預算設定",
        vec![
            vec![json!("分類"), json!("每月預算")],
            vec![json!("食物"), json!(3000)],
            vec![json!("交通"), json!(1000)],
        ],
    );

    let budgets = GoogleBudgets::new(fake.client(), "預算設定");
    assert_eq!(
        budgets.read_all().await.unwrap(),
        vec![BudgetEntry::new("食物", 3000), BudgetEntry::new("交通", 1000)]
    );
}

#[tokio::test]
async fn unknown_spreadsheet_is_an_api_error() {
    let fake = Fake::start().await;
    let client = fake.client().with_spreadsheet_id("does-not-exist");

    let err = client.get_values("'記帳紀錄'").await.unwrap_err();
    let SheetsError::Api { status, message } = err else {
        panic!("expected an api error, got {err:?}");
    };
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert_eq!(message, "Requested entity was not found.");

    let err = GoogleLedger::new(client, "記帳紀錄")
        .read_all()
        .await
        .unwrap_err();
    let EngineError::Storage(message) = err else {
        panic!("expected a storage error, got {err:?}");
    };
    assert!(message.contains("404"));
}

#[tokio::test]
async fn refused_append_is_a_storage_error() {
    let fake = Fake::start().await;
    let ledger = GoogleLedger::new(fake.client(), READ_ONLY_SHEET);

    let err = ledger.append(&lunch()).await.unwrap_err();
    let EngineError::Storage(message) = err else {
        panic!("expected a storage error, got {err:?}");
    };
    assert!(message.contains("403"));
    assert!(message.contains("The caller does not have permission"));
}

#[tokio::test]
async fn rejected_token_exchange_is_an_api_error() {
    let fake = Fake::start().await;
    let client = fake.unbound_client(REVOKED).with_spreadsheet_id(SPREADSHEET);

    let err = client.get_values("'記帳紀錄'").await.unwrap_err();
    let SheetsError::Api { status, message } = err else {
        panic!("expected an api error, got {err:?}");
    };
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(message, "Invalid JWT Signature.");
}

#[tokio::test]
async fn spreadsheet_is_found_by_title() {
    let fake = Fake::start().await;
    fake.google
        .lock()
        .unwrap()
        .files
        .push((SPREADSHEET.to_string(), "我的記帳本".to_string()));

    let client = fake
        .unbound_client("bot@project.iam.gserviceaccount.com")
        .select_by_title("我的記帳本")
        .await
        .unwrap();
    assert_eq!(client.spreadsheet_id(), SPREADSHEET);

    let ledger = GoogleLedger::new(client, "記帳紀錄");
    ledger.append(&lunch()).await.unwrap();
    assert_eq!(fake.rows("記帳紀錄").len(), 1);

    let google = fake.google.lock().unwrap();
    assert!(google.drive_queries[0].contains("mimeType = 'application/vnd.google-apps.spreadsheet'"));
}

#[tokio::test]
async fn missing_title_is_reported() {
    let fake = Fake::start().await;

    let err = fake
        .unbound_client("bot@project.iam.gserviceaccount.com")
        .select_by_title("不存在")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SheetsError::SpreadsheetNotFound(title) if title == "不存在"));
}
