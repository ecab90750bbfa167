mod quiz_store;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::core::{
    AnswerFeedback, AnswerRecord, BadgeTier, BudgetPlan, CoreError, DEFAULT_MONTHLY_CONTRIBUTION,
    DEFAULT_YEARS, EMERGENCY_FUND_MONTHS, QuizSession, QuizState, SipInputs, SipMode,
    SipProjection, TemplateKind, allocate, badge, blank_template, default_bank, default_rate_for,
    emergency_fund, project, write_csv,
};

pub use quiz_store::{DEFAULT_MAX_SESSIONS, QuizStore};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Clone)]
pub struct AppState {
    pub quiz: QuizStore,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            quiz: QuizStore::new(default_bank(), DEFAULT_MAX_SESSIONS),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiSipMode {
    #[serde(alias = "annuityDue", alias = "annuity_due")]
    AnnuityDue,
    #[serde(alias = "lumpDecay", alias = "lump_decay")]
    LumpDecay,
}

impl From<ApiSipMode> for SipMode {
    fn from(value: ApiSipMode) -> Self {
        match value {
            ApiSipMode::AnnuityDue => SipMode::AnnuityDue,
            ApiSipMode::LumpDecay => SipMode::LumpDecay,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiTemplateKind {
    #[serde(alias = "fiftyThirtyTwenty", alias = "fifty_thirty_twenty", alias = "50-30-20")]
    FiftyThirtyTwenty,
    #[serde(alias = "basicEssentials", alias = "basic_essentials", alias = "basic")]
    BasicEssentials,
    Custom,
}

impl From<ApiTemplateKind> for TemplateKind {
    fn from(value: ApiTemplateKind) -> Self {
        match value {
            ApiTemplateKind::FiftyThirtyTwenty => TemplateKind::FiftyThirtyTwenty,
            ApiTemplateKind::BasicEssentials => TemplateKind::BasicEssentials,
            ApiTemplateKind::Custom => TemplateKind::Custom,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPayload {
    monthly_contribution: Option<f64>,
    annual_return: Option<f64>,
    years: Option<u32>,
    mode: Option<ApiSipMode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryPayload {
    #[serde(alias = "category")]
    name: String,
    #[serde(default)]
    amount: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BudgetPayload {
    income: Option<f64>,
    template: Option<ApiTemplateKind>,
    categories: Option<Vec<CategoryPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EmergencyFundQuery {
    monthly_expenses: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerPayload {
    question_index: Option<usize>,
    choice: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SipResponse {
    monthly_contribution: f64,
    annual_return: f64,
    years: u32,
    months: u32,
    #[serde(flatten)]
    projection: SipProjection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BudgetLineView {
    category: String,
    amount: f64,
    share_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BudgetResponse {
    template: TemplateKind,
    income: f64,
    lines: Vec<BudgetLineView>,
    total_allocated: f64,
    remaining: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmergencyFundResponse {
    monthly_expenses: f64,
    months: f64,
    target: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionView {
    index: usize,
    text: String,
    options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizResultView {
    score_percent: u8,
    badge_tier: BadgeTier,
    badge_ordinal: u8,
    review: Vec<AnswerRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizView {
    session_id: u64,
    state: QuizState,
    total_questions: usize,
    answered: usize,
    correct_count: usize,
    question: Option<QuestionView>,
    result: Option<QuizResultView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerResponse {
    feedback: AnswerFeedback,
    quiz: QuizView,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn sip_request_from_payload(payload: SipPayload) -> (SipInputs, SipMode) {
    let mode: SipMode = payload.mode.map(Into::into).unwrap_or(SipMode::AnnuityDue);
    let inputs = SipInputs {
        monthly_contribution: payload
            .monthly_contribution
            .unwrap_or(DEFAULT_MONTHLY_CONTRIBUTION),
        annual_return_percent: payload.annual_return.unwrap_or(default_rate_for(mode)),
        years: payload.years.unwrap_or(DEFAULT_YEARS),
    };
    (inputs, mode)
}

fn budget_plan_from_payload(payload: BudgetPayload) -> Result<BudgetPlan, CoreError> {
    let Some(income) = payload.income else {
        return Err(CoreError::InvalidInput("income is required".to_string()));
    };
    let template: TemplateKind = payload
        .template
        .map(Into::into)
        .unwrap_or(TemplateKind::FiftyThirtyTwenty);
    let categories: Option<Vec<(String, f64)>> = payload.categories.map(|categories| {
        categories
            .into_iter()
            .map(|category| (category.name, category.amount))
            .collect()
    });
    allocate(income, template, categories.as_deref())
}

fn build_sip_response(inputs: &SipInputs, projection: SipProjection) -> SipResponse {
    SipResponse {
        monthly_contribution: inputs.monthly_contribution,
        annual_return: inputs.annual_return_percent,
        years: inputs.years,
        months: inputs.months(),
        projection,
    }
}

fn build_budget_response(plan: &BudgetPlan) -> BudgetResponse {
    BudgetResponse {
        template: plan.template,
        income: plan.income,
        lines: plan
            .lines
            .iter()
            .map(|line| BudgetLineView {
                category: line.category.clone(),
                amount: line.amount,
                share_percent: plan.share_of_income(line),
            })
            .collect(),
        total_allocated: plan.total_allocated(),
        remaining: plan.remaining(),
    }
}

fn build_quiz_view(session_id: u64, session: &QuizSession) -> QuizView {
    let question = session.current_question().map(|(index, q)| QuestionView {
        index,
        text: q.text().to_string(),
        options: q.options().to_vec(),
    });
    let result = session.score_percent().ok().map(|score| {
        let tier = badge(score);
        QuizResultView {
            score_percent: score,
            badge_tier: tier,
            badge_ordinal: tier.ordinal(),
            review: session.answer_log().to_vec(),
        }
    });
    let (answered, total_questions) = session.progress();
    QuizView {
        session_id,
        state: session.state(),
        total_questions,
        answered,
        correct_count: session.correct_count(),
        question,
        result,
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/sip", get(sip_get_handler).post(sip_post_handler))
        .route("/api/budget", post(budget_handler))
        .route("/api/budget/template.csv", get(budget_template_csv_handler))
        .route("/api/budget/export.csv", post(budget_export_csv_handler))
        .route("/api/emergency-fund", get(emergency_fund_handler))
        .route("/api/quiz/sessions", post(quiz_create_handler))
        .route("/api/quiz/sessions/:id", get(quiz_get_handler))
        .route("/api/quiz/sessions/:id/answers", post(quiz_answer_handler))
        .route("/api/quiz/sessions/:id/restart", post(quiz_restart_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let app = build_router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    info!("Financial Buddy listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn sip_get_handler(Query(payload): Query<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

async fn sip_post_handler(Json(payload): Json<SipPayload>) -> Response {
    sip_handler_impl(payload)
}

fn sip_handler_impl(payload: SipPayload) -> Response {
    let (inputs, mode) = sip_request_from_payload(payload);
    match project(&inputs, mode) {
        Ok(projection) => json_response(StatusCode::OK, build_sip_response(&inputs, projection)),
        Err(err) => core_error_response(&err),
    }
}

async fn budget_handler(Json(payload): Json<BudgetPayload>) -> Response {
    match budget_plan_from_payload(payload) {
        Ok(plan) => json_response(StatusCode::OK, build_budget_response(&plan)),
        Err(err) => core_error_response(&err),
    }
}

async fn budget_template_csv_handler() -> Response {
    csv_response(&blank_template(), "budget_template.csv")
}

async fn budget_export_csv_handler(Json(payload): Json<BudgetPayload>) -> Response {
    match budget_plan_from_payload(payload) {
        Ok(plan) => csv_response(&plan, "budget_plan.csv"),
        Err(err) => core_error_response(&err),
    }
}

async fn emergency_fund_handler(Query(query): Query<EmergencyFundQuery>) -> Response {
    let Some(monthly_expenses) = query.monthly_expenses else {
        return error_response(StatusCode::BAD_REQUEST, "monthlyExpenses is required");
    };
    match emergency_fund(monthly_expenses) {
        Ok(target) => json_response(
            StatusCode::OK,
            EmergencyFundResponse {
                monthly_expenses,
                months: EMERGENCY_FUND_MONTHS,
                target,
            },
        ),
        Err(err) => core_error_response(&err),
    }
}

async fn quiz_create_handler(State(state): State<AppState>) -> Response {
    match state.quiz.create() {
        Ok((id, session)) => json_response(StatusCode::CREATED, build_quiz_view(id, &session)),
        Err(err) => core_error_response(&err),
    }
}

async fn quiz_get_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state
        .quiz
        .with_session(id, |session| build_quiz_view(id, session))
    {
        Some(view) => json_response(StatusCode::OK, view),
        None => unknown_session_response(id),
    }
}

async fn quiz_answer_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<AnswerPayload>,
) -> Response {
    let outcome = state.quiz.with_session(id, |session| {
        let feedback = match payload.question_index {
            Some(index) => session.submit_answer_at(index, &payload.choice),
            None => session.submit_answer(&payload.choice),
        }?;
        Ok::<_, CoreError>(AnswerResponse {
            feedback,
            quiz: build_quiz_view(id, session),
        })
    });
    match outcome {
        Some(Ok(response)) => json_response(StatusCode::OK, response),
        Some(Err(err)) => core_error_response(&err),
        None => unknown_session_response(id),
    }
}

async fn quiz_restart_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let view = state.quiz.with_session(id, |session| {
        session.restart();
        build_quiz_view(id, session)
    });
    match view {
        Some(view) => json_response(StatusCode::OK, view),
        None => unknown_session_response(id),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn csv_response(plan: &BudgetPlan, file_name: &str) -> Response {
    let mut body = Vec::new();
    if let Err(err) = write_csv(plan, &mut body) {
        warn!(%err, "budget export failed");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
    }
    let disposition = format!("attachment; filename=\"{file_name}\"");
    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn core_error_response(err: &CoreError) -> Response {
    let status = match err {
        CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidState(_) => StatusCode::CONFLICT,
    };
    warn!(%err, %status, "request rejected");
    error_response(status, &err.to_string())
}

fn unknown_session_response(id: u64) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("unknown quiz session {id}"),
    )
}
