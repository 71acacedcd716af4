use axum::Json;
use axum::extract::Path;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorResponse};
use crate::models::*;
use crate::services::session::INVALID_CREDENTIALS;
use crate::services::{
    BillBoard, BillDraft, CourseEditor, Credentials, MenuItem, NoticeBoard, RngPicker, RoutineEditor, SaveReport,
    Screen, Session, SessionGate, dashboard_menu,
};
use crate::state::AppState;

#[derive(Serialize)]
struct LoginResponse {
    route: Screen,
    session: Session,
}

#[derive(Serialize)]
struct LoginRejected {
    #[serde(flatten)]
    error: ErrorResponse,
    route: Screen,
}

#[derive(Serialize)]
struct RouteResponse {
    route: Screen,
}

#[derive(Serialize)]
struct RoutineResponse {
    semester: Semester,
    routine: RoutineGrid,
}

#[derive(Serialize)]
struct CoursesResponse {
    semester: Semester,
    courses: Vec<Course>,
}

#[derive(Deserialize)]
struct SaveCoursesRequest {
    courses: Vec<Course>,
}

#[derive(Serialize)]
struct SaveCoursesResponse {
    semester: Semester,
    courses: Vec<Course>,
    report: SaveReport,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/routines/{semester}", get(get_routine).put(save_routine))
        .route("/routines/{semester}/generate", post(generate_routine))
        .route("/courses/{semester}", get(list_courses).put(save_courses))
        .route("/courses/{semester}/samples", get(sample_courses))
        .route("/courses/{semester}/{key}", delete(delete_course))
        .route("/notices", get(list_notices).post(create_notice))
        .route("/notices/{id}", delete(delete_notice))
        .route("/academic-bills", get(list_bills).post(create_bill))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.ping().await?;
    Ok(StatusCode::OK)
}

async fn login(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> Response {
    let mut gate = SessionGate::new(state.authenticator.clone(), state.login_delay);
    match gate.submit(&credentials).await {
        Some(session) => Json(LoginResponse {
            route: gate.route(),
            session,
        })
        .into_response(),
        None => {
            let body = LoginRejected {
                error: ErrorResponse {
                    error: StatusCode::UNAUTHORIZED.to_string(),
                    message: gate.error().unwrap_or(INVALID_CREDENTIALS).to_string(),
                },
                route: gate.route(),
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

async fn logout(State(state): State<AppState>) -> Json<RouteResponse> {
    let mut gate = SessionGate::new(state.authenticator.clone(), state.login_delay);
    gate.logout();
    Json(RouteResponse { route: gate.route() })
}

async fn dashboard() -> Json<Vec<MenuItem>> {
    Json(dashboard_menu())
}

async fn get_routine(
    State(state): State<AppState>,
    Path(semester): Path<String>,
) -> Result<Json<RoutineResponse>, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = RoutineEditor::new(state.store.clone(), semester);
    editor.load().await;
    Ok(Json(RoutineResponse {
        semester,
        routine: editor.into_grid(),
    }))
}

async fn save_routine(
    State(state): State<AppState>,
    Path(semester): Path<String>,
    Json(routine): Json<RoutineGrid>,
) -> Result<Json<RoutineResponse>, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = RoutineEditor::new(state.store.clone(), semester);
    editor.replace_grid(routine);
    editor.save().await?;
    Ok(Json(RoutineResponse {
        semester,
        routine: editor.into_grid(),
    }))
}

async fn generate_routine(
    State(state): State<AppState>,
    Path(semester): Path<String>,
) -> Result<Json<RoutineResponse>, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = RoutineEditor::new(state.store.clone(), semester);
    editor.generate_random(&mut RngPicker::thread());
    Ok(Json(RoutineResponse {
        semester,
        routine: editor.into_grid(),
    }))
}

async fn list_courses(
    State(state): State<AppState>,
    Path(semester): Path<String>,
) -> Result<Json<CoursesResponse>, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = CourseEditor::new(state.store.clone(), state.clock.clone(), semester);
    editor.load().await;
    Ok(Json(CoursesResponse {
        semester,
        courses: editor.into_courses(),
    }))
}

async fn save_courses(
    State(state): State<AppState>,
    Path(semester): Path<String>,
    Json(req): Json<SaveCoursesRequest>,
) -> Result<Json<SaveCoursesResponse>, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = CourseEditor::new(state.store.clone(), state.clock.clone(), semester);
    editor.try_load().await?;
    editor.replace_rows(req.courses);
    let report = editor.save().await?;
    Ok(Json(SaveCoursesResponse {
        semester,
        courses: editor.into_courses(),
        report,
    }))
}

async fn sample_courses(
    State(state): State<AppState>,
    Path(semester): Path<String>,
) -> Result<Json<CoursesResponse>, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = CourseEditor::new(state.store.clone(), state.clock.clone(), semester);
    editor.generate_sample();
    Ok(Json(CoursesResponse {
        semester,
        courses: editor.into_courses(),
    }))
}

async fn delete_course(
    State(state): State<AppState>,
    Path((semester, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let semester: Semester = semester.parse()?;
    let mut editor = CourseEditor::new(state.store.clone(), state.clock.clone(), semester);
    editor.try_load().await?;
    let index = editor
        .courses()
        .iter()
        .position(|course| course.id.persisted_key() == Some(key.as_str()))
        .ok_or(AppError::NotFound)?;
    editor.delete_at(index).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    let mut board = NoticeBoard::new(state.store.clone(), state.clock.clone());
    board.load().await;
    Json(board.into_notices())
}

async fn create_notice(
    State(state): State<AppState>,
    Json(req): Json<NewNoticeRequest>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    let mut board = NoticeBoard::new(state.store.clone(), state.clock.clone());
    let notice = board.post(&req).await?;
    Ok((StatusCode::CREATED, Json(notice)))
}

async fn delete_notice(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let mut board = NoticeBoard::new(state.store.clone(), state.clock.clone());
    board.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_bills(State(state): State<AppState>) -> Json<Vec<BillListing>> {
    let mut board = BillBoard::new(state.store.clone(), state.clock.clone());
    board.load().await;
    Json(board.listing(state.clock.now()))
}

async fn create_bill(
    State(state): State<AppState>,
    Json(req): Json<NewBillRequest>,
) -> Result<(StatusCode, Json<BillListing>), AppError> {
    let mut draft = BillDraft::from_request(&req)?;
    let mut board = BillBoard::new(state.store.clone(), state.clock.clone());
    let bill = board.create(&mut draft).await?;
    let status = bill.status(state.clock.now());
    Ok((StatusCode::CREATED, Json(BillListing { bill, status })))
}
