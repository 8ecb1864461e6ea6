use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::models::{
    AgentRequest, CreateEvaluationRequest, EvaluationResponse, EvaluationResult, NewAgent,
    NewEvaluation,
};
use crate::routes::{ApiError, AppState, AuthenticatedUser};

/// Configure agent evaluation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/agents", web::get().to(list_agents))
        .route("/agents", web::post().to(create_agent))
        .route("/agents/{id}", web::patch().to(update_agent))
        .route("/agents/{id}", web::delete().to(delete_agent))
        .route("/evaluation-criteria", web::get().to(list_criteria))
        .route("/evaluations", web::get().to(list_evaluations))
        .route("/evaluations", web::post().to(create_evaluation))
        .route("/evaluations/{id}", web::get().to(get_evaluation));
}

async fn list_agents(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let agents = state
        .backend
        .list_agents()
        .await
        .map_err(|e| ApiError::backend("Failed to load agents", e))?;

    Ok(HttpResponse::Ok().json(agents))
}

impl From<AgentRequest> for NewAgent {
    fn from(req: AgentRequest) -> Self {
        Self {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.trim().to_string(),
            agent_id: req.agent_id.trim().to_string(),
        }
    }
}

async fn create_agent(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<AgentRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let agent = state
        .backend
        .create_agent(&NewAgent::from(req.into_inner()))
        .await
        .map_err(|e| ApiError::backend("Failed to create agent", e))?;

    tracing::info!("{} created agent {} ({})", user.0.email, agent.id, agent.agent_id);

    Ok(HttpResponse::Created().json(agent))
}

async fn update_agent(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<AgentRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let agent = state
        .backend
        .update_agent(path.into_inner(), &NewAgent::from(req.into_inner()))
        .await
        .map_err(|e| ApiError::backend("Failed to update agent", e))?;

    Ok(HttpResponse::Ok().json(agent))
}

async fn delete_agent(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    state
        .backend
        .delete_agent(id)
        .await
        .map_err(|e| ApiError::backend("Failed to delete agent", e))?;

    tracing::info!("{} deleted agent {}", user.0.email, id);

    Ok(HttpResponse::NoContent().finish())
}

async fn list_criteria(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let criteria = state
        .backend
        .list_criteria()
        .await
        .map_err(|e| ApiError::backend("Failed to load evaluation criteria", e))?;

    Ok(HttpResponse::Ok().json(criteria))
}

/// Store an agent evaluation with its per-criteria results
///
/// POST /api/v1/evaluations
///
/// Request body:
/// ```json
/// {
///   "agentId": 4,
///   "evaluatedAt": "2024-05-02",
///   "results": [{ "criteriaId": 1, "isOk": true, "rating": 4, "notes": null }]
/// }
/// ```
async fn create_evaluation(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateEvaluationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let req = req.into_inner();

    let evaluation = NewEvaluation {
        agent_id: req.agent_id,
        evaluated_at: req.evaluated_at,
        evaluator: user.0.email,
    };

    // evaluation_id is filled in once the evaluation row exists
    let results = req
        .results
        .into_iter()
        .map(|r| EvaluationResult {
            evaluation_id: 0,
            criteria_id: r.criteria_id,
            is_ok: r.is_ok,
            rating: r.rating,
            notes: r.notes,
        })
        .collect();

    let (evaluation, results) = state
        .backend
        .create_evaluation(&evaluation, results)
        .await
        .map_err(|e| ApiError::backend("Failed to store evaluation", e))?;

    tracing::info!(
        "Stored evaluation {} of agent {} with {} results",
        evaluation.id,
        evaluation.agent_id,
        results.len()
    );

    Ok(HttpResponse::Created().json(EvaluationResponse { evaluation, results }))
}

/// Evaluations with their agent, newest first
async fn list_evaluations(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let evaluations = state
        .backend
        .list_evaluations()
        .await
        .map_err(|e| ApiError::backend("Failed to load evaluations", e))?;

    Ok(HttpResponse::Ok().json(evaluations))
}

async fn get_evaluation(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let evaluation = state
        .backend
        .get_evaluation(path.into_inner())
        .await
        .map_err(|e| ApiError::backend("Failed to load evaluation", e))?;

    Ok(HttpResponse::Ok().json(evaluation))
}
