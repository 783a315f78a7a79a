use actix_web::{web, HttpResponse};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::*;
use crate::service::Forum;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/threads").route(web::post().to(create_thread)),
    )
    .service(
        web::resource("/threads/{threadId}").route(web::get().to(get_thread_detail)),
    )
    .service(
        web::resource("/threads/{threadId}/comments").route(web::post().to(create_comment)),
    )
    .service(
        web::resource("/threads/{threadId}/comments/{commentId}")
            .route(web::delete().to(delete_comment)),
    )
    .service(
        web::resource("/threads/{threadId}/comments/{commentId}/replies")
            .route(web::post().to(create_reply)),
    )
    .service(
        web::resource("/threads/{threadId}/comments/{commentId}/replies/{replyId}")
            .route(web::delete().to(delete_reply)),
    )
    .service(
        web::resource("/threads/{threadId}/comments/{commentId}/likes")
            .route(web::put().to(toggle_like)),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub forum: Forum,
}

#[utoipa::path(
    post,
    path = "/threads",
    request_body = NewThread,
    responses(
        (status = 201, description = "Thread created", body = AddedThread),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_thread(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewThread>,
) -> Result<HttpResponse, ApiError> {
    let thread = data.forum.add_thread(&auth.author(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(thread))
}

#[utoipa::path(
    get,
    path = "/threads/{threadId}",
    params(("threadId" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread with comments, replies and like counts", body = ThreadView),
        (status = 404, description = "Thread not found")
    )
)]
pub async fn get_thread_detail(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let view = data.forum.get_thread_detail(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/threads/{threadId}/comments",
    request_body = NewComment,
    params(("threadId" = String, Path, description = "Thread id")),
    responses(
        (status = 201, description = "Comment created", body = AddedComment),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Thread not found")
    )
)]
pub async fn create_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<NewComment>,
) -> Result<HttpResponse, ApiError> {
    let thread_id = path.into_inner();
    let comment = data
        .forum
        .add_comment(&auth.author(), &thread_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[utoipa::path(
    delete,
    path = "/threads/{threadId}/comments/{commentId}",
    params(
        ("threadId" = String, Path, description = "Thread id"),
        ("commentId" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment soft-deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the comment owner"),
        (status = 404, description = "Thread or comment not found")
    )
)]
pub async fn delete_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (thread_id, comment_id) = path.into_inner();
    data.forum
        .delete_comment(&auth.author(), &thread_id, &comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"status":"ok"})))
}

#[utoipa::path(
    post,
    path = "/threads/{threadId}/comments/{commentId}/replies",
    request_body = NewReply,
    params(
        ("threadId" = String, Path, description = "Thread id"),
        ("commentId" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 201, description = "Reply created", body = AddedReply),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Thread or comment not found")
    )
)]
pub async fn create_reply(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
    payload: web::Json<NewReply>,
) -> Result<HttpResponse, ApiError> {
    let (thread_id, comment_id) = path.into_inner();
    let reply = data
        .forum
        .add_reply(&auth.author(), &thread_id, &comment_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(reply))
}

#[utoipa::path(
    delete,
    path = "/threads/{threadId}/comments/{commentId}/replies/{replyId}",
    params(
        ("threadId" = String, Path, description = "Thread id"),
        ("commentId" = String, Path, description = "Comment id"),
        ("replyId" = String, Path, description = "Reply id")
    ),
    responses(
        (status = 200, description = "Reply soft-deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the reply owner"),
        (status = 404, description = "Thread, comment or reply not found")
    )
)]
pub async fn delete_reply(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (thread_id, comment_id, reply_id) = path.into_inner();
    data.forum
        .delete_reply(&auth.author(), &thread_id, &comment_id, &reply_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"status":"ok"})))
}

#[utoipa::path(
    put,
    path = "/threads/{threadId}/comments/{commentId}/likes",
    params(
        ("threadId" = String, Path, description = "Thread id"),
        ("commentId" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Like state flipped"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Thread or comment not found")
    )
)]
pub async fn toggle_like(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (thread_id, comment_id) = path.into_inner();
    let liked = data
        .forum
        .toggle_like(&auth.author(), &thread_id, &comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"status":"ok","liked":liked})))
}
