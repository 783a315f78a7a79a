use crate::models::{
    AddedComment, AddedReply, AddedThread, CommentView, NewComment, NewReply, NewThread,
    ReplyView, ThreadView,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::create_thread,
        crate::routes::get_thread_detail,
        crate::routes::create_comment,
        crate::routes::delete_comment,
        crate::routes::create_reply,
        crate::routes::delete_reply,
        crate::routes::toggle_like,
    ),
    components(schemas(
        NewThread, NewComment, NewReply,
        AddedThread, AddedComment, AddedReply,
        ThreadView, CommentView, ReplyView
    )),
    tags(
        (name = "threads", description = "Thread operations"),
        (name = "comments", description = "Comment operations"),
        (name = "replies", description = "Reply operations"),
        (name = "likes", description = "Comment like toggling"),
    )
)]
pub struct ApiDoc;
