use std::{io::ErrorKind, sync::Arc};

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, Query, State, multipart::MultipartError},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        feed::{FeedError, FeedService},
        follows::{FollowError, FollowService},
        pagination::PageNumber,
        posts::{
            AddCommentCommand, CreatePostCommand, EditPostCommand, ImageUpload, PostError,
            PostService,
        },
        repos::HealthRepo,
    },
    cache::{FeedPageCache, feed_cache_layer},
    domain::entities::PostRecord,
    infra::uploads::{UploadStorage, UploadStorageError},
    presentation::views::{
        FeedContext, FollowControl, FollowTemplate, GroupTemplate, IndexTemplate, LayoutChrome,
        LayoutContext, PostCard, PostDetailContext, PostDetailTemplate, PostFormContext,
        PostFormTemplate, ProfileContext, ProfileTemplate, post_href, profile_href,
        render_not_found_response, render_template_response,
    },
};

use super::{
    auth::{AuthContext, CurrentUser, Viewer},
    db_health_response, found,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub auth: AuthContext,
    pub health: Arc<dyn HealthRepo>,
    pub upload_storage: Arc<UploadStorage>,
    pub upload_limit_bytes: usize,
    /// Present when the global feed is served through the page cache.
    pub cache: Option<Arc<FeedPageCache>>,
}

impl FromRef<HttpState> for AuthContext {
    fn from_ref(state: &HttpState) -> Self {
        state.auth.clone()
    }
}

pub fn build_router(state: HttpState) -> Router {
    let index_route = Router::new().route("/", get(index));
    let index_route = match state.cache.clone() {
        Some(cache) => index_route.layer(middleware::from_fn_with_state(cache, feed_cache_layer)),
        None => index_route,
    };

    let upload_limit = DefaultBodyLimit::max(state.upload_limit_bytes);

    Router::new()
        .merge(index_route)
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/profile/{username}/follow/", get(profile_follow))
        .route("/profile/{username}/unfollow/", get(profile_unfollow))
        .route("/follow/", get(follow_index))
        .route(
            "/create/",
            get(post_create_form)
                .post(post_create)
                .layer(upload_limit.clone()),
        )
        .route("/posts/{post_id}/", get(post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(post_edit_form).post(post_edit).layer(upload_limit),
        )
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route("/posts/{post_id}/delete/", post(post_delete))
        .route("/uploads/{*path}", get(serve_upload))
        .route("/_health/db", get(public_health))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn number(&self) -> PageNumber {
        PageNumber::parse(self.page.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommentForm {
    text: String,
}

#[derive(Debug, Default)]
struct PostForm {
    text: String,
    group: Option<String>,
    image: Option<ImageUpload>,
}

/// The global feed. Rendered without viewer-specific content because the page
/// cache shares one copy between every reader.
async fn index(State(state): State<HttpState>, Query(query): Query<PageQuery>) -> Response {
    match state.feed.global(query.number()).await {
        Ok(page) => {
            let feed = FeedContext::new("Latest posts", &page, "/");
            let view = LayoutContext::new(LayoutChrome::anonymous(), ());
            render_template_response(IndexTemplate { view, feed }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn group_posts(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(viewer.username());

    match state.feed.group(&slug, query.number()).await {
        Ok(group_feed) => {
            let base_path = format!("/group/{}/", group_feed.group.slug);
            let feed = FeedContext::new(group_feed.group.title.clone(), &group_feed.page, &base_path)
                .with_description(group_feed.group.description.clone());
            let view = LayoutContext::new(chrome.with_title(&group_feed.group.title), ());
            render_template_response(GroupTemplate { view, feed }, StatusCode::OK)
        }
        Err(FeedError::UnknownGroup(_)) => render_not_found_response(chrome),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn profile(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(viewer.username());

    let author_feed = match state.feed.author(&username, query.number()).await {
        Ok(author_feed) => author_feed,
        Err(FeedError::UnknownAuthor(_)) => return render_not_found_response(chrome),
        Err(err) => return HttpError::from(err).into_response(),
    };

    let following = match viewer.0.as_ref() {
        Some(user) => match state.follows.is_following(user.id, author_feed.author.id).await {
            Ok(following) => following,
            Err(err) => return HttpError::from(err).into_response(),
        },
        None => false,
    };

    let author = author_feed.author.username.clone();
    let feed = FeedContext::new(
        format!("Posts by {author}"),
        &author_feed.page,
        &profile_href(&author),
    );
    let content = ProfileContext {
        follow: FollowControl::new(viewer.username(), &author, following),
        username: author.clone(),
        post_count: author_feed.post_count,
        follower_count: author_feed.follower_count,
    };
    let view = LayoutContext::new(chrome.with_title(&author), content);
    render_template_response(ProfileTemplate { view, feed }, StatusCode::OK)
}

async fn profile_follow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Response {
    match state.follows.follow(user.id, &username).await {
        Ok(_) | Err(FollowError::SelfFollow) => found(&profile_href(&username)),
        Err(FollowError::UnknownAuthor(_)) => {
            render_not_found_response(LayoutChrome::for_viewer(Some(&user.username)))
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn profile_unfollow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Response {
    match state.follows.unfollow(user.id, &username).await {
        Ok(_) => found(&profile_href(&username)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn follow_index(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.subscriptions(user.id, query.number()).await {
        Ok(page) => {
            let feed = FeedContext::new("Your subscriptions", &page, "/follow/")
                .with_empty_message("No posts from the authors you follow.");
            let chrome = LayoutChrome::for_viewer(Some(&user.username)).with_title("Subscriptions");
            let view = LayoutContext::new(chrome, ());
            render_template_response(FollowTemplate { view, feed }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(post_id): Path<String>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(viewer.username());
    let Some(post_id) = parse_post_id(&post_id) else {
        return render_not_found_response(chrome);
    };

    let detail = match state.posts.detail(post_id).await {
        Ok(detail) => detail,
        Err(PostError::NotFound) => return render_not_found_response(chrome),
        Err(err) => return HttpError::from(err).into_response(),
    };

    let post = &detail.post;
    let is_author = viewer
        .0
        .as_ref()
        .is_some_and(|user| user.id == post.author_id);
    let content = PostDetailContext {
        post: PostCard::from(post),
        author_post_count: detail.author_post_count,
        comments: detail.comments.iter().map(Into::into).collect(),
        edit_href: is_author.then(|| format!("{}edit/", post_href(post))),
        delete_action: is_author.then(|| format!("{}delete/", post_href(post))),
        comment_action: viewer
            .0
            .is_some()
            .then(|| format!("{}comment/", post_href(post))),
    };
    let view = LayoutContext::new(chrome.with_title(post.preview()), content);
    render_template_response(PostDetailTemplate { view }, StatusCode::OK)
}

async fn post_create_form(State(state): State<HttpState>, CurrentUser(user): CurrentUser) -> Response {
    let chrome = LayoutChrome::for_viewer(Some(&user.username)).with_title("New post");
    match state.posts.group_choices().await {
        Ok(groups) => render_post_form(chrome, PostFormContext::create(&groups), StatusCode::OK),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_create(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Response {
    let form = match read_post_form(multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };

    let command = CreatePostCommand {
        author_id: user.id,
        text: form.text.clone(),
        group_slug: form.group.clone(),
        image: form.image,
    };

    match state.posts.create_post(command).await {
        Ok(_) => found(&profile_href(&user.username)),
        Err(err) if err.is_validation() => {
            let chrome = LayoutChrome::for_viewer(Some(&user.username)).with_title("New post");
            match state.posts.group_choices().await {
                Ok(groups) => render_post_form(
                    chrome,
                    PostFormContext::create(&groups).with_submission(
                        &form.text,
                        form.group.as_deref(),
                        vec![err.to_string()],
                    ),
                    StatusCode::BAD_REQUEST,
                ),
                Err(err) => HttpError::from(err).into_response(),
            }
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_edit_form(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(Some(&user.username)).with_title("Edit post");
    let post = match load_post(&state, &post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => return render_not_found_response(chrome),
        Err(err) => return err.into_response(),
    };

    if post.author_id != user.id {
        return found(&post_href(&post));
    }

    match state.posts.group_choices().await {
        Ok(groups) => render_post_form(chrome, PostFormContext::edit(&post, &groups), StatusCode::OK),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_edit(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let chrome = LayoutChrome::for_viewer(Some(&user.username)).with_title("Edit post");
    let post = match load_post(&state, &post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => return render_not_found_response(chrome),
        Err(err) => return err.into_response(),
    };

    if post.author_id != user.id {
        return found(&post_href(&post));
    }

    let form = match read_post_form(multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };

    let command = EditPostCommand {
        post_id: post.id,
        editor_id: user.id,
        text: form.text.clone(),
        group_slug: form.group.clone(),
        image: form.image,
    };

    match state.posts.edit_post(command).await {
        Ok(updated) => found(&post_href(&updated)),
        Err(PostError::Forbidden) => found(&post_href(&post)),
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) if err.is_validation() => match state.posts.group_choices().await {
            Ok(groups) => render_post_form(
                chrome,
                PostFormContext::edit(&post, &groups).with_submission(
                    &form.text,
                    form.group.as_deref(),
                    vec![err.to_string()],
                ),
                StatusCode::BAD_REQUEST,
            ),
            Err(err) => HttpError::from(err).into_response(),
        },
        Err(err) => HttpError::from(err).into_response(),
    }
}

/// Authors land on their profile afterwards; anyone else is sent back to the post.
async fn post_delete(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(Some(&user.username));
    let post = match load_post(&state, &post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => return render_not_found_response(chrome),
        Err(err) => return err.into_response(),
    };

    match state.posts.delete_post(post.id, user.id).await {
        Ok(()) => found(&profile_href(&user.username)),
        Err(PostError::Forbidden) => found(&post_href(&post)),
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) => HttpError::from(err).into_response(),
    }
}

/// Invalid comments are dropped and the reader lands back on the post.
async fn add_comment(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(Some(&user.username));
    let Some(post_id) = parse_post_id(&post_id) else {
        return render_not_found_response(chrome);
    };

    let command = AddCommentCommand {
        post_id,
        author_id: user.id,
        text: form.text,
    };

    match state.posts.add_comment(command).await {
        Ok(_) => found(&format!("/posts/{post_id}/")),
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) if err.is_validation() => found(&format!("/posts/{post_id}/")),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn serve_upload(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_upload";

    match state.upload_storage.read(&path).await {
        Ok(bytes) => build_upload_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Upload not found",
            "The requested upload is not available",
        )
        .into_response(),
        Err(UploadStorageError::Io(err)) if err.kind() == ErrorKind::NotFound => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Upload not found",
            "The requested upload is not available",
        )
        .into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored upload"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                &err,
            )
            .into_response()
        }
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

async fn not_found(viewer: Viewer) -> Response {
    render_not_found_response(LayoutChrome::for_viewer(viewer.username()))
}

fn render_post_form(chrome: LayoutChrome, form: PostFormContext, status: StatusCode) -> Response {
    let view = LayoutContext::new(chrome, form);
    render_template_response(PostFormTemplate { view }, status)
}

fn parse_post_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

async fn load_post(state: &HttpState, raw_id: &str) -> Result<Option<PostRecord>, HttpError> {
    let Some(post_id) = parse_post_id(raw_id) else {
        return Ok(None);
    };
    match state.posts.find(post_id).await {
        Ok(post) => Ok(Some(post)),
        Err(PostError::NotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, HttpError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => form.text = field.text().await.map_err(multipart_error)?,
            Some("group") => {
                let value = field.text().await.map_err(multipart_error)?;
                form.group = Some(value.trim().to_string()).filter(|value| !value.is_empty());
            }
            Some("image") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|value| !value.is_empty());
                let data = field.bytes().await.map_err(multipart_error)?;
                // Browsers submit an empty part when no file was chosen.
                if let Some(file_name) = file_name.filter(|_| !data.is_empty()) {
                    form.image = Some(ImageUpload { file_name, data });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> HttpError {
    HttpError::from_error(
        "infra::http::public::read_post_form",
        StatusCode::BAD_REQUEST,
        "Invalid form submission",
        &err,
    )
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = bytes.into_response();
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM);
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
