use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord};
use crate::domain::posts::DISPLAY_DATE_FORMAT;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const SITE_TITLE: &str = "Murmur";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let view = LayoutContext::new(chrome.with_title("Page not found"), ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Page-independent layout data: document title and the signed-in user, if shown.
#[derive(Clone)]
pub struct LayoutChrome {
    pub title: String,
    pub viewer: Option<String>,
}

impl LayoutChrome {
    /// Chrome without viewer-specific links, safe to share between users.
    pub fn anonymous() -> Self {
        Self {
            title: SITE_TITLE.to_string(),
            viewer: None,
        }
    }

    pub fn for_viewer(viewer: Option<&str>) -> Self {
        Self {
            title: SITE_TITLE.to_string(),
            viewer: viewer.map(str::to_string),
        }
    }

    pub fn with_title(self, title: impl AsRef<str>) -> Self {
        Self {
            title: format!("{} | {SITE_TITLE}", title.as_ref()),
            ..self
        }
    }
}

pub struct LayoutContext<T> {
    pub title: String,
    pub viewer: Option<String>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            title: chrome.title,
            viewer: chrome.viewer,
            content,
        }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub href: String,
    pub text: String,
    pub author: String,
    pub author_href: String,
    pub published: String,
    pub iso_date: String,
    pub group_title: Option<String>,
    pub group_href: Option<String>,
    pub image_url: Option<String>,
}

impl From<&PostRecord> for PostCard {
    fn from(post: &PostRecord) -> Self {
        Self {
            href: post_href(post),
            text: post.text.clone(),
            author: post.author_username.clone(),
            author_href: profile_href(&post.author_username),
            published: format_display_date(post.pub_date),
            iso_date: format_iso_date(post.pub_date),
            group_title: post.group_title.clone(),
            group_href: post.group_slug.as_deref().map(group_href),
            image_url: post.image.as_deref().map(|path| format!("/uploads/{path}")),
        }
    }
}

/// Numbered page links below a feed.
pub struct PaginatorView {
    pub number: u32,
    pub total_pages: u32,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl PaginatorView {
    pub fn new<T>(page: &Page<T>, base_path: &str) -> Self {
        let link = |number: u32| format!("{base_path}?page={number}");
        Self {
            number: page.number,
            total_pages: page.total_pages(),
            previous_href: page.previous_number().map(link),
            next_href: page.next_number().map(link),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.previous_href.is_some() || self.next_href.is_some()
    }
}

pub struct FeedContext {
    pub heading: String,
    pub description: Option<String>,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
    pub empty_message: String,
}

impl FeedContext {
    pub fn new(heading: impl Into<String>, page: &Page<PostRecord>, base_path: &str) -> Self {
        Self {
            heading: heading.into(),
            description: None,
            posts: page.items.iter().map(PostCard::from).collect(),
            paginator: PaginatorView::new(page, base_path),
            empty_message: "No posts yet.".to_string(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_empty_message(self, message: impl Into<String>) -> Self {
        Self {
            empty_message: message.into(),
            ..self
        }
    }

    pub fn has_posts(&self) -> bool {
        !self.posts.is_empty()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<()>,
    pub feed: FeedContext,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<()>,
    pub feed: FeedContext,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub view: LayoutContext<()>,
    pub feed: FeedContext,
}

/// What the profile page offers the viewer next to the author's name.
pub enum FollowControl {
    Hidden,
    Follow { href: String },
    Unfollow { href: String },
}

impl FollowControl {
    pub fn new(viewer: Option<&str>, author: &str, following: bool) -> Self {
        match viewer {
            None => FollowControl::Hidden,
            Some(viewer) if viewer == author => FollowControl::Hidden,
            Some(_) if following => FollowControl::Unfollow {
                href: format!("{}unfollow/", profile_href(author)),
            },
            Some(_) => FollowControl::Follow {
                href: format!("{}follow/", profile_href(author)),
            },
        }
    }

    pub fn follow_href(&self) -> Option<&str> {
        match self {
            FollowControl::Follow { href } => Some(href),
            _ => None,
        }
    }

    pub fn unfollow_href(&self) -> Option<&str> {
        match self {
            FollowControl::Unfollow { href } => Some(href),
            _ => None,
        }
    }
}

pub struct ProfileContext {
    pub username: String,
    pub post_count: u64,
    pub follower_count: u64,
    pub follow: FollowControl,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileContext>,
    pub feed: FeedContext,
}

pub struct CommentView {
    pub author: String,
    pub author_href: String,
    pub text: String,
    pub created: String,
}

impl From<&CommentRecord> for CommentView {
    fn from(comment: &CommentRecord) -> Self {
        Self {
            author: comment.author_username.clone(),
            author_href: profile_href(&comment.author_username),
            text: comment.text.clone(),
            created: format_display_date(comment.created),
        }
    }
}

pub struct PostDetailContext {
    pub post: PostCard,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub edit_href: Option<String>,
    pub delete_action: Option<String>,
    pub comment_action: Option<String>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct GroupChoice {
    pub slug: String,
    pub title: String,
    pub selected: bool,
}

pub struct PostFormContext {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupChoice>,
    pub current_image: Option<String>,
    pub errors: Vec<String>,
}

impl PostFormContext {
    pub fn create(groups: &[GroupRecord]) -> Self {
        Self {
            is_edit: false,
            action: "/create/".to_string(),
            text: String::new(),
            groups: group_choices(groups, None),
            current_image: None,
            errors: Vec::new(),
        }
    }

    pub fn edit(post: &PostRecord, groups: &[GroupRecord]) -> Self {
        Self {
            is_edit: true,
            action: format!("{}edit/", post_href(post)),
            text: post.text.clone(),
            groups: group_choices(groups, post.group_slug.as_deref()),
            current_image: post.image.as_deref().map(|path| format!("/uploads/{path}")),
            errors: Vec::new(),
        }
    }

    /// Keep the submitted values and report what was wrong with them.
    pub fn with_submission(
        self,
        text: &str,
        group_slug: Option<&str>,
        errors: Vec<String>,
    ) -> Self {
        let groups = self
            .groups
            .into_iter()
            .map(|choice| GroupChoice {
                selected: Some(choice.slug.as_str()) == group_slug,
                ..choice
            })
            .collect();
        Self {
            text: text.to_string(),
            groups,
            errors,
            ..self
        }
    }
}

#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

pub struct ErrorPageView {
    pub heading: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            heading: "Page not found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn post_href(post: &PostRecord) -> String {
    format!("/posts/{}/", post.id)
}

pub fn profile_href(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn group_href(slug: &str) -> String {
    format!("/group/{slug}/")
}

fn group_choices(groups: &[GroupRecord], selected: Option<&str>) -> Vec<GroupChoice> {
    groups
        .iter()
        .map(|group| GroupChoice {
            slug: group.slug.clone(),
            title: group.title.clone(),
            selected: Some(group.slug.as_str()) == selected,
        })
        .collect()
}

fn format_display_date(value: OffsetDateTime) -> String {
    value
        .format(DISPLAY_DATE_FORMAT)
        .unwrap_or_else(|_| format_iso_date(value))
}

fn format_iso_date(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}
