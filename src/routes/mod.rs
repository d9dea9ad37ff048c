//! Route table and router assembly.
//!
//! [`ROUTES`] is the single ordered declaration of what the server answers.
//! [`resolve`] reads it as a pure first-match lookup (used for request spans
//! and tests) and [`build`] mounts the same entries, in the same order, onto
//! an Axum router. Entries never overlap, so Axum's own matching agrees with
//! first-match resolution.

use axum::{
    http::Method,
    middleware,
    routing::{get, get_service, post},
    Router,
};
use tower_http::services::ServeFile;

use crate::handlers::protected::{folders, forms, submissions, user_content};
use crate::handlers::public::{assets, auth, chatbot, system};
use crate::middleware::jwt_auth_middleware;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// GET, and HEAD which Axum answers from the GET handler.
    Get,
    Post,
    Any,
}

impl Verb {
    fn admits(self, method: &Method) -> bool {
        match self {
            Verb::Get => method == Method::GET || method == Method::HEAD,
            Verb::Post => method == Method::POST,
            Verb::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    /// Segment-for-segment, `:name` segments capture.
    Exact,
    /// The pattern itself or anything below it.
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    StyleAssets,
    ScriptAssets,
    RenderChatbot,
    SubmitResponse,
    FormDefinition,
    GenerateUniqueId,
    Uptime,
    Index,
    ServerIsOn,
    Auth,
    Forms,
    Folders,
    Submissions,
    UserContent,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::StyleAssets => "assets.styles",
            Capability::ScriptAssets => "assets.scripts",
            Capability::RenderChatbot => "chatbot.render",
            Capability::SubmitResponse => "chatbot.submit_response",
            Capability::FormDefinition => "chatbot.form_definition",
            Capability::GenerateUniqueId => "chatbot.generate_unique_id",
            Capability::Uptime => "system.uptime",
            Capability::Index => "system.index",
            Capability::ServerIsOn => "system.server_is_on",
            Capability::Auth => "auth",
            Capability::Forms => "forms",
            Capability::Folders => "folders",
            Capability::Submissions => "submissions",
            Capability::UserContent => "user_content",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub verb: Verb,
    pub pattern: &'static str,
    pub matching: PathMatch,
    pub capability: Capability,
}

const fn exact(verb: Verb, pattern: &'static str, capability: Capability) -> RouteEntry {
    RouteEntry {
        verb,
        pattern,
        matching: PathMatch::Exact,
        capability,
    }
}

const fn prefix(pattern: &'static str, capability: Capability) -> RouteEntry {
    RouteEntry {
        verb: Verb::Any,
        pattern,
        matching: PathMatch::Prefix,
        capability,
    }
}

pub const ROUTES: &[RouteEntry] = &[
    prefix("/styles", Capability::StyleAssets),
    prefix("/scripts", Capability::ScriptAssets),
    exact(Verb::Get, "/chat/:formId", Capability::RenderChatbot),
    exact(Verb::Post, "/api/submit-response", Capability::SubmitResponse),
    exact(Verb::Get, "/api/form/:formId", Capability::FormDefinition),
    exact(Verb::Get, "/api/generate-unique-id/:formId", Capability::GenerateUniqueId),
    exact(Verb::Get, "/api/uptime", Capability::Uptime),
    exact(Verb::Get, "/", Capability::Index),
    exact(Verb::Get, "/serverison", Capability::ServerIsOn),
    prefix("/api/auth", Capability::Auth),
    prefix("/api/forms", Capability::Forms),
    prefix("/api/folders", Capability::Folders),
    prefix("/api/submissions", Capability::Submissions),
    prefix("/api/user", Capability::UserContent),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub capability: Capability,
    pub params: Vec<(&'static str, String)>,
}

impl Resolved {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

fn match_exact(pattern: &'static str, path: &str) -> Option<Vec<(&'static str, String)>> {
    let mut params = Vec::new();
    let mut wanted = segments(pattern);
    let mut given = segments(path);

    loop {
        match (wanted.next(), given.next()) {
            (None, None) => return Some(params),
            (Some(w), Some(g)) => {
                if let Some(name) = w.strip_prefix(':') {
                    if g.is_empty() {
                        return None;
                    }
                    params.push((name, g.to_string()));
                } else if w != g {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

fn match_prefix(pattern: &str, path: &str) -> bool {
    match path.strip_prefix(pattern) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// First entry of [`ROUTES`] accepting `method` on `path`.
pub fn resolve(method: &Method, path: &str) -> Option<Resolved> {
    ROUTES.iter().find_map(|entry| {
        if !entry.verb.admits(method) {
            return None;
        }
        let params = match entry.matching {
            PathMatch::Exact => match_exact(entry.pattern, path)?,
            PathMatch::Prefix if match_prefix(entry.pattern, path) => Vec::new(),
            PathMatch::Prefix => return None,
        };
        Some(Resolved {
            capability: entry.capability,
            params,
        })
    })
}

/// Mount every entry of [`ROUTES`] in declaration order.
pub fn build(state: &AppState) -> Router<AppState> {
    ROUTES.iter().fold(Router::new(), |router, entry| mount(router, entry, state))
}

fn mount(router: Router<AppState>, entry: &RouteEntry, state: &AppState) -> Router<AppState> {
    let public_dir = &state.config.server.public_dir;

    match entry.capability {
        Capability::StyleAssets => router.nest_service(entry.pattern, assets::styles(public_dir)),
        Capability::ScriptAssets => router.nest_service(entry.pattern, assets::scripts(public_dir)),
        Capability::RenderChatbot => router.route(entry.pattern, get(chatbot::render_chatbot)),
        Capability::SubmitResponse => router.route(entry.pattern, post(chatbot::submit_response)),
        Capability::FormDefinition => router.route(entry.pattern, get(chatbot::form_definition)),
        Capability::GenerateUniqueId => router.route(entry.pattern, get(chatbot::generate_unique_id)),
        Capability::Uptime => router.route(entry.pattern, get(system::uptime)),
        Capability::Index => {
            router.route(entry.pattern, get_service(ServeFile::new(public_dir.join("index.html"))))
        }
        Capability::ServerIsOn => router.route(entry.pattern, get(system::server_is_on)),
        Capability::Auth => router.nest(entry.pattern, auth_routes(state)),
        Capability::Forms => router.nest(entry.pattern, protected(state, form_routes())),
        Capability::Folders => router.nest(entry.pattern, protected(state, folder_routes())),
        Capability::Submissions => router.nest(entry.pattern, protected(state, submission_routes())),
        Capability::UserContent => router.nest(entry.pattern, protected(state, user_content_routes())),
    }
}

fn protected(state: &AppState, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Token acquisition
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Session introspection for authenticated users
        .merge(protected(state, Router::new().route("/me", get(auth::me))))
}

fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(forms::list_forms).post(forms::create_form))
        .route(
            "/:id",
            get(forms::get_form).put(forms::update_form).delete(forms::delete_form),
        )
}

fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(folders::list_folders).post(folders::create_folder))
        .route(
            "/:id",
            get(folders::get_folder)
                .put(folders::update_folder)
                .delete(folders::delete_folder),
        )
}

fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/form/:formId", get(submissions::list_form_submissions))
        .route(
            "/:id",
            get(submissions::get_submission).delete(submissions::delete_submission),
        )
}

fn user_content_routes() -> Router<AppState> {
    Router::new()
        .route("/content", get(user_content::get_content))
        .route(
            "/profile",
            get(user_content::get_profile).put(user_content::update_profile),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability(method: Method, path: &str) -> Option<Capability> {
        resolve(&method, path).map(|r| r.capability)
    }

    #[test]
    fn chat_path_resolves_to_render() {
        let resolved = resolve(&Method::GET, "/chat/abc123").unwrap();
        assert_eq!(resolved.capability, Capability::RenderChatbot);
        assert_eq!(resolved.param("formId"), Some("abc123"));
    }

    #[test]
    fn chatbot_endpoints_resolve_directly() {
        assert_eq!(capability(Method::POST, "/api/submit-response"), Some(Capability::SubmitResponse));
        assert_eq!(capability(Method::GET, "/api/form/f1"), Some(Capability::FormDefinition));
        assert_eq!(
            capability(Method::GET, "/api/generate-unique-id/f1"),
            Some(Capability::GenerateUniqueId)
        );
    }

    #[test]
    fn singular_form_does_not_fall_into_forms_group() {
        assert_eq!(capability(Method::GET, "/api/forms"), Some(Capability::Forms));
        assert_eq!(capability(Method::GET, "/api/forms/f1"), Some(Capability::Forms));
        assert_eq!(capability(Method::GET, "/api/form/f1"), Some(Capability::FormDefinition));
        assert_eq!(capability(Method::GET, "/api/formsx"), None);
    }

    #[test]
    fn user_prefix_is_segment_bounded() {
        assert_eq!(capability(Method::GET, "/api/user/content"), Some(Capability::UserContent));
        assert_eq!(capability(Method::GET, "/api/users"), None);
    }

    #[test]
    fn inline_routes() {
        assert_eq!(capability(Method::GET, "/"), Some(Capability::Index));
        assert_eq!(capability(Method::GET, "/api/uptime"), Some(Capability::Uptime));
        assert_eq!(capability(Method::HEAD, "/serverison"), Some(Capability::ServerIsOn));
    }

    #[test]
    fn verbs_are_respected() {
        assert_eq!(capability(Method::GET, "/api/submit-response"), None);
        assert_eq!(capability(Method::POST, "/chat/abc123"), None);
        assert_eq!(capability(Method::DELETE, "/api/folders/x"), Some(Capability::Folders));
    }

    #[test]
    fn empty_or_extra_segments_do_not_match() {
        assert_eq!(capability(Method::GET, "/chat/"), None);
        assert_eq!(capability(Method::GET, "/chat/a/b"), None);
        assert_eq!(capability(Method::GET, "/nowhere"), None);
    }

    #[test]
    fn assets_match_any_depth() {
        assert_eq!(capability(Method::GET, "/styles/chatbot.css"), Some(Capability::StyleAssets));
        assert_eq!(capability(Method::GET, "/scripts/vendor/lib.txt"), Some(Capability::ScriptAssets));
    }

    #[test]
    fn table_has_no_duplicate_patterns() {
        let mut patterns: Vec<_> = ROUTES.iter().map(|r| r.pattern).collect();
        patterns.sort_unstable();
        patterns.dedup();
        assert_eq!(patterns.len(), ROUTES.len());
    }
}
