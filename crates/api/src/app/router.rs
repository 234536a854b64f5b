//! Resource router: compiles (prefix, lookup, basename, viewset) registrations into a
//! fixed route table and then into an axum `Router`.
//!
//! Every registration expands a set of route templates:
//!
//! - list route `/{prefix}` (`GET` → list, `POST` → create), named `{basename}-list`
//! - collection extra actions `/{prefix}/{url_path}`, named `{basename}-{url_name}`
//! - detail route `/{prefix}/{lookup}` (`GET` → retrieve, `PUT` → update,
//!   `PATCH` → partial_update, `DELETE` → destroy), named `{basename}-detail`
//! - detail extra actions `/{prefix}/{lookup}/{url_path}`
//!
//! Only verbs whose action the viewset supports are emitted. A `(path, verb)` pair or a
//! route name may be registered once, with paths compared by shape (placeholder names
//! ignored); anything else is a [`RouterError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::handler::Handler;
use axum::routing::{MethodFilter, MethodRouter, on};
use serde::Serialize;
use thiserror::Error;

/// HTTP verbs a route can bind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    fn method_filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Patch => MethodFilter::PATCH,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

impl core::fmt::Display for Verb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action a route resolves to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    PartialUpdate,
    Destroy,
    /// An extra action registered on the viewset, by name.
    Extra(&'static str),
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Create => "create",
            Action::Retrieve => "retrieve",
            Action::Update => "update",
            Action::PartialUpdate => "partial_update",
            Action::Destroy => "destroy",
            Action::Extra(name) => name,
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A static route template: which verbs map to which actions.
#[derive(Debug, Clone, Copy)]
pub struct RouteTemplate {
    pub mapping: &'static [(Verb, Action)],
    /// Name suffix, e.g. `list` in `{basename}-list`.
    pub suffix: &'static str,
    pub detail: bool,
}

const LIST_ROUTE: RouteTemplate = RouteTemplate {
    mapping: &[(Verb::Get, Action::List), (Verb::Post, Action::Create)],
    suffix: "list",
    detail: false,
};

const DETAIL_ROUTE: RouteTemplate = RouteTemplate {
    mapping: &[
        (Verb::Get, Action::Retrieve),
        (Verb::Put, Action::Update),
        (Verb::Patch, Action::PartialUpdate),
        (Verb::Delete, Action::Destroy),
    ],
    suffix: "detail",
    detail: true,
};

const READ_ONLY_LIST_ROUTE: RouteTemplate = RouteTemplate {
    mapping: &[(Verb::Get, Action::List)],
    suffix: "list",
    detail: false,
};

const READ_ONLY_DETAIL_ROUTE: RouteTemplate = RouteTemplate {
    mapping: &[(Verb::Get, Action::Retrieve)],
    suffix: "detail",
    detail: true,
};

/// Full CRUD routes.
pub const SIMPLE_ROUTES: [RouteTemplate; 2] = [LIST_ROUTE, DETAIL_ROUTE];

/// Only the two `GET` bindings.
pub const READ_ONLY_ROUTES: [RouteTemplate; 2] = [READ_ONLY_LIST_ROUTE, READ_ONLY_DETAIL_ROUTE];

/// An extra (non-CRUD) action on a viewset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraAction {
    pub name: &'static str,
    pub url_path: &'static str,
    /// `true`: `/{prefix}/{lookup}/{url_path}`; `false`: `/{prefix}/{url_path}`.
    pub detail: bool,
    pub verbs: &'static [Verb],
}

impl ExtraAction {
    pub const fn collection(name: &'static str, verbs: &'static [Verb]) -> Self {
        Self {
            name,
            url_path: name,
            detail: false,
            verbs,
        }
    }

    pub const fn detail(name: &'static str, verbs: &'static [Verb]) -> Self {
        Self {
            name,
            url_path: name,
            detail: true,
            verbs,
        }
    }

    /// Route name suffix: the action name with `_` replaced by `-`.
    pub fn url_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

type Binder = Arc<dyn Fn(MethodFilter) -> MethodRouter + Send + Sync>;

fn binder<H, T>(handler: H) -> Binder
where
    H: Handler<T, ()> + Sync,
    T: 'static,
{
    Arc::new(move |filter| on(filter, handler.clone()))
}

/// The actions a resource supports, each bound to its handler.
#[derive(Clone, Default)]
pub struct ViewSet {
    actions: BTreeMap<Action, Binder>,
    extras: Vec<(ExtraAction, Binder)>,
}

impl core::fmt::Debug for ViewSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewSet")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field(
                "extras",
                &self.extras.iter().map(|(e, _)| e).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ViewSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `handler`.
    pub fn action<H, T>(mut self, action: Action, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.actions.insert(action, binder(handler));
        self
    }

    /// Register an extra action served by `handler`.
    pub fn extra<H, T>(mut self, extra: ExtraAction, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.extras.push((extra, binder(handler)));
        self
    }

    pub fn supports(&self, action: Action) -> bool {
        self.actions.contains_key(&action)
            || self.extras.iter().any(|(e, _)| Action::Extra(e.name) == action)
    }
}

/// Startup-time routing configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("route {verb} {path} is registered twice")]
    DuplicateRoute { verb: Verb, path: String },

    #[error("route name `{name}` is already bound to {existing}")]
    DuplicateName { name: String, existing: String },

    #[error("route {path} matches the same requests as {existing} under another lookup name")]
    ConflictingLookup { path: String, existing: String },

    #[error("resource prefix must not be empty")]
    EmptyPrefix,
}

/// One compiled route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    /// Path relative to the mount point, with the lookup as `{name}`.
    pub path: String,
    pub verb: Verb,
    pub action: Action,
    pub detail: bool,
    pub name: String,
}

/// The compiled routes of a router, mounted under `mount`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    pub mount: String,
    pub descriptors: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Concrete path for a route name; `lookup` fills the lookup segment of detail routes.
    pub fn reverse(&self, name: &str, lookup: Option<&str>) -> Option<String> {
        let descriptor = self.descriptors.iter().find(|d| d.name == name)?;
        let mut path = String::with_capacity(self.mount.len() + descriptor.path.len());
        path.push_str(&self.mount);
        for segment in descriptor.path.split('/').skip(1) {
            path.push('/');
            if is_placeholder(segment) {
                path.push_str(lookup?);
            } else {
                path.push_str(segment);
            }
        }
        Some(path)
    }

    /// Whether route `name` binds `action` on some verb.
    pub fn serves(&self, name: &str, action: Action) -> bool {
        self.descriptors
            .iter()
            .any(|d| d.name == name && d.action == action)
    }

    /// Names in registration order, without repeats.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for d in &self.descriptors {
            if !names.contains(&d.name.as_str()) {
                names.push(&d.name);
            }
        }
        names
    }
}

/// Builds the route table from registrations.
pub struct ResourceRouter {
    templates: &'static [RouteTemplate],
    mount: String,
    routes: Vec<(RouteDescriptor, Binder)>,
}

impl ResourceRouter {
    /// Full CRUD router.
    pub fn simple(mount: impl Into<String>) -> Self {
        Self::with_templates(mount, &SIMPLE_ROUTES)
    }

    /// Router emitting only `list` and `retrieve`.
    pub fn read_only(mount: impl Into<String>) -> Self {
        Self::with_templates(mount, &READ_ONLY_ROUTES)
    }

    pub fn with_templates(mount: impl Into<String>, templates: &'static [RouteTemplate]) -> Self {
        Self {
            templates,
            mount: mount.into().trim_end_matches('/').to_string(),
            routes: Vec::new(),
        }
    }

    /// Expand one resource; returns the descriptors it added.
    pub fn register(
        &mut self,
        prefix: &str,
        lookup: &str,
        basename: &str,
        viewset: ViewSet,
    ) -> Result<Vec<RouteDescriptor>, RouterError> {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            return Err(RouterError::EmptyPrefix);
        }

        let list_path = format!("/{prefix}");
        let detail_path = format!("/{prefix}/{{{lookup}}}");

        let mut added: Vec<(RouteDescriptor, Binder)> = Vec::new();

        // List-level routes first, then detail-level, each followed by its extra actions.
        for detail in [false, true] {
            for template in self.templates.iter().filter(|t| t.detail == detail) {
                let path = if detail { &detail_path } else { &list_path };
                for (verb, action) in template.mapping {
                    if let Some(bind) = viewset.actions.get(action) {
                        added.push((
                            RouteDescriptor {
                                path: path.clone(),
                                verb: *verb,
                                action: *action,
                                detail,
                                name: format!("{basename}-{}", template.suffix),
                            },
                            bind.clone(),
                        ));
                    }
                }
            }

            for (extra, bind) in viewset.extras.iter().filter(|(e, _)| e.detail == detail) {
                let base = if detail { &detail_path } else { &list_path };
                for verb in extra.verbs {
                    added.push((
                        RouteDescriptor {
                            path: format!("{base}/{}", extra.url_path),
                            verb: *verb,
                            action: Action::Extra(extra.name),
                            detail,
                            name: format!("{basename}-{}", extra.url_name()),
                        },
                        bind.clone(),
                    ));
                }
            }
        }

        for (i, (candidate, _)) in added.iter().enumerate() {
            let existing = self
                .routes
                .iter()
                .map(|(d, _)| d)
                .chain(added[..i].iter().map(|(d, _)| d));
            let key = route_key(&candidate.path);
            for d in existing {
                let same_shape = route_key(&d.path) == key;
                if same_shape && d.verb == candidate.verb {
                    return Err(RouterError::DuplicateRoute {
                        verb: candidate.verb,
                        path: candidate.path.clone(),
                    });
                }
                if same_shape && d.path != candidate.path {
                    return Err(RouterError::ConflictingLookup {
                        path: candidate.path.clone(),
                        existing: d.path.clone(),
                    });
                }
                if d.name == candidate.name && !same_shape {
                    return Err(RouterError::DuplicateName {
                        name: candidate.name.clone(),
                        existing: d.path.clone(),
                    });
                }
            }
        }

        let descriptors = added.iter().map(|(d, _)| d.clone()).collect();
        self.routes.extend(added);
        Ok(descriptors)
    }

    pub fn table(&self) -> RouteTable {
        RouteTable {
            mount: self.mount.clone(),
            descriptors: self.routes.iter().map(|(d, _)| d.clone()).collect(),
        }
    }

    /// Compile into an axum router serving the routes under the mount point.
    pub fn into_router(self) -> Router {
        let mut by_path: Vec<(String, Vec<MethodRouter>)> = Vec::new();
        for (descriptor, bind) in self.routes {
            let method_router = bind(descriptor.verb.method_filter());
            match by_path.iter_mut().find(|(path, _)| *path == descriptor.path) {
                Some((_, routers)) => routers.push(method_router),
                None => by_path.push((descriptor.path, vec![method_router])),
            }
        }

        let mut router = Router::new();
        for (path, routers) in by_path {
            // Verbs on one path are disjoint (checked at registration), so merging cannot overlap.
            if let Some(method_router) = routers.into_iter().reduce(MethodRouter::merge) {
                router = router.route(&axum_path(&format!("{}{path}", self.mount)), method_router);
            }
        }
        router
    }
}

fn is_placeholder(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// Matching shape of a path: every placeholder becomes `{}`.
fn route_key(path: &str) -> String {
    path.split('/')
        .map(|segment| if is_placeholder(segment) { "{}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// `/subjects/{id}` → `/subjects/:id`.
fn axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_placeholder(segment) {
                format!(":{}", &segment[1..segment.len() - 1])
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
