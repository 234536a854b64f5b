//! Which actions each resource exposes, and where it is mounted.

use quizdesk_schema::{Answer, Attempt, Question, Student, Subject, Testing};

use crate::app::handlers;
use crate::app::router::{Action, ExtraAction, ResourceRouter, RouteDescriptor, RouterError, Verb, ViewSet};

pub const RANDOM: ExtraAction = ExtraAction::collection("random", &[Verb::Get]);

pub fn subjects() -> ViewSet {
    ViewSet::new()
        .action(Action::List, handlers::list::<Subject>)
        .action(Action::Create, handlers::create::<Subject>)
        .action(Action::Retrieve, handlers::retrieve::<Subject>)
        .action(Action::Update, handlers::update::<Subject>)
        .action(Action::PartialUpdate, handlers::partial_update::<Subject>)
        .action(Action::Destroy, handlers::destroy::<Subject>)
        .extra(RANDOM, handlers::random::<Subject>)
}

pub fn answers() -> ViewSet {
    ViewSet::new()
        .action(Action::List, handlers::list::<Answer>)
        .action(Action::Create, handlers::create::<Answer>)
}

pub fn students() -> ViewSet {
    ViewSet::new()
        .action(Action::List, handlers::list::<Student>)
        .action(Action::Create, handlers::create::<Student>)
        .action(Action::PartialUpdate, handlers::partial_update::<Student>)
}

pub fn attempts() -> ViewSet {
    ViewSet::new()
        .action(Action::List, handlers::list::<Attempt>)
        .action(Action::Create, handlers::create::<Attempt>)
}

pub fn testings() -> ViewSet {
    ViewSet::new()
        .action(Action::List, handlers::list::<Testing>)
        .action(Action::Create, handlers::create::<Testing>)
        .action(Action::Retrieve, handlers::retrieve::<Testing>)
        .action(Action::Update, handlers::update::<Testing>)
        .action(Action::PartialUpdate, handlers::partial_update::<Testing>)
        .action(Action::Destroy, handlers::destroy::<Testing>)
}

pub fn questions() -> ViewSet {
    ViewSet::new()
        .action(Action::Retrieve, handlers::retrieve::<Question>)
        .action(Action::Update, handlers::update::<Question>)
        .action(Action::PartialUpdate, handlers::partial_update::<Question>)
        .action(Action::Destroy, handlers::destroy::<Question>)
}

/// Register the six resources; basenames are the singular model names.
pub fn register_all(router: &mut ResourceRouter) -> Result<Vec<RouteDescriptor>, RouterError> {
    let mut routes = Vec::new();
    routes.extend(router.register("subjects", "id", "subject", subjects())?);
    routes.extend(router.register("answers", "id", "answer", answers())?);
    routes.extend(router.register("students", "id", "student", students())?);
    routes.extend(router.register("attempts", "id", "attempt", attempts())?);
    routes.extend(router.register("testings", "id", "testing", testings())?);
    routes.extend(router.register("questions", "id", "question", questions())?);
    Ok(routes)
}
