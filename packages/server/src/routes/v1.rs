use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{activity, event, participation};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/activities", activity_routes())
        .nest("/events", event_routes())
}

fn activity_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(activity::list_activities, activity::create_activity))
        .routes(routes!(
            activity::get_activity,
            activity::update_activity,
            activity::delete_activity
        ))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
        .routes(routes!(
            participation::join_event,
            participation::leave_event
        ))
        .routes(routes!(participation::list_participants))
}
