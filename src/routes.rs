use actix_web::web;

use crate::{auth, identity, notifications, partners, tasks, teams};

/// Route table, shared by the binary and the HTTP-level tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(auth::signup))
            .route("/login", web::post().to(auth::login))
            .route("/logout", web::post().to(auth::logout))
            .route("/reset_password", web::post().to(auth::reset_password)),
    )
    // USERS
    .service(
        web::scope("/users")
            .route("/find", web::get().to(identity::find_user))
            .route("/profile", web::put().to(identity::update_profile))
            .route("/purge", web::delete().to(identity::purge_user))
            .route("/{id}", web::get().to(identity::get_user_by_id))
            .route("/{id}/role", web::put().to(identity::update_role)),
    )
    // TEAMS
    .service(
        web::scope("/teams")
            .route("", web::post().to(teams::create_team))
            .route("/join", web::post().to(teams::join_team))
            .service(
                web::scope("/{team_id}")
                    .route("", web::get().to(teams::get_team))
                    .route("/members", web::get().to(teams::get_team_members))
                    .route("/activities", web::get().to(tasks::list_team_activities))
                    .service(
                        web::scope("/cleaning")
                            .route("", web::get().to(tasks::list_cleaning))
                            .route("", web::post().to(tasks::report_cleaning))
                            .route("/current", web::get().to(tasks::current_cleaning)),
                    ),
            ),
    )
    // TASKS
    .service(
        web::scope("/tasks")
            .route("", web::post().to(tasks::create_task))
            .route("/user/{user_id}", web::get().to(tasks::list_user_tasks))
            .route("/team/{team_id}", web::get().to(tasks::list_team_tasks))
            .route("/{task_id}", web::get().to(tasks::get_task))
            .route(
                "/{task_id}/status",
                web::put().to(tasks::update_task_status),
            ),
    )
    // PARTNER REQUESTS
    .service(
        web::scope("/partner_requests")
            .route("", web::post().to(partners::submit_request))
            .route("/mine", web::get().to(partners::list_my_requests))
            .route(
                "/team/{team_id}",
                web::get().to(partners::list_team_requests),
            )
            .route(
                "/{request_id}/review",
                web::post().to(partners::review_request),
            ),
    )
    // NOTIFICATIONS
    .service(
        web::scope("/notifications")
            .route("", web::get().to(notifications::list_notifications))
            .route(
                "/read_all",
                web::put().to(notifications::mark_all_notifications_read),
            )
            .route("/token", web::put().to(notifications::save_fcm_token))
            .route("/token", web::delete().to(notifications::clear_fcm_token))
            .route(
                "/settings",
                web::put().to(notifications::update_notification_settings),
            )
            .route(
                "/{id}/read",
                web::put().to(notifications::mark_notification_read),
            )
            .route("/{id}", web::delete().to(notifications::delete_notification)),
    );
}
