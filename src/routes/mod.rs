pub mod health;
pub mod todos;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/todos")
                .wrap(AuthMiddleware)
                .service(todos::list_todos)
                .service(todos::create_todo)
                .service(todos::get_todo)
                .service(todos::update_todo)
                .service(todos::delete_todo),
        )
        .service(
            web::scope("/users")
                .service(
                    web::scope("/me")
                        .wrap(AuthMiddleware)
                        .service(users::me)
                        .service(users::logout),
                )
                .service(users::register)
                .service(users::login),
        );
}
