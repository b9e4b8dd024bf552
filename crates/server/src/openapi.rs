use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct SignupRequest { pub username: String, pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct GroupRequest { pub title: String, pub slug: String, pub description: Option<String> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::posts::index,
        crate::routes::posts::group_list,
        crate::routes::posts::profile,
        crate::routes::posts::post_detail,
        crate::routes::posts::create,
        crate::routes::posts::edit,
        crate::routes::groups::list,
        crate::routes::groups::create,
    ),
    components(
        schemas(
            HealthResponse,
            SignupRequest,
            LoginRequest,
            GroupRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "posts"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
