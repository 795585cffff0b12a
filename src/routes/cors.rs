use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    http::Method,
    middleware::Next,
    web, Error, HttpResponse,
};

use crate::config::AppConfig;

pub async fn cors_handler<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody,
{
    let allow_origin = req
        .app_data::<web::Data<AppConfig>>()
        .and_then(|config| HeaderValue::from_str(&config.cors_allow_origin).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut res = if req.method() == Method::OPTIONS {
        let res = HttpResponse::NoContent().finish().map_into_right_body();
        req.into_response(res)
    } else {
        next.call(req).await?.map_into_left_body()
    };

    let headers = res.headers_mut();
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        allow_origin,
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("86400"),
    );

    Ok(res)
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};

    use super::cors_handler;
    use crate::config::AppConfig;

    #[actix_web::test]
    async fn preflight_is_answered_with_configured_origin() {
        let config = AppConfig {
            cors_allow_origin: "https://holonet.example".to_string(),
            ..AppConfig::for_tests()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .wrap(actix_web::middleware::from_fn(cors_handler))
                .route("/planets", web::get().to(|| async { "ok" })),
        )
        .await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/planets")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "https://holonet.example"
        );

        let req = test::TestRequest::get().uri("/planets").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("access-control-allow-methods"));
    }
}
