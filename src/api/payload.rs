use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

use crate::utils::AppError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Corpo de requisição aceito em JSON ou `application/x-www-form-urlencoded`.
///
/// Falhas de leitura viram `AppError::Validation`; o handler decide a
/// mensagem genérica do endpoint.
pub struct UserPayload<T>(pub T);

impl<T> UserPayload<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

fn invalid_body(err: actix_web::Error) -> AppError {
    AppError::Validation(format!("Invalid request body: {}", err))
}

impl<T> FromRequest for UserPayload<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, AppError>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type() == FORM_CONTENT_TYPE {
            let form = web::Form::<T>::from_request(req, payload);
            Box::pin(async move { form.await.map(|f| UserPayload(f.into_inner())).map_err(invalid_body) })
        } else {
            let json = web::Json::<T>::from_request(req, payload);
            Box::pin(async move { json.await.map(|j| UserPayload(j.into_inner())).map_err(invalid_body) })
        }
    }
}
