//! 路径参数提取器
//!
//! 只接受正整数 ID，其余一律返回 400。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn parse_positive_id(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req.match_info().get(name).unwrap_or_default();
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                format!("Invalid {name}: '{raw}'"),
            ));
            Err(InternalError::from_response(format!("invalid {name}"), response).into())
        }
    }
}

macro_rules! define_safe_id {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_id(req, $param).map($name))
            }
        }
    };
}

define_safe_id!(
    /// `{id}` 路径参数
    SafeIDI64,
    "id"
);
define_safe_id!(
    /// `{class_id}` 路径参数
    SafeClassIdI64,
    "class_id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_accepts_positive_id() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "42")
            .to_http_parts();
        let id = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id, SafeIDI64(42));
    }

    #[actix_web::test]
    async fn test_rejects_zero_negative_and_text() {
        for raw in ["0", "-3", "abc", ""] {
            let (req, mut payload) = TestRequest::default()
                .param("class_id", raw)
                .to_http_parts();
            assert!(
                SafeClassIdI64::from_request(&req, &mut payload)
                    .await
                    .is_err()
            );
        }
    }
}
