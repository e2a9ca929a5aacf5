//! # エラー翻訳ミドルウェア
//!
//! ハンドラや抽出器が返した [`ApiError`](crate::error::ApiError) は、
//! 翻訳前の [`ErrorReply`] をレスポンスの extensions に残す。
//! このミドルウェアがそれを取り出し、`Accept-Language` で決めた言語の
//! [`ErrorResponse`](petstore_shared::ErrorResponse) にボディを差し替える。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::ErrorReply, i18n::I18n};

/// エラー応答のボディを要求言語に翻訳する
pub async fn localize_errors(
    State(i18n): State<Arc<I18n>>,
    request: Request,
    next: Next,
) -> Response {
    let language = i18n.language_from_headers(request.headers());
    let mut response = next.run(request).await;

    let Some(reply) = response.extensions_mut().remove::<ErrorReply>() else {
        return response;
    };

    let body = i18n.translate_error(&language, &reply);
    (response.status(), Json(body)).into_response()
}
