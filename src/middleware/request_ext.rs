//! Request extension trait for extracting claims from HTTP requests.

use actix_web::HttpMessage;

use crate::models::Claims;

/// Access to the claims added by [`JwtAuth`](super::JwtAuth).
pub trait RequestExt {
    /// `Some(Claims)` for authenticated requests, `None` on public paths.
    fn get_claims(&self) -> Option<Claims>;
}

impl RequestExt for actix_web::HttpRequest {
    fn get_claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }
}
