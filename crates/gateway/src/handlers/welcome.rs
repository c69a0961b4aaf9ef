//! Gateway landing response.
//!
//! Served for `GET /` and for every path no proxy rule claims.

/// Plain-text body of the welcome response.
pub const WELCOME_MESSAGE: &str = "Welcome to the API Gateway";

pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_welcome() {
        assert_eq!(welcome().await, "Welcome to the API Gateway");
    }
}
