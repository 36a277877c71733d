use serde::Serialize;

/// `{ success: true, content }` envelope shared by the catalog endpoints.
#[derive(Debug, Serialize)]
pub struct ContentResponse<T> {
    pub success: bool,
    pub content: T,
}

impl<T> ContentResponse<T> {
    pub fn ok(content: T) -> Self {
        Self {
            success: true,
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
