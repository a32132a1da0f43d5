#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (offline, CORS, DNS).
    Network(String),
    /// The server answered with a non-2xx status.
    Status { code: u16, body: String },
    /// The body was not the JSON shape we expected.
    Decode(String),
    /// The server answered `success: false`.
    Rejected(String),
}

impl ApiError {
    pub fn rejected(error: Option<String>) -> Self {
        ApiError::Rejected(error.unwrap_or_else(|| "Unknown error".to_string()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Status { code, .. } => write!(f, "HTTP error! status: {code}"),
            ApiError::Decode(msg) => write!(f, "invalid response: {msg}"),
            ApiError::Rejected(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}
