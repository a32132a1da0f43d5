#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    MissingApiKey,
    MapNotReady,
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::MissingApiKey => write!(f, "OpenWeatherMap API key is not configured"),
            LayerError::MapNotReady => write!(f, "map is not initialized"),
        }
    }
}

impl std::error::Error for LayerError {}
