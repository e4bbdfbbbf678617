/// An error raised while opening an adapter from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or does not have the expected shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A graph adapter was configured without the URL of its endpoint.
    #[error("The {dialect} adapter requires an endpointUrl")]
    MissingEndpointUrl {
        /// The configured adapter type.
        dialect: &'static str,
    },
}
