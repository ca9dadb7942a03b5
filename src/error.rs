use thiserror::Error;

/// All errors that the crate can generate
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsingError(#[from] owned_ttf_parser::FaceParsingError),

    #[error(transparent)]
    /// [image] failed to parse or encode the image
    Image(#[from] image::ImageError),

    #[error(transparent)]
    /// The specification or configuration was not valid JSON
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    /// The HTTP client for remote bindings and images could not be built
    Fetch(#[from] crate::fetch::FetchError),

    #[error("the document specification is unusable: {0}")]
    /// The top-level document could not be interpreted at all
    Specification(String),

    #[error("table `{table}` was built for rendering without measured columns from the measurement pass")]
    /// A table body was built in the rendering pass without registry data from the measurement pass
    LayoutInvariant { table: String },

    #[error("unrenderable page geometry: {0}")]
    /// The page leaves no room for its body
    Geometry(String),

    #[error("failed to write output: {0}")]
    /// The rendered document could not be persisted
    Output(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
