use wxmedia_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local file could not be read, created, or written.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The token provider could not supply an access token.
    #[error(transparent)]
    Token(#[from] wxmedia_token::Error),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("media API returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The platform answered with an `errcode`/`errmsg` payload.
    #[error("media API error: errcode={errcode} errmsg={errmsg}")]
    Api { errcode: i64, errmsg: String },

    #[error("invalid media API response: {message}")]
    InvalidResponse { message: String },

    #[error(transparent)]
    Template(#[from] wxmedia_common::TemplateError),

    #[error("{message}")]
    InvalidInput { message: String },
}

impl Error {
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Reading or writing a local file failed.
    #[must_use]
    pub fn is_local_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// No access token could be obtained.
    #[must_use]
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    /// The request reached (or tried to reach) the platform and failed there.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Api { .. } | Self::InvalidResponse { .. }
        )
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::InvalidInput { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

wxmedia_common::impl_context!();
