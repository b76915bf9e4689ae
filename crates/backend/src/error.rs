use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

/// Message returned to API callers when the backend gave no usable one.
pub const GENERIC_BACKEND_MESSAGE: &str = "Failed to fetch data from backend";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request to {source_name} failed: {error}")]
    Http {
        source_name: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("{source_name} returned {status}: {message}")]
    Upstream {
        source_name: String,
        status: u16,
        message: String,
    },

    #[error("unexpected row shape from {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("backend not configured: {0}")]
    NotConfigured(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn decode(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        BackendError::Decode {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Text that may be shown to API callers. Upstream messages are passed
    /// through; transport and database details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            BackendError::Upstream { message, .. } if !message.is_empty() => message.clone(),
            BackendError::NotConfigured(what) => format!("{what} is not configured"),
            BackendError::Unavailable(what) => format!("{what} is unavailable"),
            _ => GENERIC_BACKEND_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_passes_upstream_text_only() {
        let upstream = BackendError::Upstream {
            source_name: "rpc/get_kpi_metrics".into(),
            status: 400,
            message: "function get_kpi_metrics does not exist".into(),
        };
        assert_eq!(
            upstream.public_message(),
            "function get_kpi_metrics does not exist"
        );

        let decode = BackendError::decode("campaigns", "missing field `emails_sent`");
        assert_eq!(decode.public_message(), GENERIC_BACKEND_MESSAGE);
    }
}
