use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),
    #[error("auth reject: {0}")]
    AuthReject(String),
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("no privacy rule matched")]
    NoMatch,
    #[error("encrypt failed: {0}")]
    EncryptFail(String),
    #[error("broker publish failed: {0}")]
    BrokerPublishFail(String),
    #[error("upstream registration failed: {0}")]
    UpstreamRegisterFail(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}
