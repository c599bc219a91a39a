use thiserror::Error;

/// Erros comuns da workspace Sandwatch
#[derive(Error, Debug)]
pub enum Error {
    /// Configuração ausente ou inválida; fatal na inicialização
    #[error("Erro de configuração: {0}")]
    ConfigError(String),

    /// Erro de transporte com o node Ethereum
    #[error("Erro de transporte: {0}")]
    TransportError(String),

    /// Erro de decodificação de calldata
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Erro de comunicação com o cache de deduplicação
    #[error("Erro de cache: {0}")]
    CacheError(String),

    /// Erro de consulta ao histórico (subgraph)
    #[error("Erro de validação: {0}")]
    ValidationError(String),

    /// Erro de publicação no broker
    #[error("Erro de publicação: {0}")]
    PublishError(String),

    /// Erro de timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

/// Tipo de resultado usado em toda a workspace
pub type Result<T> = std::result::Result<T, Error>;
