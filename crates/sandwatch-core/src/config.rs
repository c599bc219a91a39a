/*!
 * Sandwatch Config
 *
 * Configuração da workspace carregada do ambiente
 */

use crate::error::{Error, Result};
use std::env;
use std::time::Duration;

/// Configuração completa do pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint WebSocket para a assinatura de transações pendentes
    pub wss_url: String,
    /// Endereço bootstrap do broker Kafka
    pub kafka_broker: String,
    /// Endpoint do cache Redis
    pub redis_url: String,
    /// Tópico de saída dos alertas
    pub kafka_topic: String,
    /// Limiar de tamanho da janela do batcher
    pub batch_size: usize,
    /// Intervalo de selamento da janela
    pub batch_interval: Duration,
    /// TTL da marca de deduplicação por atacante
    pub dedup_ttl: Duration,
    /// Endpoint do subgraph para validação histórica
    pub subgraph_url: String,
    /// Número mínimo de swaps históricos para confirmar um atacante
    pub min_swap_history: u32,
}

const DEFAULT_KAFKA_TOPIC: &str = "mev-alerts";
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_BATCH_INTERVAL_MS: u64 = 1000;
const DEFAULT_DEDUP_TTL_SECS: u64 = 300;
const DEFAULT_MIN_SWAP_HISTORY: u32 = 5;
const DEFAULT_SUBGRAPH_URL: &str =
    "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v2";

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::ConfigError(format!("variável {} é obrigatória", name)))
}

fn optional_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::ConfigError(format!("valor inválido para {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Carrega a configuração do ambiente. Variáveis obrigatórias ausentes
    /// abortam a inicialização.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            wss_url: required("WSS_URL")?,
            kafka_broker: required("KAFKA_BROKER")?,
            redis_url: required("REDIS_URL")?,
            kafka_topic: env::var("KAFKA_TOPIC").unwrap_or_else(|_| DEFAULT_KAFKA_TOPIC.into()),
            batch_size: optional_parsed("BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            batch_interval: Duration::from_millis(optional_parsed(
                "BATCH_INTERVAL_MS",
                DEFAULT_BATCH_INTERVAL_MS,
            )?),
            dedup_ttl: Duration::from_secs(optional_parsed(
                "DEDUP_TTL_SECS",
                DEFAULT_DEDUP_TTL_SECS,
            )?),
            subgraph_url: env::var("SUBGRAPH_URL").unwrap_or_else(|_| DEFAULT_SUBGRAPH_URL.into()),
            min_swap_history: optional_parsed("MIN_SWAP_HISTORY", DEFAULT_MIN_SWAP_HISTORY)?,
        })
    }
}
