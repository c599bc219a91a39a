use async_trait::async_trait;
use ethereum_types::Address;
use redis::aio::ConnectionManager;
use sandwatch_core::error::{Error, Result};
use sandwatch_core::traits::DedupStore;
use sandwatch_core::utils::format_address;
use std::time::Duration;

/// Cache de deduplicação por atacante sobre Redis.
///
/// O check-and-mark usa o `SET NX EX` nativo do Redis: a marcação é atômica
/// entre chamadores concorrentes e a expiração fica a cargo do próprio cache,
/// sem varredura manual.
pub struct RedisDedup {
    conn: ConnectionManager,
    ttl_secs: u64,
}

/// Chave namespaceada da marca de presença de um atacante
fn dedup_key(attacker: &Address) -> String {
    format!("sandwatch:attacker:{}", format_address(attacker))
}

impl RedisDedup {
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::CacheError(format!("URL do Redis inválida: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::CacheError(format!("falha ao conectar ao Redis: {}", e)))?;
        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
        })
    }
}

#[async_trait]
impl DedupStore for RedisDedup {
    async fn check_and_mark(&self, attacker: Address) -> Result<bool> {
        let reply: Option<String> = redis::cmd("SET")
            .arg(dedup_key(&attacker))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut self.conn.clone())
            .await
            .map_err(|e| Error::CacheError(format!("falha no check-and-mark: {}", e)))?;
        // OK = marca criada agora; nil = atacante já visto na janela de TTL
        Ok(reply.is_some())
    }
}
