/*!
 * Sandwatch Traits
 *
 * Traits comuns usados em toda a workspace Sandwatch
 */

use crate::error::Result;
use crate::types::Alert;
use async_trait::async_trait;
use ethereum_types::Address;

/// Trait para o cache de deduplicação de atacantes
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Marca o endereço com TTL se ainda não estiver presente.
    /// Retorna `true` no primeiro avistamento e `false` quando
    /// o endereço já foi visto dentro da janela de TTL.
    async fn check_and_mark(&self, attacker: Address) -> Result<bool>;
}

/// Trait para a fonte de atividade histórica de um endereço
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Conta os swaps recentes do endereço na fonte histórica
    async fn recent_swap_count(&self, address: Address) -> Result<u32>;
}

/// Trait para o destino de alertas confirmados
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Publica um alerta no tópico de saída
    async fn publish(&self, alert: &Alert) -> Result<()>;
}
