/*!
 * Sandwatch Types
 *
 * Tipos comuns usados em toda a workspace Sandwatch
 */

use crate::utils::{format_address, format_eth, format_h256};
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Alias para hash de transação
pub type TransactionHash = H256;

/// Identificador de pool: keccak(contrato ‖ par de tokens ordenado)
pub type PoolId = H256;

/// Transação pendente observada na mempool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: TransactionHash,
    pub from: Address,
    pub to: Address,
    pub input: Vec<u8>,
    pub gas_price: U256,
    pub value: U256,
    pub nonce: U256,
    /// Timestamp de chegada em milissegundos, atribuído pelo subscriber
    pub observed_at: u64,
}

/// Janela de transações selada pelo batcher, em ordem de chegada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub window_id: u64,
    /// Momento do selamento em segundos unix
    pub sealed_at: u64,
    pub txs: Vec<Transaction>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

/// Ataque sandwich identificado pelo detector dentro de uma janela
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub victim_tx: TransactionHash,
    pub frontrun_tx: TransactionHash,
    pub backrun_tx: TransactionHash,
    pub attacker: Address,
    pub pool: PoolId,
    /// Estimativa de lucro em wei; negativo é reportado como zero
    pub estimated_profit: U256,
    /// Segundos unix do selamento da janela de origem
    pub detected_at: u64,
}

/// Alerta serializado para o tópico de saída
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub victim_tx_hash: String,
    pub attacker: String,
    pub frontrun_tx_hash: String,
    pub backrun_tx_hash: String,
    pub profit_eth: String,
    pub timestamp: u64,
}

impl From<&Finding> for Alert {
    fn from(finding: &Finding) -> Self {
        Self {
            victim_tx_hash: format_h256(&finding.victim_tx),
            attacker: format_address(&finding.attacker),
            frontrun_tx_hash: format_h256(&finding.frontrun_tx),
            backrun_tx_hash: format_h256(&finding.backrun_tx),
            profit_eth: format_eth(&finding.estimated_profit),
            timestamp: finding.detected_at,
        }
    }
}

/// Contadores operacionais do pipeline, compartilhados entre os estágios
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub txs_observed: AtomicU64,
    pub batches_sealed: AtomicU64,
    pub batches_dropped: AtomicU64,
    pub findings_detected: AtomicU64,
    pub findings_deduplicated: AtomicU64,
    pub findings_rejected: AtomicU64,
    pub dedup_fail_open: AtomicU64,
    pub alerts_published: AtomicU64,
    pub alerts_lost: AtomicU64,
}

/// Leitura pontual dos contadores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub txs_observed: u64,
    pub batches_sealed: u64,
    pub batches_dropped: u64,
    pub findings_detected: u64,
    pub findings_deduplicated: u64,
    pub findings_rejected: u64,
    pub dedup_fail_open: u64,
    pub alerts_published: u64,
    pub alerts_lost: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            txs_observed: self.txs_observed.load(Ordering::Relaxed),
            batches_sealed: self.batches_sealed.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            findings_detected: self.findings_detected.load(Ordering::Relaxed),
            findings_deduplicated: self.findings_deduplicated.load(Ordering::Relaxed),
            findings_rejected: self.findings_rejected.load(Ordering::Relaxed),
            dedup_fail_open: self.dedup_fail_open.load(Ordering::Relaxed),
            alerts_published: self.alerts_published.load(Ordering::Relaxed),
            alerts_lost: self.alerts_lost.load(Ordering::Relaxed),
        }
    }
}
