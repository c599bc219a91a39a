use chrono::Utc;
use ethers::providers::{Middleware, Provider, StreamExt, Ws};
use rand::Rng;
use sandwatch_core::error::{Error, Result};
use sandwatch_core::types::{PipelineStats, Transaction};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(60);

/// Mantém a assinatura de transações pendentes no node Ethereum,
/// reconectando com backoff exponencial e jitter completo. Registros
/// malformados são descartados, nunca fatais.
pub struct MempoolSubscriber {
    endpoint: String,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
}

impl MempoolSubscriber {
    pub fn new(endpoint: String, stats: Arc<PipelineStats>, shutdown: CancellationToken) -> Self {
        Self {
            endpoint,
            stats,
            shutdown,
        }
    }

    /// Consome a mempool até o sinal de shutdown, entregando cada transação
    /// completa no canal de saída. Ao retornar, o sender é liberado e o
    /// batcher enxerga o fim do stream.
    pub async fn run(self, out: mpsc::Sender<Transaction>) {
        let mut delay = BACKOFF_BASE;
        while !self.shutdown.is_cancelled() {
            match self.subscribe_once(&out, &mut delay).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(error = %e, "assinatura da mempool interrompida, reconectando");
                }
            }

            // jitter completo: qualquer ponto entre zero e o delay atual
            let jitter_ms = rand::thread_rng().gen_range(0..=delay.as_millis() as u64);
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(jitter_ms)) => {}
            }
            delay = (delay * 2).min(BACKOFF_CAP);
        }
        info!("subscriber da mempool encerrado");
    }

    async fn subscribe_once(
        &self,
        out: &mpsc::Sender<Transaction>,
        delay: &mut Duration,
    ) -> Result<()> {
        let ws = Ws::connect(&self.endpoint)
            .await
            .map_err(|e| Error::TransportError(format!("falha ao conectar via WebSocket: {}", e)))?;
        let provider = Provider::new(ws);
        let mut sub = provider
            .subscribe_pending_txs()
            .await
            .map_err(|e| Error::TransportError(format!("falha ao subscrever mempool: {}", e)))?;

        info!(endpoint = %self.endpoint, "assinatura de transações pendentes ativa");
        *delay = BACKOFF_BASE;

        loop {
            let hash = tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                next = sub.next() => match next {
                    Some(hash) => hash,
                    None => return Err(Error::TransportError("stream de assinatura encerrado".into())),
                },
            };

            match provider.get_transaction(hash).await {
                Ok(Some(tx)) => {
                    if let Some(record) = to_record(tx) {
                        self.stats.txs_observed.fetch_add(1, Ordering::Relaxed);
                        if out.send(record).await.is_err() {
                            // consumidor encerrou; nada mais a produzir
                            return Ok(());
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, tx = ?hash, "registro pendente ignorado"),
            }
        }
    }
}

/// Converte a transação do provider no registro interno. Transações sem
/// destinatário (criação de contrato) não interessam à análise.
fn to_record(tx: ethers::types::Transaction) -> Option<Transaction> {
    let to = tx.to?;
    Some(Transaction {
        hash: tx.hash,
        from: tx.from,
        to,
        input: tx.input.to_vec(),
        gas_price: tx.gas_price.unwrap_or_default(),
        value: tx.value,
        nonce: tx.nonce,
        observed_at: Utc::now().timestamp_millis() as u64,
    })
}
