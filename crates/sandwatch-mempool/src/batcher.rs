use chrono::Utc;
use sandwatch_core::types::{Batch, PipelineStats, Transaction};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Agrupa o stream de transações em janelas seladas por tamanho OU por
/// intervalo, o que vier primeiro. Janelas vazias não são emitidas.
///
/// Se o analisador ainda estiver ocupado quando uma nova janela selar, a
/// janela é descartada e contabilizada, nunca enfileirada.
pub struct Batcher {
    size: usize,
    interval: Duration,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
}

impl Batcher {
    pub fn new(
        size: usize,
        interval: Duration,
        stats: Arc<PipelineStats>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            size,
            interval,
            stats,
            shutdown,
        }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<Transaction>, out: mpsc::Sender<Batch>) {
        let mut buffer: Vec<Transaction> = Vec::with_capacity(self.size);
        let mut window_id = 0u64;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    // janela final, mesmo abaixo do limiar de tamanho
                    self.seal(&mut buffer, &mut window_id, &out);
                    break;
                }
                _ = ticker.tick() => {
                    self.seal(&mut buffer, &mut window_id, &out);
                }
                maybe = rx.recv() => match maybe {
                    Some(tx) => {
                        buffer.push(tx);
                        if buffer.len() >= self.size {
                            self.seal(&mut buffer, &mut window_id, &out);
                            ticker.reset();
                        }
                    }
                    None => {
                        self.seal(&mut buffer, &mut window_id, &out);
                        break;
                    }
                }
            }
        }
        info!("batcher encerrado");
    }

    fn seal(&self, buffer: &mut Vec<Transaction>, window_id: &mut u64, out: &mpsc::Sender<Batch>) {
        if buffer.is_empty() {
            return;
        }
        *window_id += 1;
        let batch = Batch {
            window_id: *window_id,
            sealed_at: Utc::now().timestamp() as u64,
            txs: std::mem::take(buffer),
        };
        self.stats.batches_sealed.fetch_add(1, Ordering::Relaxed);
        match out.try_send(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => {
                // análise ainda em curso; a janela é descartada, não enfileirada
                self.stats.batches_dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    window_id = batch.window_id,
                    txs = batch.txs.len(),
                    "janela descartada por backpressure"
                );
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Address, H256, U256};

    fn tx(n: u8) -> Transaction {
        Transaction {
            hash: H256::repeat_byte(n),
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            input: vec![],
            gas_price: U256::zero(),
            value: U256::zero(),
            nonce: U256::from(n),
            observed_at: n as u64,
        }
    }

    fn batcher(size: usize, interval_ms: u64, shutdown: &CancellationToken) -> Batcher {
        Batcher::new(
            size,
            Duration::from_millis(interval_ms),
            Arc::new(PipelineStats::default()),
            shutdown.clone(),
        )
    }

    #[tokio::test]
    async fn seals_on_size_threshold() {
        let shutdown = CancellationToken::new();
        let (tx_in, rx_in) = mpsc::channel(16);
        let (tx_out, mut rx_out) = mpsc::channel(4);
        let handle = tokio::spawn(batcher(3, 60_000, &shutdown).run(rx_in, tx_out));

        for n in 0..3 {
            tx_in.send(tx(n)).await.unwrap();
        }
        let batch = rx_out.recv().await.unwrap();
        assert_eq!(batch.window_id, 1);
        assert_eq!(batch.txs.len(), 3);
        // ordem de chegada preservada
        assert_eq!(batch.txs[0].hash, H256::repeat_byte(0));
        assert_eq!(batch.txs[2].hash, H256::repeat_byte(2));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn seals_on_interval() {
        let shutdown = CancellationToken::new();
        let (tx_in, rx_in) = mpsc::channel(16);
        let (tx_out, mut rx_out) = mpsc::channel(4);
        let handle = tokio::spawn(batcher(100, 50, &shutdown).run(rx_in, tx_out));

        tx_in.send(tx(1)).await.unwrap();
        let batch = rx_out.recv().await.unwrap();
        assert_eq!(batch.txs.len(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn empty_interval_emits_nothing() {
        let shutdown = CancellationToken::new();
        let (_tx_in, rx_in) = mpsc::channel::<Transaction>(16);
        let (tx_out, mut rx_out) = mpsc::channel(4);
        let handle = tokio::spawn(batcher(100, 20, &shutdown).run(rx_in, tx_out));

        tokio::time::sleep(Duration::from_millis(90)).await;
        shutdown.cancel();
        handle.await.unwrap();
        assert!(rx_out.recv().await.is_none());
    }

    #[tokio::test]
    async fn final_batch_sealed_on_shutdown() {
        let shutdown = CancellationToken::new();
        let (tx_in, rx_in) = mpsc::channel(16);
        let (tx_out, mut rx_out) = mpsc::channel(4);
        let handle = tokio::spawn(batcher(100, 60_000, &shutdown).run(rx_in, tx_out));

        tx_in.send(tx(7)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let batch = rx_out.recv().await.unwrap();
        assert_eq!(batch.txs.len(), 1);
        assert!(rx_out.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_downstream_drops_batch_and_counts() {
        let shutdown = CancellationToken::new();
        let stats = Arc::new(PipelineStats::default());
        let b = Batcher::new(
            2,
            Duration::from_secs(60),
            stats.clone(),
            shutdown.clone(),
        );
        let (tx_in, rx_in) = mpsc::channel(16);
        // capacidade 1: a segunda janela encontra o canal cheio
        let (tx_out, mut rx_out) = mpsc::channel(1);
        let handle = tokio::spawn(b.run(rx_in, tx_out));

        for n in 0..4 {
            tx_in.send(tx(n)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(stats.batches_sealed.load(Ordering::Relaxed), 2);
        assert_eq!(stats.batches_dropped.load(Ordering::Relaxed), 1);
        let delivered = rx_out.recv().await.unwrap();
        assert_eq!(delivered.window_id, 1);
        assert!(rx_out.recv().await.is_none());
    }

    #[tokio::test]
    async fn source_end_seals_remainder() {
        let shutdown = CancellationToken::new();
        let (tx_in, rx_in) = mpsc::channel(16);
        let (tx_out, mut rx_out) = mpsc::channel(4);
        let handle = tokio::spawn(batcher(100, 60_000, &shutdown).run(rx_in, tx_out));

        tx_in.send(tx(9)).await.unwrap();
        drop(tx_in);
        handle.await.unwrap();

        let batch = rx_out.recv().await.unwrap();
        assert_eq!(batch.txs.len(), 1);
    }
}
