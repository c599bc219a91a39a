use parking_lot::Mutex;
use sandwatch_alerts::{KafkaPublisher, RedisDedup, SubgraphValidator};
use sandwatch_core::config::Config;
use sandwatch_core::error::Error;
use sandwatch_core::traits::{ActivitySource, AlertSink, DedupStore};
use sandwatch_core::types::{Alert, Batch, Finding, PipelineStats};
use sandwatch_mempool::{Batcher, MempoolSubscriber};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timeout da consulta de validação histórica
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(3);
/// Tolerância de drenagem das janelas em voo no encerramento
const DRAIN_GRACE: Duration = Duration::from_secs(10);
/// Intervalo mínimo entre warns de cache indisponível
const CACHE_WARN_THROTTLE: Duration = Duration::from_secs(30);
/// Período do log de estatísticas operacionais
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Capacidade do canal subscriber → batcher
const TX_CHANNEL_CAPACITY: usize = 1024;

/// Estágio de análise: consome janelas seladas, detecta sandwiches,
/// deduplica por atacante, valida contra o histórico e publica os
/// confirmados.
///
/// Cache de dedup indisponível segue fail-open; fonte histórica
/// indisponível segue fail-closed.
pub struct Pipeline {
    dedup: Arc<dyn DedupStore>,
    activity: Arc<dyn ActivitySource>,
    sink: Arc<dyn AlertSink>,
    min_swap_history: u32,
    stats: Arc<PipelineStats>,
    last_cache_warn: Mutex<Option<Instant>>,
}

impl Pipeline {
    pub fn new(
        dedup: Arc<dyn DedupStore>,
        activity: Arc<dyn ActivitySource>,
        sink: Arc<dyn AlertSink>,
        min_swap_history: u32,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            dedup,
            activity,
            sink,
            min_swap_history,
            stats,
            last_cache_warn: Mutex::new(None),
        }
    }

    /// Consome janelas até o canal fechar. Uma janela por vez: o batcher
    /// descarta janelas novas enquanto esta análise estiver em curso.
    pub async fn run(self, mut rx: mpsc::Receiver<Batch>) {
        while let Some(batch) = rx.recv().await {
            self.process_batch(batch).await;
        }
        info!("pipeline de análise encerrado");
    }

    async fn process_batch(&self, batch: Batch) {
        let findings = sandwatch_detector::detect(&batch);
        if findings.is_empty() {
            return;
        }
        self.stats
            .findings_detected
            .fetch_add(findings.len() as u64, Ordering::Relaxed);
        info!(
            window_id = batch.window_id,
            findings = findings.len(),
            "padrões sandwich identificados na janela"
        );
        for finding in findings {
            self.process_finding(finding).await;
        }
    }

    async fn process_finding(&self, finding: Finding) {
        let first_seen = match self.dedup.check_and_mark(finding.attacker).await {
            Ok(first_seen) => first_seen,
            Err(e) => {
                self.stats.dedup_fail_open.fetch_add(1, Ordering::Relaxed);
                self.warn_cache_unavailable(&e);
                true
            }
        };
        if !first_seen {
            self.stats
                .findings_deduplicated
                .fetch_add(1, Ordering::Relaxed);
            debug!(attacker = ?finding.attacker, "atacante já alertado na janela de TTL");
            return;
        }

        match self.activity.recent_swap_count(finding.attacker).await {
            Ok(count) if count > self.min_swap_history => {
                debug!(attacker = ?finding.attacker, count, "histórico confirma atacante recorrente");
            }
            Ok(count) => {
                self.stats.findings_rejected.fetch_add(1, Ordering::Relaxed);
                info!(
                    attacker = ?finding.attacker,
                    count,
                    "achado descartado por histórico insuficiente"
                );
                return;
            }
            Err(e) => {
                self.stats.findings_rejected.fetch_add(1, Ordering::Relaxed);
                info!(error = %e, "achado descartado: fonte histórica indisponível");
                return;
            }
        }

        let alert = Alert::from(&finding);
        match self.sink.publish(&alert).await {
            Ok(()) => {
                self.stats.alerts_published.fetch_add(1, Ordering::Relaxed);
                info!(
                    attacker = %alert.attacker,
                    victim = %alert.victim_tx_hash,
                    profit_eth = %alert.profit_eth,
                    "alerta publicado"
                );
            }
            Err(e) => {
                self.stats.alerts_lost.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "alerta perdido após esgotar retentativas");
            }
        }
    }

    fn warn_cache_unavailable(&self, e: &Error) {
        let mut last = self.last_cache_warn.lock();
        let now = Instant::now();
        if last.map_or(true, |t| now.duration_since(t) >= CACHE_WARN_THROTTLE) {
            *last = Some(now);
            warn!(error = %e, "cache de deduplicação indisponível, seguindo fail-open");
        }
    }
}

/// Supervisor do serviço: inicializa clientes em ordem de dependência,
/// liga os estágios e conduz o encerramento gracioso.
pub struct Supervisor;

impl Supervisor {
    pub async fn run(config: Config) -> anyhow::Result<()> {
        let stats = Arc::new(PipelineStats::default());
        let shutdown = CancellationToken::new();

        // Clientes externos primeiro: falha aqui aborta a inicialização
        let dedup = Arc::new(RedisDedup::connect(&config.redis_url, config.dedup_ttl).await?);
        let validator = Arc::new(SubgraphValidator::new(
            &config.subgraph_url,
            VALIDATION_TIMEOUT,
        )?);
        let publisher = Arc::new(KafkaPublisher::new(&config.kafka_broker, &config.kafka_topic)?);

        let pipeline = Pipeline::new(
            dedup,
            validator,
            publisher.clone(),
            config.min_swap_history,
            stats.clone(),
        );

        let (tx_txs, rx_txs) = mpsc::channel(TX_CHANNEL_CAPACITY);
        // capacidade 1: uma janela em análise por vez, novas janelas são
        // descartadas pelo batcher
        let (tx_batches, rx_batches) = mpsc::channel(1);

        let subscriber = MempoolSubscriber::new(
            config.wss_url.clone(),
            stats.clone(),
            shutdown.clone(),
        );
        let batcher = Batcher::new(
            config.batch_size,
            config.batch_interval,
            stats.clone(),
            shutdown.clone(),
        );

        let subscriber_handle = tokio::spawn(subscriber.run(tx_txs));
        let batcher_handle = tokio::spawn(batcher.run(rx_txs, tx_batches));
        let pipeline_handle = tokio::spawn(pipeline.run(rx_batches));

        // Log periódico dos contadores operacionais
        let stats_task = {
            let stats = stats.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(STATS_INTERVAL);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = ticker.tick() => {
                            info!(stats = ?stats.snapshot(), "estatísticas do pipeline");
                        }
                    }
                }
            })
        };

        info!("sandwatch em operação, aguardando sinal de encerramento");
        tokio::signal::ctrl_c().await?;
        info!("sinal recebido, iniciando encerramento");
        shutdown.cancel();

        // Drena as janelas em voo dentro da tolerância
        let drain = async {
            let _ = subscriber_handle.await;
            let _ = batcher_handle.await;
            let _ = pipeline_handle.await;
        };
        match tokio::time::timeout(DRAIN_GRACE, drain).await {
            Ok(()) => info!("drenagem concluída"),
            Err(_) => warn!(
                grace_secs = DRAIN_GRACE.as_secs(),
                "tempo de drenagem excedido, forçando encerramento"
            ),
        }
        let _ = stats_task.await;

        // Fecha as conexões na ordem inversa da inicialização
        if let Err(e) = publisher.flush(Duration::from_secs(5)) {
            warn!(error = %e, "flush final do produtor falhou");
        }
        info!(stats = ?stats.snapshot(), "encerrado");
        Ok(())
    }
}
