use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use sandwatch_core::error::{Error, Result};
use sandwatch_core::traits::AlertSink;
use sandwatch_core::types::Alert;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE: Duration = Duration::from_millis(100);
const RETRY_CAP: Duration = Duration::from_secs(5);
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Publicador de alertas confirmados no tópico Kafka de saída.
///
/// Entrega at-least-once: erros transitórios são retentados com backoff
/// exponencial; a falha final é devolvida ao chamador, que registra e
/// descarta para não bloquear o pipeline.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(broker: &str, topic: impl Into<String>) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", broker)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| Error::PublishError(format!("erro ao criar produtor Kafka: {}", e)))?;
        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }

    /// Descarrega mensagens ainda em trânsito antes de fechar o produtor
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| Error::PublishError(format!("falha no flush do produtor: {}", e)))
    }
}

#[async_trait]
impl AlertSink for KafkaPublisher {
    async fn publish(&self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_string(alert)
            .map_err(|e| Error::PublishError(format!("falha ao serializar alerta: {}", e)))?;

        let mut backoff = RETRY_BASE;
        let mut attempt = 0;
        loop {
            attempt += 1;
            // sem chave de partição: ordenação no consumidor não é garantia
            // deste pipeline
            let record = FutureRecord::<(), str>::to(&self.topic).payload(payload.as_str());
            match self.producer.send(record, Timeout::After(SEND_TIMEOUT)).await {
                Ok(_) => return Ok(()),
                Err((e, _)) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(Error::PublishError(format!(
                            "falha ao publicar após {} tentativas: {}",
                            attempt, e
                        )));
                    }
                    warn!(
                        error = %e,
                        attempt,
                        "falha transitória ao publicar alerta, retentando"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(RETRY_CAP);
                }
            }
        }
    }
}
