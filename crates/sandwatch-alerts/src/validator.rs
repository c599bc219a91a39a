use async_trait::async_trait;
use ethereum_types::Address;
use reqwest::Client;
use sandwatch_core::error::{Error, Result};
use sandwatch_core::traits::ActivitySource;
use sandwatch_core::utils::format_address;
use serde_json::json;
use std::time::Duration;

/// Quantidade de swaps pedida por consulta
const PAGE_SIZE: u32 = 100;

const SWAPS_QUERY: &str =
    "query ($origin: Bytes!, $first: Int!) { swaps(first: $first, where: { from: $origin }) { id } }";

/// Fonte de atividade histórica sobre um subgraph compatível com Uniswap V2.
///
/// A consulta conta os swaps recentes originados por um endereço. Sem estado:
/// consultas repetidas para o mesmo endereço são independentes.
pub struct SubgraphValidator {
    client: Client,
    endpoint: String,
}

impl SubgraphValidator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ValidationError(format!("falha ao criar cliente HTTP: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ActivitySource for SubgraphValidator {
    async fn recent_swap_count(&self, address: Address) -> Result<u32> {
        let body = json!({
            "query": SWAPS_QUERY,
            "variables": {
                "origin": format_address(&address),
                "first": PAGE_SIZE,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::TimeoutError(format!("consulta ao subgraph: {}", e))
                } else {
                    Error::ValidationError(format!("falha na consulta ao subgraph: {}", e))
                }
            })?
            .error_for_status()
            .map_err(|e| Error::ValidationError(format!("subgraph respondeu erro: {}", e)))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::ValidationError(format!("resposta inválida do subgraph: {}", e)))?;

        payload
            .pointer("/data/swaps")
            .and_then(|swaps| swaps.as_array())
            .map(|swaps| swaps.len() as u32)
            .ok_or_else(|| {
                Error::ValidationError("resposta do subgraph sem o campo swaps".to_string())
            })
    }
}
