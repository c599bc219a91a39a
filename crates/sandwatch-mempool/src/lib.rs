/*!
 * Sandwatch Mempool
 *
 * Assinatura contínua de transações pendentes via WebSocket e
 * agrupamento em janelas limitadas por tamanho ou tempo.
 */

mod batcher;
mod subscriber;

pub use batcher::*;
pub use subscriber::*;
