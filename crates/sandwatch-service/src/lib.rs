/*!
 * Sandwatch Service
 *
 * Supervisão do pipeline: inicialização dos clientes externos em ordem de
 * dependência, ligação dos estágios por canais e encerramento gracioso.
 */

pub mod supervisor;

pub use supervisor::*;
