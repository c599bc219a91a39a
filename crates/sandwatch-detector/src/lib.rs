/*!
 * Sandwatch Detector
 *
 * Análise pura de janelas de transações pendentes em busca do padrão
 * sandwich: frontrun e backrun do mesmo atacante envolvendo a vítima
 * no mesmo pool, com ordenação de gas característica.
 */

mod decoder;
mod detector;

pub use decoder::*;
pub use detector::*;
