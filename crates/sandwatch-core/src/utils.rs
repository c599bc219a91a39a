/*!
 * Sandwatch Utils
 *
 * Utilitários comuns usados em toda a workspace Sandwatch
 */

use ethereum_types::{Address, H256, U256};
use tiny_keccak::{Hasher, Keccak};

/// Formata um Address para exibição
pub fn format_address(address: &Address) -> String {
    format!("0x{:x}", address)
}

/// Formata um H256 para exibição
pub fn format_h256(hash: &H256) -> String {
    format!("0x{:x}", hash)
}

/// Calcula o hash Keccak-256 de dados
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut result = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut result);
    result
}

/// Deriva o identificador de pool a partir do contrato chamado e do par de
/// tokens. O par é ordenado para que as duas direções de swap caiam no mesmo
/// identificador.
pub fn pool_id(contract: &Address, token_a: &Address, token_b: &Address) -> H256 {
    let (lo, hi) = if token_a <= token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };
    let mut bytes = Vec::with_capacity(60);
    bytes.extend_from_slice(contract.as_bytes());
    bytes.extend_from_slice(lo.as_bytes());
    bytes.extend_from_slice(hi.as_bytes());
    H256::from(keccak256(&bytes))
}

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;
const WEI_PER_TENTH_MILLI: u64 = 100_000_000_000_000;

/// Formata um valor em wei como ETH decimal com exatamente quatro casas
/// fracionárias, usando apenas aritmética inteira.
pub fn format_eth(wei: &U256) -> String {
    let whole = wei / U256::from(WEI_PER_ETH);
    let frac = (wei % U256::from(WEI_PER_ETH)) / U256::from(WEI_PER_TENTH_MILLI);
    format!("{}.{:04}", whole, frac.as_u64())
}
