use ethereum_types::{Address, U256};
use ethers::abi::{AbiParser, Function, Token};
use sandwatch_core::types::{PoolId, Transaction, TransactionHash};
use sandwatch_core::utils::pool_id;
use serde::{Deserialize, Serialize};

/// Funções de swap suportadas em routers compatíveis com Uniswap V2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapFunction {
    SwapExactTokensForTokens,
    SwapTokensForExactTokens,
    SwapExactETHForTokens,
    SwapTokensForExactETH,
    SwapExactTokensForETH,
    ETHForExactTokens,
    SwapExactTokensForTokensSupportingFeeOnTransferTokens,
    SwapExactETHForTokensSupportingFeeOnTransferTokens,
    SwapExactTokensForETHSupportingFeeOnTransferTokens,
}

impl SwapFunction {
    fn signature(&self) -> &'static str {
        match self {
            SwapFunction::SwapExactTokensForTokens => {
                "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapTokensForExactTokens => {
                "swapTokensForExactTokens(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactETHForTokens => {
                "swapExactETHForTokens(uint256,address[],address,uint256)"
            }
            SwapFunction::SwapTokensForExactETH => {
                "swapTokensForExactETH(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactTokensForETH => {
                "swapExactTokensForETH(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::ETHForExactTokens => {
                "swapETHForExactTokens(uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactTokensForTokensSupportingFeeOnTransferTokens => {
                "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactETHForTokensSupportingFeeOnTransferTokens => {
                "swapExactETHForTokensSupportingFeeOnTransferTokens(uint256,address[],address,uint256)"
            }
            SwapFunction::SwapExactTokensForETHSupportingFeeOnTransferTokens => {
                "swapExactTokensForETHSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)"
            }
        }
    }
}

/// Identifica qual função de swap foi invocada
pub fn detect_swap_function(data: &[u8]) -> Option<(SwapFunction, Function)> {
    if data.len() < 4 {
        return None;
    }
    let selector = &data[..4];
    let mut parser = AbiParser::default();
    for func in [
        SwapFunction::SwapExactTokensForTokens,
        SwapFunction::SwapTokensForExactTokens,
        SwapFunction::SwapExactETHForTokens,
        SwapFunction::SwapTokensForExactETH,
        SwapFunction::SwapExactTokensForETH,
        SwapFunction::ETHForExactTokens,
        SwapFunction::SwapExactTokensForTokensSupportingFeeOnTransferTokens,
        SwapFunction::SwapExactETHForTokensSupportingFeeOnTransferTokens,
        SwapFunction::SwapExactTokensForETHSupportingFeeOnTransferTokens,
    ] {
        let f = parser.parse_function(func.signature()).expect("abi parse");
        if selector == f.short_signature() {
            return Some((func, f));
        }
    }
    None
}

/// Intenção de swap derivada de uma transação da janela
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapIntent {
    pub tx_hash: TransactionHash,
    pub actor: Address,
    pub pool: PoolId,
    pub token_in: Address,
    pub token_out: Address,
    /// Estimativa do valor de entrada: exato para variantes exact-in,
    /// limite máximo para variantes exact-out
    pub amount_in: U256,
    pub gas_price: U256,
    pub position: usize,
}

fn path_from_token(token: &Token) -> Option<Vec<Address>> {
    let path: Vec<Address> = token
        .clone()
        .into_array()?
        .into_iter()
        .map(|t| t.into_address())
        .collect::<Option<Vec<_>>>()?;
    if path.len() < 2 {
        return None;
    }
    Some(path)
}

/// Deriva uma [`SwapIntent`] a partir de uma transação na posição `position`
/// da janela. Transações que não decodificam como swap são descartadas da
/// análise.
pub fn decode_swap_intent(tx: &Transaction, position: usize) -> Option<SwapIntent> {
    let (kind, function) = detect_swap_function(&tx.input)?;
    let tokens = function.decode_input(&tx.input[4..]).ok()?;

    let (amount_in, path) = match kind {
        SwapFunction::SwapExactTokensForTokens
        | SwapFunction::SwapExactTokensForETH
        | SwapFunction::SwapExactTokensForTokensSupportingFeeOnTransferTokens
        | SwapFunction::SwapExactTokensForETHSupportingFeeOnTransferTokens => {
            let amount_in = tokens.first()?.clone().into_uint()?;
            let path = path_from_token(tokens.get(2)?)?;
            (amount_in, path)
        }
        SwapFunction::SwapTokensForExactTokens | SwapFunction::SwapTokensForExactETH => {
            // amountInMax é a melhor estimativa disponível antes da execução
            let amount_in_max = tokens.get(1)?.clone().into_uint()?;
            let path = path_from_token(tokens.get(2)?)?;
            (amount_in_max, path)
        }
        SwapFunction::SwapExactETHForTokens
        | SwapFunction::SwapExactETHForTokensSupportingFeeOnTransferTokens
        | SwapFunction::ETHForExactTokens => {
            // o valor de entrada é o ETH anexado à transação
            let path = path_from_token(tokens.get(1)?)?;
            (tx.value, path)
        }
    };

    let token_in = *path.first()?;
    let token_out = *path.last()?;

    Some(SwapIntent {
        tx_hash: tx.hash,
        actor: tx.from,
        pool: pool_id(&tx.to, &token_in, &token_out),
        token_in,
        token_out,
        amount_in,
        gas_price: tx.gas_price,
        position,
    })
}
