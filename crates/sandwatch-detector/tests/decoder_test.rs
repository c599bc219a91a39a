use ethereum_types::{Address, H256, U256};
use ethers::abi::{AbiParser, Token};
use sandwatch_core::types::Transaction;
use sandwatch_core::utils::pool_id;
use sandwatch_detector::{decode_swap_intent, detect_swap_function, SwapFunction};

fn tx_with_input(input: Vec<u8>, value: U256) -> Transaction {
    Transaction {
        hash: H256::repeat_byte(0x11),
        from: Address::repeat_byte(0xa1),
        to: Address::repeat_byte(0xee),
        input,
        gas_price: U256::from(100u64),
        value,
        nonce: U256::zero(),
        observed_at: 1,
    }
}

fn encode(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut parser = AbiParser::default();
    parser
        .parse_function(signature)
        .unwrap()
        .encode_input(tokens)
        .unwrap()
}

fn path(a: u8, b: u8) -> Token {
    Token::Array(vec![
        Token::Address(Address::repeat_byte(a)),
        Token::Address(Address::repeat_byte(b)),
    ])
}

#[test]
fn detect_swap_exact_tokens_selector() {
    let data = encode(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        &[
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::zero()),
            path(0x01, 0x02),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
        ],
    );
    // seletor canônico do router V2
    assert_eq!(&data[..4], [0x38, 0xed, 0x17, 0x39]);
    let (func, _) = detect_swap_function(&data).expect("deveria decodificar");
    assert_eq!(func, SwapFunction::SwapExactTokensForTokens);
}

#[test]
fn short_data_is_not_a_swap() {
    assert!(detect_swap_function(&[0x38, 0xed]).is_none());
    assert!(detect_swap_function(&[]).is_none());
}

#[test]
fn unknown_selector_is_not_a_swap() {
    assert!(detect_swap_function(&[0xde, 0xad, 0xbe, 0xef, 0x00]).is_none());
}

#[test]
fn intent_from_exact_in_swap() {
    let amount = U256::from(500u64);
    let data = encode(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        &[
            Token::Uint(amount),
            Token::Uint(U256::zero()),
            path(0x01, 0x02),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
        ],
    );
    let tx = tx_with_input(data, U256::zero());
    let intent = decode_swap_intent(&tx, 7).expect("swap válido");
    assert_eq!(intent.amount_in, amount);
    assert_eq!(intent.token_in, Address::repeat_byte(0x01));
    assert_eq!(intent.token_out, Address::repeat_byte(0x02));
    assert_eq!(intent.position, 7);
    assert_eq!(intent.actor, tx.from);
    assert_eq!(
        intent.pool,
        pool_id(&tx.to, &intent.token_in, &intent.token_out)
    );
}

#[test]
fn intent_from_exact_out_uses_amount_in_max() {
    let amount_out = U256::from(300u64);
    let amount_in_max = U256::from(999u64);
    let data = encode(
        "swapTokensForExactTokens(uint256,uint256,address[],address,uint256)",
        &[
            Token::Uint(amount_out),
            Token::Uint(amount_in_max),
            path(0x01, 0x02),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
        ],
    );
    let intent = decode_swap_intent(&tx_with_input(data, U256::zero()), 0).unwrap();
    assert_eq!(intent.amount_in, amount_in_max);
}

#[test]
fn intent_from_eth_swap_uses_tx_value() {
    let value = U256::exp10(18);
    let data = encode(
        "swapExactETHForTokens(uint256,address[],address,uint256)",
        &[
            Token::Uint(U256::zero()),
            path(0x05, 0x06),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
        ],
    );
    let intent = decode_swap_intent(&tx_with_input(data, value), 0).unwrap();
    assert_eq!(intent.amount_in, value);
    assert_eq!(intent.token_in, Address::repeat_byte(0x05));
    assert_eq!(intent.token_out, Address::repeat_byte(0x06));
}

#[test]
fn multi_hop_path_uses_endpoints() {
    let data = encode(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        &[
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::zero()),
            Token::Array(vec![
                Token::Address(Address::repeat_byte(0x01)),
                Token::Address(Address::repeat_byte(0x09)),
                Token::Address(Address::repeat_byte(0x02)),
            ]),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
        ],
    );
    let intent = decode_swap_intent(&tx_with_input(data, U256::zero()), 0).unwrap();
    assert_eq!(intent.token_in, Address::repeat_byte(0x01));
    assert_eq!(intent.token_out, Address::repeat_byte(0x02));
}

#[test]
fn truncated_calldata_is_dropped() {
    let mut data = encode(
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        &[
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::zero()),
            path(0x01, 0x02),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
        ],
    );
    data.truncate(40);
    assert!(decode_swap_intent(&tx_with_input(data, U256::zero()), 0).is_none());
}

#[test]
fn fee_on_transfer_variant_detected() {
    let hex_selector = detect_swap_function(
        &encode(
            "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)",
            &[
                Token::Uint(U256::from(1u64)),
                Token::Uint(U256::zero()),
                path(0x01, 0x02),
                Token::Address(Address::zero()),
                Token::Uint(U256::zero()),
            ],
        ),
    );
    assert_eq!(
        hex_selector.unwrap().0,
        SwapFunction::SwapExactTokensForTokensSupportingFeeOnTransferTokens
    );
}
