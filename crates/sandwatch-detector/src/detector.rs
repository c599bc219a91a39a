use crate::decoder::{decode_swap_intent, SwapIntent};
use ethereum_types::Address;
use sandwatch_core::types::{Batch, Finding, PoolId};
use std::collections::{HashMap, HashSet};

/// Analisa uma janela selada e retorna os ataques sandwich encontrados.
///
/// Função pura: sem I/O, sem estado externo, determinística para uma mesma
/// janela. Os achados são retornados em ordem de posição do frontrun e cada
/// atacante aparece no máximo uma vez por janela.
pub fn detect(batch: &Batch) -> Vec<Finding> {
    let intents: Vec<SwapIntent> = batch
        .txs
        .iter()
        .enumerate()
        .filter_map(|(position, tx)| decode_swap_intent(tx, position))
        .collect();

    // O padrão exige três swaps contra o mesmo pool
    let mut pools: HashMap<PoolId, Vec<&SwapIntent>> = HashMap::new();
    for intent in &intents {
        pools.entry(intent.pool).or_default().push(intent);
    }

    let mut candidates: Vec<(&SwapIntent, &SwapIntent, &SwapIntent)> = Vec::new();
    for group in pools.values() {
        scan_pool(group, &mut candidates);
    }

    // Primeiro frontrun vence; um atacante rende no máximo um achado
    candidates.sort_by_key(|(front, _, _)| front.position);
    let mut attackers_seen: HashSet<Address> = HashSet::new();
    candidates
        .into_iter()
        .filter(|(front, _, _)| attackers_seen.insert(front.actor))
        .map(|(front, victim, back)| Finding {
            victim_tx: victim.tx_hash,
            frontrun_tx: front.tx_hash,
            backrun_tx: back.tx_hash,
            attacker: front.actor,
            pool: front.pool,
            estimated_profit: back.amount_in.saturating_sub(front.amount_in),
            detected_at: batch.sealed_at,
        })
        .collect()
}

/// Varre um grupo de intenções do mesmo pool, em ordem posicional, atrás de
/// triplas (frontrun, vítima, backrun).
fn scan_pool<'a>(
    group: &[&'a SwapIntent],
    out: &mut Vec<(&'a SwapIntent, &'a SwapIntent, &'a SwapIntent)>,
) {
    if group.len() < 3 {
        return;
    }
    for (i, &front) in group.iter().enumerate() {
        for &back in group[i + 1..].iter() {
            // frontrun e backrun: mesmo ator, direções A→B e B→A
            if back.actor != front.actor
                || back.token_in != front.token_out
                || back.token_out != front.token_in
            {
                continue;
            }
            if let Some(victim) = best_victim(group, front, back) {
                // triplas adicionais do mesmo frontrun não interessam
                out.push((front, victim, back));
                break;
            }
        }
    }
}

/// Seleciona a vítima entre `front` e `back`: mesma direção do frontrun,
/// ator distinto, gas entre os dois extremos. Empates resolvem pelo maior
/// valor de entrada e depois pela posição mais cedo.
fn best_victim<'a>(
    group: &[&'a SwapIntent],
    front: &SwapIntent,
    back: &SwapIntent,
) -> Option<&'a SwapIntent> {
    let mut best: Option<&'a SwapIntent> = None;
    for &victim in group.iter() {
        if victim.position <= front.position || victim.position >= back.position {
            continue;
        }
        if victim.actor == front.actor {
            continue;
        }
        if victim.token_in != front.token_in || victim.token_out != front.token_out {
            continue;
        }
        // assinatura canônica de MEV: o frontrun cobre o gas da vítima e o
        // backrun aceita prioridade menor
        if front.gas_price < victim.gas_price || victim.gas_price < back.gas_price {
            continue;
        }
        best = match best {
            None => Some(victim),
            Some(current)
                if victim.amount_in > current.amount_in
                    || (victim.amount_in == current.amount_in
                        && victim.position < current.position) =>
            {
                Some(victim)
            }
            Some(current) => Some(current),
        };
    }
    best
}
