//! Switching-order synthesizer (C7, §4.10).
//!
//! Takes the solver's target switch states and turns them into a
//! physically legal operation order: breakers carry fault current and
//! must interrupt or restore it before any isolator on the same path
//! moves, and every newly energized path gets its isolator lineup
//! closed before the breaker that will carry it.

use super::solver::RawSolution;
use recovery_core::{OptimizationInput, SwitchKind, TopologyGraph};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Noop,
    Close,
    Open,
}

struct SwitchPlan<'a> {
    name: &'a str,
    kind: SwitchKind,
    nodes: (&'a str, &'a str),
    op: Op,
}

/// Produce the ordered list of `"<name>【<action>】"` emissions for one
/// target switch assignment, per the exact two-rule algorithm of
/// §4.10. `switches` must be iterated in input declaration order;
/// callers pass an `IndexMap`-backed iterator so that order is
/// preserved end to end.
pub fn synthesize_sequence<'a, I>(
    graph: &TopologyGraph,
    switches: I,
) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, SwitchKind, (&'a str, &'a str), u8, u8)>,
{
    let islands = graph.islands();

    let plans: Vec<SwitchPlan<'a>> = switches
        .into_iter()
        .map(|(name, kind, nodes, initial, target)| {
            let op = match (initial, target) {
                (0, 1) => Op::Close,
                (1, 0) => Op::Open,
                _ => Op::Noop,
            };
            SwitchPlan { name, kind, nodes, op }
        })
        .collect();

    let mut remaining: HashMap<&str, Op> = plans.iter().map(|p| (p.name, p.op)).collect();
    let by_name: HashMap<&str, &SwitchPlan> = plans.iter().map(|p| (p.name, p)).collect();

    let node_index = |n: &str| graph.node_index(n);
    let shares_island = |a: (&str, &str), b: (&str, &str)| -> bool {
        match (node_index(a.0), node_index(a.1), node_index(b.0), node_index(b.1)) {
            (Some(a0), Some(a1), Some(b0), Some(b1)) => islands.shares_island((a0, a1), (b0, b1)),
            _ => false,
        }
    };
    let shares_node = |a: (&str, &str), b: (&str, &str)| -> bool {
        a.0 == b.0 || a.0 == b.1 || a.1 == b.0 || a.1 == b.1
    };

    let mut operations = Vec::new();

    // Rule 1: breaker closures drive the outer loop, in input
    // declaration order.
    let breaker_closes: Vec<&str> = plans
        .iter()
        .filter(|p| p.kind == SwitchKind::Breaker && p.op == Op::Close)
        .map(|p| p.name)
        .collect();

    for b_name in breaker_closes {
        if remaining.get(b_name) != Some(&Op::Close) {
            continue;
        }
        let breaker = by_name[b_name];

        let partner = plans
            .iter()
            .find(|p| {
                p.kind == SwitchKind::Breaker
                    && remaining.get(p.name) == Some(&Op::Open)
                    && shares_island(breaker.nodes, p.nodes)
            })
            .map(|p| p.name);

        for iso in plans.iter().filter(|p| {
            p.kind == SwitchKind::Isolator
                && remaining.get(p.name) == Some(&Op::Close)
                && shares_node(breaker.nodes, p.nodes)
        }) {
            operations.push(format!("{}【close】", iso.name));
            remaining.insert(iso.name, Op::Noop);
        }

        operations.push(format!("{}【close】", breaker.name));
        remaining.insert(breaker.name, Op::Noop);

        if let Some(b_prime) = partner {
            operations.push(format!("{}【open】", b_prime));
            let b_prime_nodes = by_name[b_prime].nodes;
            remaining.insert(b_prime, Op::Noop);

            for iso in plans.iter().filter(|p| {
                p.kind == SwitchKind::Isolator
                    && remaining.get(p.name) == Some(&Op::Open)
                    && shares_node(b_prime_nodes, p.nodes)
            }) {
                operations.push(format!("{}【open】", iso.name));
                remaining.insert(iso.name, Op::Noop);
            }
        }
    }

    // Rule 2: residual isolator closes, in input declaration order.
    let residual_closes: Vec<&str> = plans
        .iter()
        .filter(|p| p.kind == SwitchKind::Isolator)
        .map(|p| p.name)
        .filter(|name| remaining.get(name) == Some(&Op::Close))
        .collect();

    for i_name in residual_closes {
        if remaining.get(i_name) != Some(&Op::Close) {
            continue;
        }
        let iso = by_name[i_name];
        operations.push(format!("{}【close】", iso.name));
        remaining.insert(iso.name, Op::Noop);

        let neighbors: Vec<&str> = plans
            .iter()
            .filter(|p| {
                p.kind == SwitchKind::Isolator
                    && remaining.get(p.name) == Some(&Op::Open)
                    && shares_node(iso.nodes, p.nodes)
            })
            .map(|p| p.name)
            .collect();
        for n_name in neighbors {
            operations.push(format!("{}【open】", n_name));
            remaining.insert(n_name, Op::Noop);
        }
    }

    operations
}

/// Build the declaration-order switch tuples from a solved input and
/// hand them to [`synthesize_sequence`].
pub fn sequence_for(input: &OptimizationInput, raw: &RawSolution, graph: &TopologyGraph) -> Vec<String> {
    let entries = input.switches.iter().map(|(name, switch)| {
        let target = raw
            .s
            .get(name)
            .map(|&closed| closed as u8)
            .unwrap_or(switch.initial_state);
        (
            name.as_str(),
            switch.switch_type,
            (switch.nodes.0.as_str(), switch.nodes.1.as_str()),
            switch.initial_state,
            target,
        )
    });
    synthesize_sequence(graph, entries)
}
