//! Value table inspection

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use owl_core::{Action, State};
use owl_rl::{persistence, ActionValues, ValueTable};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Saved value table
    #[arg(default_value = "stage1_qtable.json")]
    pub table: PathBuf,

    /// Number of highest-valued states to list
    #[arg(short, long, default_value_t = 10)]
    pub top: usize,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let table = persistence::load(&args.table)
        .with_context(|| format!("Failed to load value table {}", args.table.display()))?;

    println!("Value table: {}", args.table.display());
    println!("States:      {}", table.len());

    println!("\nStates per map:");
    for (map_id, count) in states_per_map(&table) {
        println!("  map {map_id:>3}: {count}");
    }

    println!("\nTop {} states by best value:", args.top);
    for (state, values) in top_states(&table, args.top) {
        let best = values.best_action();
        println!(
            "  {state}  best {best:<5} {:>9.4}  [up {:.4}, down {:.4}, left {:.4}, right {:.4}]",
            values.max_value(),
            values[Action::Up],
            values[Action::Down],
            values[Action::Left],
            values[Action::Right],
        );
    }

    let reencoded = persistence::decode(&persistence::encode(&table)?)?;
    if reencoded == table {
        println!("\nRound trip: ok");
    } else {
        anyhow::bail!("value table does not survive a round trip");
    }

    Ok(())
}

/// Number of states recorded for each map
pub fn states_per_map(table: &ValueTable) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for (state, _) in table {
        *counts.entry(state.map_id).or_insert(0) += 1;
    }
    counts
}

/// The `n` states with the largest best value, ties broken by state order
pub fn top_states(table: &ValueTable, n: usize) -> Vec<(State, ActionValues)> {
    let mut entries = table.sorted_entries();
    entries.sort_by(|a, b| b.1.max_value().total_cmp(&a.1.max_value()));
    entries.truncate(n);
    entries
}
