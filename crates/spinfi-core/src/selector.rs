// ── Weighted prize selection ──

use rand::Rng;

use crate::model::{PrizeEntry, PrizeTable};

/// Draw one prize with probability `weight / total_weight`.
///
/// Conceptually each entry is replicated `weight` times and one slot is
/// picked uniformly; in practice the draw is located in the table's
/// running weight totals by binary search.
pub fn select_prize<'a, R: Rng + ?Sized>(table: &'a PrizeTable, rng: &mut R) -> &'a PrizeEntry {
    let draw = rng.gen_range(0..table.total_weight());
    let index = table.cumulative().partition_point(|&upper| upper <= draw);
    &table.entries()[index]
}
