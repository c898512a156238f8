// Ledger Clearing - the reset shared by both withdrawal variants

use crate::ledger::meter::OutOfGas;
use crate::ledger::state::Slots;
use serde::{Deserialize, Serialize};

/// How the funder sequence is walked while clearing contributions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Traversal {
    /// Re-read the length and each element from storage every iteration
    Incremental,
    /// Copy the sequence into memory once, then walk the copy
    Bulk,
}

/// Delete every contribution named in the funder sequence, empty the
/// sequence and zero the balance. Returns the balance held beforehand.
///
/// Duplicate funder entries delete the same record again; the cost is
/// one clear per deposit call, not per distinct funder.
pub fn clear_ledger(slots: &mut Slots<'_>, traversal: Traversal) -> Result<u128, OutOfGas> {
    match traversal {
        Traversal::Incremental => {
            let mut index = 0;
            while index < slots.funder_count()? {
                if let Some(funder) = slots.funder_at(index)? {
                    slots.remove_contribution(&funder)?;
                }
                index += 1;
            }
        }
        Traversal::Bulk => {
            let funders = slots.load_funders()?;
            for funder in &funders {
                slots.remove_contribution(funder)?;
            }
        }
    }

    slots.clear_funders()?;
    let held = slots.balance()?;
    slots.set_balance(0)?;
    Ok(held)
}
