use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::schedule::period::PeriodNode;
use crate::types::{pivot_values, PeriodValue, PivotItem, SequenceId};

/// calendar quarter (1-4) of a month (1-12)
pub fn quarter_of(month: u32) -> u8 {
    ((month - 1) / 3 + 1) as u8
}

/// position (1-3) of a month (1-12) inside its quarter
pub fn slot_of(month: u32) -> u8 {
    ((month - 1) % 3 + 1) as u8
}

/// up to three periods of one calendar quarter, referenced by sequence id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterAggregate {
    pub quarter: u8,
    slots: [Option<SequenceId>; 3],
}

impl QuarterAggregate {
    pub fn new(quarter: u8) -> Self {
        Self {
            quarter,
            slots: [None; 3],
        }
    }

    /// place a period into the slot of its month, replacing any occupant
    pub fn add_month(&mut self, node: &PeriodNode) {
        let slot = slot_of(node.date.month()) as usize - 1;
        self.slots[slot] = Some(node.sequence_id);
    }

    /// sequence ids of the member periods, chronologically
    pub fn sequence_ids(&self) -> impl Iterator<Item = SequenceId> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// member periods, resolved against the owning chain
    ///
    /// `chain` must be the periods of the schedule this quarter was built
    /// from; every stored id is an index into it.
    pub fn months<'a>(
        &'a self,
        chain: &'a [PeriodNode],
    ) -> impl Iterator<Item = &'a PeriodNode> + 'a {
        self.sequence_ids().filter_map(move |id| {
            debug_assert!(
                id < chain.len(),
                "period {id} is not in a chain of {} periods",
                chain.len()
            );
            chain.get(id)
        })
    }

    pub fn pivot_item(&self, chain: &[PeriodNode]) -> PivotItem {
        PivotItem::Aggregate(self.months(chain).map(|node| PivotItem::Period(node.value)).collect())
    }

    pub fn pivot(&self, chain: &[PeriodNode]) -> PeriodValue {
        pivot_values(self.months(chain).map(|node| node.value))
    }
}

/// the quarters of one calendar year, in order of first appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearAggregate {
    pub year: i32,
    pub quarters: Vec<QuarterAggregate>,
}

impl YearAggregate {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            quarters: Vec::with_capacity(4),
        }
    }

    /// route a period into its quarter, opening the quarter on first use
    pub fn add_month(&mut self, node: &PeriodNode) {
        let number = quarter_of(node.date.month());
        let index = match self.quarters.iter().position(|q| q.quarter == number) {
            Some(index) => index,
            None => {
                self.quarters.push(QuarterAggregate::new(number));
                self.quarters.len() - 1
            }
        };
        self.quarters[index].add_month(node);
    }

    pub fn quarter(&self, number: u8) -> Option<&QuarterAggregate> {
        self.quarters.iter().find(|q| q.quarter == number)
    }

    pub fn months<'a>(
        &'a self,
        chain: &'a [PeriodNode],
    ) -> impl Iterator<Item = &'a PeriodNode> + 'a {
        self.quarters.iter().flat_map(move |q| q.months(chain))
    }

    pub fn pivot_item(&self, chain: &[PeriodNode]) -> PivotItem {
        PivotItem::Aggregate(self.quarters.iter().map(|q| q.pivot_item(chain)).collect())
    }

    /// sum of the quarter pivots
    pub fn pivot(&self, chain: &[PeriodNode]) -> PeriodValue {
        pivot_values(self.quarters.iter().map(|q| q.pivot(chain)))
    }
}
