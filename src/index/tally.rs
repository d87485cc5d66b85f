use super::classify::Outcome;
use super::indexer::UnitReport;
use std::fmt;

/// Running counts of unit results for progress lines and the final summary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutcomeTally {
    pub cached: u64,
    pub newly_hashed: u64,
    pub rehashed_due_to_size: u64,
    pub rehashed_due_to_modified_date: u64,
    pub zero_length: u64,
    pub hash_failures: u64,
    pub store_failures: u64,
    pub unavailable: u64,
    pub panicked: u64,
}

impl OutcomeTally {
    pub fn record(&mut self, report: &UnitReport) {
        match *report {
            UnitReport::Classified {
                outcome,
                hash_failed,
                store_failed,
            } => {
                self.record_outcome(outcome);
                if hash_failed {
                    self.hash_failures += 1;
                }
                if store_failed {
                    self.store_failures += 1;
                }
            }
            UnitReport::Unavailable => self.unavailable += 1,
        }
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Cached => self.cached += 1,
            Outcome::NewlyHashed => self.newly_hashed += 1,
            Outcome::RehashedDueToSize => self.rehashed_due_to_size += 1,
            Outcome::RehashedDueToModifiedDate => self.rehashed_due_to_modified_date += 1,
            Outcome::ZeroLength => self.zero_length += 1,
        }
    }

    pub fn record_panic(&mut self) {
        self.panicked += 1;
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Cached => self.cached,
            Outcome::NewlyHashed => self.newly_hashed,
            Outcome::RehashedDueToSize => self.rehashed_due_to_size,
            Outcome::RehashedDueToModifiedDate => self.rehashed_due_to_modified_date,
            Outcome::ZeroLength => self.zero_length,
        }
    }

    /// Every finished unit, whatever its result.
    pub fn processed(&self) -> u64 {
        Outcome::ALL.iter().map(|o| self.count(*o)).sum::<u64>() + self.unavailable + self.panicked
    }

    pub fn hashed(&self) -> u64 {
        Outcome::ALL
            .iter()
            .filter(|o| o.needs_hash())
            .map(|o| self.count(*o))
            .sum()
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in Outcome::ALL {
            write!(f, "{}={} ", outcome, self.count(outcome))?;
        }
        write!(
            f,
            "unavailable={} hash_failed={} store_failed={}",
            self.unavailable, self.hash_failures, self.store_failures
        )?;
        if self.panicked > 0 {
            write!(f, " panicked={}", self.panicked)?;
        }
        Ok(())
    }
}
