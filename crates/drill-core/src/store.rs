use std::collections::HashMap;

use crate::error::DrillResult;
use crate::record::{BestResult, RecordFormat};
use crate::set::{RecordEntry, SetCategory, SetOverview, SolvedSet, StoreStats};

pub trait RecordStore {
    // Sets
    fn save_set(&self, set: &SolvedSet) -> DrillResult<String>;
    fn get_set(&self, id: &str) -> DrillResult<Option<SolvedSet>>;
    fn delete_set(&self, id: &str) -> DrillResult<()>;
    fn list_sets(&self, limit: usize) -> DrillResult<Vec<SetOverview>>;

    // Records
    fn prior_bests(&self, category: &SetCategory) -> DrillResult<HashMap<RecordFormat, u32>>;
    fn record_bests(
        &self,
        category: &SetCategory,
        set_id: &str,
        bests: &[BestResult],
    ) -> DrillResult<usize>;
    fn list_records(&self, category: Option<&SetCategory>) -> DrillResult<Vec<RecordEntry>>;

    // Stats
    fn stats(&self) -> DrillResult<StoreStats>;
}
